use std::fmt;

use crate::{annotations::Binding, Analysis};

struct Component(Option<u32>);

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("?"),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            Component(self.descriptor_set),
            Component(self.binding)
        )
    }
}

/// Writes one `id: (descriptor_set, binding)` line per annotated uniform
/// followed by each entry point's name and the ids of the uniforms it uses.
impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, binding) in &self.annotations {
            writeln!(f, "{id}: {binding}")?;
        }

        for entry in &self.entry_points {
            writeln!(f, "{}", entry.name)?;
            let ids: Vec<_> = entry.variables.iter().map(|id| id.to_string()).collect();
            writeln!(f, "{}", ids.join(" "))?;
        }
        Ok(())
    }
}
