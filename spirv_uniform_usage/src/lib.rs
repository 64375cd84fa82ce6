//! # spirv_uniform_usage
//! spirv_uniform_usage is a library for finding the uniform resources each entry point of a SPIR-V module statically uses.
//!
//! ## Getting Started
//! The [analyze_spirv] function loads a SPIR-V binary and returns an [Analysis].
//! The analysis maps uniform variables to their descriptor set and binding
//! and lists the uniforms reachable from each entry point through its call graph.
//! This is useful for tools that need to know ahead of time which resource slots a shader stage touches.
//!
//! ```rust no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("shader.spv")?;
//!     let words = spirv_uniform_usage::words_from_bytes(&bytes)?;
//!
//!     let analysis = spirv_uniform_usage::analyze_spirv(&words)?;
//!     for entry in &analysis.entry_points {
//!         for (id, binding) in entry.bindings(&analysis.annotations) {
//!             println!("{} uses {id} at {binding}", entry.name);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## WGSL
//! WGSL shaders can be analyzed with [analyze_wgsl].
//! The shader is first compiled to SPIR-V with naga,
//! so the reported ids refer to the generated SPIR-V module.
#![allow(clippy::result_large_err)]

extern crate wgpu_types as wgpu;

use std::collections::{BTreeMap, BTreeSet};

use rspirv::{dr::Module, spirv::Word};

mod annotations;
mod calls;
mod closure;
mod entry;
mod error;
mod report;
mod spirv;
mod uniforms;
mod usage;
mod wgsl;

#[cfg(test)]
mod test;

pub use annotations::{uniform_annotations, Binding};
pub use calls::called_functions;
pub use closure::{ClosureContext, FunctionIndex};
pub use entry::{entry_point_usage, shader_stages, EntryPointUsage};
pub use error::{AnalyzeError, BindingDecoration};
pub use naga::valid::Capabilities as WgslCapabilities;
pub use spirv::words_from_bytes;
pub use uniforms::uniform_variables;
pub use usage::{pointer_operands, used_variables};
pub use wgsl::wgsl_to_spirv;

/// The result id of a global variable.
pub type VariableId = Word;

/// The result id of a function definition.
pub type FunctionId = Word;

/// Options for compiling WGSL before analysis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WgslOptions {
    /// The IR capabilities to support during validation.
    pub capabilities: WgslCapabilities,

    /// The `(major, minor)` SPIR-V version to generate.
    pub spirv_version: (u8, u8),
}

impl Default for WgslOptions {
    fn default() -> Self {
        Self {
            capabilities: WgslCapabilities::all(),
            spirv_version: (1, 0),
        }
    }
}

/// The static uniform usage of a SPIR-V module.
///
/// The [Display](std::fmt::Display) implementation writes a text report
/// with the annotated bindings followed by the uniforms used by each entry point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Analysis {
    /// All global variables with uniform or uniform constant storage.
    pub uniforms: BTreeSet<VariableId>,

    /// The binding decorations for each decorated uniform.
    pub annotations: BTreeMap<VariableId, Binding>,

    /// The usage for each entry point in declaration order.
    pub entry_points: Vec<EntryPointUsage>,
}

impl Analysis {
    /// The stages of the entry points that use each `(descriptor_set, binding)`.
    ///
    /// Uniforms missing either binding decoration are skipped.
    pub fn binding_stages(&self) -> BTreeMap<(u32, u32), wgpu::ShaderStages> {
        let mut stages = BTreeMap::new();
        for entry in &self.entry_points {
            for (_, binding) in entry.bindings(&self.annotations) {
                if let Some(coordinates) = binding.coordinates() {
                    *stages
                        .entry(coordinates)
                        .or_insert(wgpu::ShaderStages::NONE) |= entry.stages();
                }
            }
        }
        stages
    }
}

/// Analyzes the uniform usage of an already loaded SPIR-V module.
///
/// All derived state is owned by this call, so the same module can be analyzed
/// from multiple threads at once.
pub fn analyze_module(module: &Module) -> Result<Analysis, AnalyzeError> {
    let uniforms = uniform_variables(module);
    log::debug!("found {} uniform variables", uniforms.len());

    let annotations = uniform_annotations(module, &uniforms)?;

    let mut context = ClosureContext::new(FunctionIndex::new(module, &uniforms));
    let entry_points = entry_point_usage(module, &mut context)?;

    Ok(Analysis {
        uniforms,
        annotations,
        entry_points,
    })
}

/// Loads and analyzes the SPIR-V binary `words`.
///
/// # Examples
/**
```rust no_run
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read("shader.spv")?;
    let words = spirv_uniform_usage::words_from_bytes(&bytes)?;

    let analysis = spirv_uniform_usage::analyze_spirv(&words)?;
    print!("{analysis}");
    Ok(())
}
```
 */
pub fn analyze_spirv(words: &[u32]) -> Result<Analysis, AnalyzeError> {
    let module = rspirv::dr::load_words(words).map_err(|error| AnalyzeError::Load { error })?;
    analyze_module(&module)
}

/// Compiles `wgsl_source` to SPIR-V and analyzes the result.
///
/// # Examples
/**
```rust no_run
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let wgsl_file = "src/shader.wgsl";
    let wgsl_source = std::fs::read_to_string(wgsl_file)?;

    let analysis = spirv_uniform_usage::analyze_wgsl(&wgsl_source, Default::default())
        .inspect_err(|error| error.emit_to_stderr_with_path(&wgsl_source, wgsl_file))
        // Don't print out same error twice
        .map_err(|_| "Failed to analyze shader")?;

    for ((group, binding), stages) in analysis.binding_stages() {
        println!("@group({group}) @binding({binding}): {stages:?}");
    }
    Ok(())
}
```
 */
pub fn analyze_wgsl(wgsl_source: &str, options: WgslOptions) -> Result<Analysis, AnalyzeError> {
    let words = wgsl_to_spirv(wgsl_source, &options)?;
    analyze_spirv(&words)
}
