use std::{fmt, path::Path};

use rspirv::spirv::{Op, Word};
use thiserror::Error;

/// The resource binding decorations tracked for uniform variables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BindingDecoration {
    DescriptorSet,
    Binding,
}

impl fmt::Display for BindingDecoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingDecoration::DescriptorSet => f.write_str("descriptor set"),
            BindingDecoration::Binding => f.write_str("binding"),
        }
    }
}

/// Errors while analyzing the uniform usage of a shader module.
///
/// Every error is fatal. No partial analysis is returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyzeError {
    /// Only variables with uniform or uniform constant storage can have binding decorations.
    #[error("variable {id} has {decoration} but isn't a uniform")]
    InvalidAnnotation {
        id: Word,
        decoration: BindingDecoration,
    },

    /// Shaders can't recurse, so the call graph must be acyclic.
    #[error("module call graph recurses through function {function}")]
    CallGraphCycle { function: Word },

    /// A call or entry point names an id without a function definition.
    #[error("function {function} is referenced but never defined")]
    UndefinedFunction { function: Word },

    /// An instruction is missing an operand required for the analysis.
    #[error("malformed {opcode:?} instruction")]
    MalformedInstruction { opcode: Op },

    /// The SPIR-V binary could not be decoded.
    #[error("failed to load SPIR-V: {error}")]
    Load {
        error: rspirv::binary::ParseState,
    },

    /// SPIR-V binaries are a sequence of 32-bit words.
    #[error("byte length {len} is not a multiple of 4")]
    TruncatedWord { len: usize },

    /// The shader source could not be parsed.
    #[error("failed to parse: {error}")]
    ParseError {
        error: naga::front::wgsl::ParseError,
    },

    /// The shader source could not be validated.
    #[error("failed to validate: {error}")]
    ValidationError {
        error: naga::WithSpan<naga::valid::ValidationError>,
    },

    /// The validated shader could not be written as SPIR-V.
    #[error("failed to write SPIR-V: {error}")]
    SpirvOut { error: naga::back::spv::Error },
}

impl AnalyzeError {
    /// Writes the error to stderr, rendering WGSL errors as diagnostics against `wgsl_source`.
    pub fn emit_to_stderr_with_path(&self, wgsl_source: &str, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match self {
            AnalyzeError::ParseError { error } => {
                error.emit_to_stderr_with_path(wgsl_source, path)
            }
            AnalyzeError::ValidationError { error } => {
                error.emit_to_stderr_with_path(wgsl_source, &*path.to_string_lossy())
            }
            other => eprintln!("error: {}: {other}", path.display()),
        }
    }

    /// The error message, with WGSL errors rendered as diagnostics against `wgsl_source`.
    pub fn emit_to_string(&self, wgsl_source: &str) -> String {
        match self {
            AnalyzeError::ParseError { error } => error.emit_to_string(wgsl_source),
            AnalyzeError::ValidationError { error } => error.emit_to_string(wgsl_source),
            other => other.to_string(),
        }
    }

    /// Like [emit_to_string](Self::emit_to_string) but naming the source file.
    pub fn emit_to_string_with_path(&self, wgsl_source: &str, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        match self {
            AnalyzeError::ParseError { error } => {
                error.emit_to_string_with_path(wgsl_source, path)
            }
            AnalyzeError::ValidationError { error } => {
                error.emit_to_string_with_path(wgsl_source, &*path.to_string_lossy())
            }
            other => format!("{}: {other}", path.display()),
        }
    }
}
