use naga::valid::ValidationFlags;

use crate::{AnalyzeError, WgslOptions};

/// Parses and validates `wgsl_source` and writes it as SPIR-V words.
pub fn wgsl_to_spirv(wgsl_source: &str, options: &WgslOptions) -> Result<Vec<u32>, AnalyzeError> {
    let module = naga::front::wgsl::parse_str(wgsl_source)
        .map_err(|error| AnalyzeError::ParseError { error })?;

    let info = naga::valid::Validator::new(ValidationFlags::all(), options.capabilities)
        .validate(&module)
        .map_err(|error| AnalyzeError::ValidationError { error })?;

    let spv_options = naga::back::spv::Options {
        lang_version: options.spirv_version,
        ..Default::default()
    };
    naga::back::spv::write_vec(&module, &info, &spv_options, None)
        .map_err(|error| AnalyzeError::SpirvOut { error })
}
