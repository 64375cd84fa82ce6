use std::{path::Path, process::ExitCode};

use spirv_uniform_usage::{analyze_spirv, analyze_wgsl, words_from_bytes, Analysis, WgslOptions};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let [_, path] = args.as_slice() else {
        eprintln!("usage: spirv-uniform-usage <shader.spv|shader.wgsl>");
        return ExitCode::FAILURE;
    };

    match analyze_file(Path::new(path)) {
        Some(analysis) => {
            print!("{analysis}");
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

// Errors are reported to stderr here, since WGSL diagnostics need the source text.
fn analyze_file(path: &Path) -> Option<Analysis> {
    if path.extension().is_some_and(|e| e == "wgsl") {
        let wgsl_source = std::fs::read_to_string(path)
            .inspect_err(|e| eprintln!("error: failed to read '{}': {e}", path.display()))
            .ok()?;
        log::debug!("compiling {} to SPIR-V", path.display());

        analyze_wgsl(&wgsl_source, WgslOptions::default())
            .inspect_err(|e| e.emit_to_stderr_with_path(&wgsl_source, path))
            .ok()
    } else {
        let bytes = std::fs::read(path)
            .inspect_err(|e| eprintln!("error: failed to read '{}': {e}", path.display()))
            .ok()?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());

        words_from_bytes(&bytes)
            .and_then(|words| analyze_spirv(&words))
            .inspect_err(|e| eprintln!("error: {}: {e}", path.display()))
            .ok()
    }
}
