// pipeline.rs — Model loading, provenance, and the compile entry point
//
// Glue between the driver and the emitter: decode a resolved program model
// from JSON, fingerprint it for hermetic builds, and run one emission pass.
//
// Preconditions: the model was produced by an upstream builder/optimizer with
//                every scheduling and memory attribute already decided.
// Postconditions: `compile` returns the emission result untouched; callers
//                 decide whether to keep partial output.
// Failure modes: I/O and JSON errors surface as `DriverError`.
// Side effects: `load_module` reads one file.

use std::path::Path;

use tracing::{debug, info};

use crate::emit::{emit_with_options, EmitOptions, EmitResult};
use crate::error::{DriverError, DriverResult};
use crate::ir::Module;

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for hermetic builds and cache-key use.
///
/// `model_hash`: SHA-256 of the model's canonical compact JSON.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub model_hash: [u8; 32],
    pub function_count: usize,
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the model hash (64 characters).
    pub fn model_hash_hex(&self) -> String {
        bytes_to_hex(&self.model_hash)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"model_hash\": \"{}\",\n  \"functions\": {},\n  \"compiler_version\": \"{}\"\n}}\n",
            self.model_hash_hex(),
            self.function_count,
            self.compiler_version,
        )
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Canonical compact JSON of `module`: field order follows the type
/// definitions, no whitespace.
pub fn canonical_json(module: &Module) -> DriverResult<String> {
    Ok(serde_json::to_string(module)?)
}

/// Compute provenance from the canonical form of `module`, so two models
/// differing only in JSON formatting share a hash.
pub fn compute_provenance(module: &Module) -> DriverResult<Provenance> {
    use sha2::{Digest, Sha256};

    let canonical = canonical_json(module)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let result = hasher.finalize();
    let mut model_hash = [0u8; 32];
    model_hash.copy_from_slice(&result);

    Ok(Provenance {
        model_hash,
        function_count: module.functions.len(),
        compiler_version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Loading ────────────────────────────────────────────────────────────────

pub fn parse_module(json: &str) -> DriverResult<Module> {
    let module: Module = serde_json::from_str(json)?;
    debug!(
        values = module.values.len(),
        functions = module.functions.len(),
        "parsed program model"
    );
    Ok(module)
}

pub fn load_module(path: &Path) -> DriverResult<Module> {
    let json = std::fs::read_to_string(path).map_err(|e| DriverError::read(path, e))?;
    parse_module(&json)
}

// ── Compile ────────────────────────────────────────────────────────────────

/// Run one emission pass over `module` with fresh state.
pub fn compile(module: &Module, options: &EmitOptions) -> EmitResult {
    let result = emit_with_options(module, options);
    info!(
        errors = result.error_count(),
        diagnostics = result.diagnostics.len(),
        bytes = result.generated.cpp_source.len(),
        "compiled"
    );
    result
}
