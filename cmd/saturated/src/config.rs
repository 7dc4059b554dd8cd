//! Option loading for the saturated command.
//!
//! Options come from an optional YAML or JSON file (same fields as
//! [`saturated::Options`]), then command-line flags override them.

use std::path::Path;

use anyhow::{Context, Result, bail};
use saturated::Options;

/// Command-line overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Flush interval in milliseconds.
    pub interval_ms: Option<u64>,
    /// Maximum batch size.
    pub max: Option<usize>,
}

/// Load options from a config file, choosing the format by extension.
pub fn load_file(path: &Path) -> Result<Options> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;

    let opts: Options = match ext {
        "json" => serde_json::from_slice(&data)?,
        "yaml" | "yml" => serde_yaml::from_slice(&data)?,
        _ => bail!(
            "unsupported config format: {} (expected .json, .yaml or .yml)",
            path.display()
        ),
    };
    Ok(opts)
}

/// Resolve the effective options: defaults, then the file, then flags.
pub fn resolve(file: Option<&Path>, overrides: Overrides) -> Result<Options> {
    let mut opts = match file {
        Some(path) => load_file(path)?,
        None => Options::default(),
    };

    if let Some(ms) = overrides.interval_ms {
        opts = opts.with_interval_ms(ms);
    }
    if let Some(max) = overrides.max {
        opts = opts.with_max(max);
    }

    opts.validate()?;
    Ok(opts)
}
