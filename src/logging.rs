use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const ENV_FILTER_VAR: &str = "JILL_LOG";

pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jill")
        .join("jill.log")
}

/// Sends `tracing` output to a file; the terminal belongs to the UI.
/// `JILL_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<PathBuf> {
    let path = config.file.clone().unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(ENV_FILTER_VAR)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| eyre!("failed to install log subscriber: {e}"))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_in_jill_log() {
        let path = default_log_path();
        assert!(path.ends_with("jill/jill.log"));
    }
}
