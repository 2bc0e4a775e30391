//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory holding the identity and server files.
    pub data_dir: PathBuf,
    /// Relay server address, `host:port`.
    pub server_addr: String,
}

impl CliConfig {
    /// Returns the identity file path.
    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join(courier_core::DEFAULT_IDENTITY_FILE)
    }

    /// Returns the server address file path.
    pub fn server_info_path(&self) -> PathBuf {
        self.data_dir.join("server.info")
    }

    /// Resolves the relay address: a `server.info` file in the data
    /// directory overrides the flag/env value.
    pub fn resolve_server_addr(&mut self) -> Result<()> {
        let path = self.server_info_path();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let addr = content
                .lines()
                .next()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .with_context(|| format!("{} is empty", path.display()))?;
            self.server_addr = addr.to_string();
        }
        Ok(())
    }
}
