//! Modem configuration, loadable from a TOML file.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Parameters of the FSK audio modem chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f64,
    /// Carrier center frequency in Hz.
    pub center: f64,
    /// Frequency deviation in Hz.
    pub deviation: f64,
    /// Symbol rate in baud (Manchester chips per second on the wire).
    pub baud: f64,
    /// Hardware block size in frames.
    pub block_size: u32,
    /// Frame sync word.
    pub sync: u16,
    /// Message to transmit repeatedly.
    pub message: String,
    /// Seconds between transmissions.
    pub interval: f64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            center: 600.0,
            deviation: 200.0,
            baud: 160.0,
            block_size: 1024,
            sync: 0xC1FA,
            message: "corriente".to_string(),
            interval: 10.0,
        }
    }
}

impl ModemConfig {
    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        toml::from_str(&text).context("parsing modem config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ModemConfig = toml::from_str("center = 3000.0\nbaud = 300.0").unwrap();
        assert_eq!(config.center, 3000.0);
        assert_eq!(config.baud, 300.0);
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.sync, 0xC1FA);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ModemConfig::load("/nonexistent/modem.toml").is_err());
    }
}
