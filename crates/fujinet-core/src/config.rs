//! Layered configuration for the network HAL.
//!
//! Configuration is resolved from three layers, later layers overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`HalConfig::default`])
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `FUJINET_`, using `__` to separate
//!    sections (e.g. `FUJINET_HTTP__TIMEOUT_MS=3000`)
//!
//! # Example file
//!
//! ```toml
//! [http]
//! timeout_ms = 8000
//! user_agent = "my-atari/1.0"
//!
//! [device]
//! auto_open_on_get = true
//!
//! [bus]
//! listen = "0.0.0.0:6502"
//! ```

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_BUS_LISTEN, DEFAULT_BUS_READ_TIMEOUT_MS,
        DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HTTP_TIMEOUT_MS, MAX_TRANSFER_SIZE,
    },
};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FUJINET_";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct HalConfig {
    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub bus: BusSettings,
}

/// Settings handed to the HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpSettings {
    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            user_agent: format!("fujinet-hal/{}", crate::VERSION),
            accept_invalid_certs: false,
        }
    }
}

/// Device state machine behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Let GET on an idle unit open it implicitly.
    pub auto_open_on_get: bool,

    /// Largest response body delivered to a host buffer.
    pub max_transfer: usize,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            auto_open_on_get: false,
            max_transfer: MAX_TRANSFER_SIZE,
        }
    }
}

/// Host bus transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BusSettings {
    /// Address the TCP platform listens on for the host.
    pub listen: String,

    /// Serial device path; when set the serial transport is used.
    pub serial_port: Option<String>,

    pub baud_rate: u32,

    pub read_timeout_ms: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_BUS_LISTEN.to_string(),
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_BUS_READ_TIMEOUT_MS,
        }
    }
}

impl HalConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// A missing file is not an error; the remaining layers still apply.
    ///
    /// # Errors
    /// Returns `Error::Figment` if a layer cannot be parsed, or `Error::Config`
    /// if the merged values fail [`HalConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(HalConfig::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let config: HalConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_ms == 0 {
            return Err(Error::Config("http.timeout_ms must be non-zero".into()));
        }
        if self.http.connect_timeout_ms == 0 {
            return Err(Error::Config(
                "http.connect_timeout_ms must be non-zero".into(),
            ));
        }
        if self.device.max_transfer == 0 || self.device.max_transfer > MAX_TRANSFER_SIZE {
            return Err(Error::Config(format!(
                "device.max_transfer must be 1-{MAX_TRANSFER_SIZE}, got {}",
                self.device.max_transfer
            )));
        }
        if self.bus.baud_rate == 0 {
            return Err(Error::Config("bus.baud_rate must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = HalConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.device.auto_open_on_get);
        assert_eq!(config.device.max_transfer, MAX_TRANSFER_SIZE);
        assert_eq!(config.bus.listen, DEFAULT_BUS_LISTEN);
        assert!(config.http.user_agent.starts_with("fujinet-hal/"));
    }

    #[test]
    fn test_load_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "fujinet.toml",
                r#"
                [http]
                timeout_ms = 2500

                [bus]
                listen = "0.0.0.0:9000"
                "#,
            )?;
            jail.set_env("FUJINET_DEVICE__AUTO_OPEN_ON_GET", "true");
            jail.set_env("FUJINET_HTTP__TIMEOUT_MS", "4000");

            let config = HalConfig::load(Some(Path::new("fujinet.toml"))).unwrap();

            // Environment wins over the file
            assert_eq!(config.http.timeout_ms, 4000);
            assert_eq!(config.bus.listen, "0.0.0.0:9000");
            assert!(config.device.auto_open_on_get);
            // Untouched values keep their defaults
            assert_eq!(config.http.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = HalConfig::load(Some(Path::new("does-not-exist.toml"))).unwrap();
            assert_eq!(config, HalConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("FUJINET_DEVICE__MAX_TRANSFER", "40000");
            let result = HalConfig::load(None);
            assert!(matches!(result, Err(Error::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_reports_figment_error() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[http]\ntimeout_ms = \"soon\"\n")?;
            let result = HalConfig::load(Some(Path::new("bad.toml")));
            assert!(matches!(result, Err(Error::Figment(_))));
            Ok(())
        });
    }
}
