//! Layered application settings.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. `$CONFIG_DIR/xiaozhi/config.toml`, if present
//! 3. `XIAOZHI__*` environment variables, `__` separating path segments
//!    (`XIAOZHI__HTTP__ORIGIN`, `XIAOZHI__LOGGING__FILTER`, ...)
//!
//! A `.env` file in the working directory is loaded into the environment first.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xiaozhi_http::HttpConfig;

use crate::AppError;

pub const ENV_PREFIX: &str = "XIAOZHI";
pub const ENV_SEPARATOR: &str = "__";
pub const DEFAULT_LOG_FILTER: &str = "info,xiaozhi_http=debug,hyper_util=warn,reqwest=warn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Where rolling log files go. Unset means the platform data directory.
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub filter: String,
    /// Write JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .map(|d| d.join("xiaozhi").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs")),
        }
    }
}

/// `$CONFIG_DIR/xiaozhi/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("xiaozhi").join("config.toml"))
}

impl AppConfig {
    /// Load from `.env`, the user config file, and the process environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load_layered(
            default_config_path().as_deref(),
            config::Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Load from an explicit file and environment source. The file may be
    /// missing; a file that exists but does not parse is an error.
    pub fn load_layered(
        file: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "reading config file");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }
        let cfg = builder
            .add_source(
                env.separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("http.error_pointers"),
            )
            .build()?
            .try_deserialize::<Self>()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).source(Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = AppConfig::load_layered(None, env(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.http.origin, "http://localhost:5000");
        assert_eq!(cfg.http.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn file_overrides_defaults_and_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [http]
                origin = "http://10.0.0.5:5000"
                timeout_ms = 5000

                [logging]
                filter = "debug"
            "#,
        )
        .unwrap();

        let from_file = AppConfig::load_layered(Some(&path), env(&[])).unwrap();
        assert_eq!(from_file.http.origin, "http://10.0.0.5:5000");
        assert_eq!(from_file.http.timeout_ms, 5000);
        assert_eq!(from_file.http.base_path, "/api");
        assert_eq!(from_file.logging.filter, "debug");

        let layered = AppConfig::load_layered(
            Some(&path),
            env(&[
                ("XIAOZHI__HTTP__TIMEOUT_MS", "750"),
                ("XIAOZHI__HTTP__ERROR_POINTERS", "/error,/detail"),
                ("UNRELATED__HTTP__ORIGIN", "http://ignored"),
            ]),
        )
        .unwrap();
        assert_eq!(layered.http.origin, "http://10.0.0.5:5000");
        assert_eq!(layered.http.timeout_ms, 750);
        assert_eq!(layered.http.error_pointers, vec!["/error", "/detail"]);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_layered(Some(&dir.path().join("absent.toml")), env(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn malformed_file_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http\norigin = ").unwrap();
        let err = AppConfig::load_layered(Some(&path), env(&[])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{err:?}");
    }

    #[test]
    fn serialized_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.logging.dir = Some(dir.path().join("logs"));
        std::fs::write(&path, cfg.to_toml().unwrap()).unwrap();

        let loaded = AppConfig::load_layered(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded, cfg);
    }
}
