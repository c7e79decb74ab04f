use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Gemini API base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vision model the critique prompt is written for.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro-vision";

#[derive(Debug, Clone)]
pub struct CritiqueConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub upload: UploadSettings,
    /// OpenTelemetry collector; traces are only exported when set.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// May be empty outside production; calls then fail upstream.
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    /// `None` waits for the upstream indefinitely.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Body limit for the upload route. `None` disables the limit.
    pub max_body_bytes: Option<usize>,
}

impl CritiqueConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the service settings from any key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let env = EnvReader { lookup, is_prod };

        // The key is only mandatory in production.
        let api_key = if is_prod {
            env.get("GEMINI_API_KEY", None)?
        } else {
            env.get("GEMINI_API_KEY", Some(""))?
        };

        Ok(CritiqueConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(api_key),
                model: env.get("GEMINI_MODEL", Some(DEFAULT_GEMINI_MODEL))?,
                api_base: env
                    .get("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE))?
                    .trim_end_matches('/')
                    .to_string(),
                timeout: env
                    .parse_optional::<u64>("GEMINI_TIMEOUT_SECS")?
                    .map(Duration::from_secs),
            },
            upload: UploadSettings {
                max_body_bytes: env.parse_optional("UPLOAD_MAX_BYTES")?,
            },
            otlp_endpoint: env.optional("OTLP_ENDPOINT"),
        })
    }
}

struct EnvReader<F> {
    lookup: F,
    is_prod: bool,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str, default: Option<&str>) -> Result<String, AppError> {
        match (self.lookup)(key) {
            Some(val) => Ok(val),
            None => match default {
                Some(def) => Ok(def.to_string()),
                None if self.is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                ))),
                None => Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                ))),
            },
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn common() -> core_config::Config {
        core_config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    fn load(vars: &[(&str, &str)]) -> Result<CritiqueConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CritiqueConfig::from_lookup(common(), |key| vars.get(key).cloned())
    }

    #[test]
    fn dev_defaults_apply() {
        let config = load(&[]).unwrap();

        assert_eq!(config.gemini.api_key.expose_secret(), "");
        assert_eq!(config.gemini.model, "gemini-pro-vision");
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
        assert!(config.gemini.timeout.is_none());
        assert!(config.upload.max_body_bytes.is_none());
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_API_BASE", "http://127.0.0.1:9999/v1beta/"),
            ("GEMINI_TIMEOUT_SECS", "30"),
            ("UPLOAD_MAX_BYTES", "1048576"),
        ])
        .unwrap();

        assert_eq!(config.gemini.api_key.expose_secret(), "secret");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.api_base, "http://127.0.0.1:9999/v1beta");
        assert_eq!(config.gemini.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.upload.max_body_bytes, Some(1_048_576));
    }

    #[test]
    fn production_requires_api_key() {
        let err = load(&[("ENVIRONMENT", "prod")]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let config = load(&[("ENVIRONMENT", "prod"), ("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn rejects_unparseable_limits() {
        let err = load(&[("UPLOAD_MAX_BYTES", "lots")]).unwrap_err();
        assert!(err.to_string().contains("UPLOAD_MAX_BYTES"));
    }
}
