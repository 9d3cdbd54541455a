//! Configuration management

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub language: LanguageServiceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageServiceConfig {
    /// Language resource endpoint, e.g. https://<resource>.cognitiveservices.azure.com
    pub endpoint: String,
    /// Resource key sent as `Ocp-Apim-Subscription-Key`
    pub api_key: String,
    /// analyze-text API version
    pub api_version: String,
    /// Upper bound for each external call
    pub request_timeout_secs: u64,
    /// ISO 639-1 language sent with sentiment and key phrase documents
    pub default_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on
    pub bind_address: String,
    /// Longest accepted input, in characters
    pub max_text_chars: usize,
}

impl LanguageServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from an optional file, the environment and `.env`
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        // A missing .env is fine
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("language.endpoint", "")?
            .set_default("language.api_key", "")?
            .set_default("language.api_version", "2023-04-01")?
            .set_default("language.request_timeout_secs", 10)?
            .set_default("server.bind_address", "127.0.0.1:5000")?
            .set_default("server.max_text_chars", 5000)?;

        builder = match path {
            Some(path) => {
                let expanded = shellexpand::tilde(path);
                builder.add_source(config::File::from(Path::new(&*expanded)))
            }
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix("LANGUAGE_INSIGHT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("language.endpoint", std::env::var("AZURE_LANGUAGE_ENDPOINT").ok())?
            .set_override_option("language.api_key", std::env::var("AZURE_LANGUAGE_KEY").ok())?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot reach the language service
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.language.endpoint.trim().is_empty() {
            anyhow::bail!("language.endpoint is not set (or AZURE_LANGUAGE_ENDPOINT)");
        }
        if self.language.api_key.trim().is_empty() {
            anyhow::bail!("language.api_key is not set (or AZURE_LANGUAGE_KEY)");
        }
        if self.language.request_timeout_secs == 0 {
            anyhow::bail!("language.request_timeout_secs must be greater than zero");
        }
        if self.server.max_text_chars == 0 {
            anyhow::bail!("server.max_text_chars must be greater than zero");
        }
        Ok(())
    }
}

impl Default for LanguageServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2023-04-01".to_string(),
            request_timeout_secs: 10,
            default_language: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            max_text_chars: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    /// Environment variables are process-wide; tests touching them run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 6] = [
        "AZURE_LANGUAGE_ENDPOINT",
        "AZURE_LANGUAGE_KEY",
        "LANGUAGE_INSIGHT_LANGUAGE__ENDPOINT",
        "LANGUAGE_INSIGHT_LANGUAGE__API_KEY",
        "LANGUAGE_INSIGHT_SERVER__MAX_TEXT_CHARS",
        "LANGUAGE_INSIGHT_SERVER__BIND_ADDRESS",
    ];

    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    fn write_config(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        std::fs::write(
            &path,
            r#"
[language]
endpoint = "https://file.example"
api_key = "filekey"
request_timeout_secs = 3

[server]
max_text_chars = 1234
"#,
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn sample() -> Config {
        Config {
            language: LanguageServiceConfig {
                endpoint: "https://example.cognitiveservices.azure.com".to_string(),
                api_key: "key".to_string(),
                ..Default::default()
            },
            server: ServerConfig::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address, "127.0.0.1:5000");
        assert_eq!(server.max_text_chars, 5000);

        let language = LanguageServiceConfig::default();
        assert_eq!(language.api_version, "2023-04-01");
        assert_eq!(language.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_key() {
        let mut config = sample();
        config.language.api_key = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = sample();
        config.language.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let text = include_str!("../config.example.toml");
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.language.api_version, "2023-04-01");
        assert_eq!(config.server.max_text_chars, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_file_layer_over_defaults() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "language.toml");

        let config = Config::load(Some(path.as_str())).unwrap();
        assert_eq!(config.language.endpoint, "https://file.example");
        assert_eq!(config.language.api_key, "filekey");
        assert_eq!(config.language.request_timeout_secs, 3);
        assert_eq!(config.server.max_text_chars, 1234);
        // Not in the file
        assert_eq!(config.language.api_version, "2023-04-01");
        assert_eq!(config.server.bind_address, "127.0.0.1:5000");
    }

    #[test]
    fn test_load_env_overrides_file() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "language.toml");

        std::env::set_var("AZURE_LANGUAGE_ENDPOINT", "https://env.example");
        std::env::set_var("AZURE_LANGUAGE_KEY", "envkey");
        std::env::set_var("LANGUAGE_INSIGHT_SERVER__MAX_TEXT_CHARS", "100");
        std::env::set_var("LANGUAGE_INSIGHT_SERVER__BIND_ADDRESS", "0.0.0.0:8080");
        let result = Config::load(Some(path.as_str()));
        for var in ENV_VARS {
            std::env::remove_var(var);
        }

        let config = result.unwrap();
        assert_eq!(config.language.endpoint, "https://env.example");
        assert_eq!(config.language.api_key, "envkey");
        assert_eq!(config.server.max_text_chars, 100);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.language.request_timeout_secs, 3);
    }

    #[test]
    fn test_azure_vars_take_precedence_over_prefixed_vars() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "language.toml");

        std::env::set_var("LANGUAGE_INSIGHT_LANGUAGE__API_KEY", "prefixedkey");
        let prefixed = Config::load(Some(path.as_str()));
        std::env::set_var("AZURE_LANGUAGE_KEY", "azurekey");
        let azure = Config::load(Some(path.as_str()));
        for var in ENV_VARS {
            std::env::remove_var(var);
        }

        assert_eq!(prefixed.unwrap().language.api_key, "prefixedkey");
        assert_eq!(azure.unwrap().language.api_key, "azurekey");
    }

    #[test]
    fn test_load_expands_tilde() {
        let _env = clean_env();
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "language.toml");

        let previous_home = std::env::var_os("HOME");
        std::env::set_var("HOME", home.path());
        let result = Config::load(Some("~/language.toml"));
        match previous_home {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }

        assert_eq!(result.unwrap().language.endpoint, "https://file.example");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        assert!(Config::load(missing.to_str()).is_err());
    }

    #[test]
    fn test_load_without_credentials_fails_validation() {
        let _env = clean_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[server]\nmax_text_chars = 10\n").unwrap();

        let err = Config::load(path.to_str()).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }
}
