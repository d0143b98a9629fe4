use serde::{Deserialize, Deserializer};

const TRUTHY: [&str; 3] = ["true", "t", "1"];

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub service_name: String,
    pub log_level: String,
    /// Export spans over OTLP (env: TRACING)
    #[serde(deserialize_with = "deserialize_truthy")]
    pub tracing: bool,
    /// Write span START/END records to the log (env: LOG_SPAN_EVENTS)
    #[serde(deserialize_with = "deserialize_truthy")]
    pub log_span_events: bool,
    pub app_host: String,
    pub app_port: u16,
    pub checker: CheckerSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckerSettings {
    /// Upper bound for the whole outbound request, in seconds
    pub timeout_secs: u64,
    /// Overrides the default `<service_name>/<version>` user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            user_agent: None,
        }
    }
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    // EnvFilter directives are lowercase, LOG_LEVEL is usually not
    pub fn log_filter(&self) -> String {
        self.log_level.trim().to_lowercase()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTHY.contains(&value.as_str())
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value == 1,
        Flag::Text(value) => is_truthy(&value),
    })
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let settings = config::Config::builder()
        .set_default("service_name", "is-it-down")?
        .set_default("log_level", "info")?
        .set_default("tracing", false)?
        .set_default("log_span_events", false)?
        .set_default("app_host", "127.0.0.1")?
        .set_default("app_port", 8080)?
        .set_default("checker.timeout_secs", 5)?
        // Optional `configuration` file: .json, .toml, .yaml, .yml
        .add_source(config::File::with_name("configuration").required(false))
        // SERVICE_NAME, LOG_LEVEL, TRACING, APP_PORT, CHECKER__TIMEOUT_SECS ...
        .add_source(config::Environment::default().separator("__"))
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values_enable_tracing() {
        for value in ["true", "TRUE", "t", "T", "1", " true "] {
            assert!(is_truthy(value), "{value:?} should be truthy");
        }
    }

    #[test]
    fn anything_else_is_falsy() {
        for value in ["", "false", "0", "yes", "on", "2", "tru"] {
            assert!(!is_truthy(value), "{value:?} should be falsy");
        }
    }

    #[test]
    fn log_filter_is_lowercased() {
        let settings = Settings {
            service_name: "is-it-down".to_string(),
            log_level: "DEBUG ".to_string(),
            tracing: false,
            log_span_events: false,
            app_host: "0.0.0.0".to_string(),
            app_port: 8080,
            checker: CheckerSettings::default(),
        };

        assert_eq!(settings.log_filter(), "debug");
        assert_eq!(settings.address(), "0.0.0.0:8080");
    }
}
