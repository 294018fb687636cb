use crate::domain::dashboard::DisplayFormat;
use crate::domain::filter::RecordLimit;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub poll: PollSettings,
    pub server: ServerSettings,
    pub history: HistorySettings,
    pub display: DisplayFormat,
}

impl AppConfig {
    fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(self.poll.interval_ms > 0, "poll.interval_ms must be greater than zero");
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl SourceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollSettings {
    pub interval_ms: u64,
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistorySettings {
    pub default_limit: RecordLimit,
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    let display = DisplayFormat::default();
    config::Config::builder()
        .set_default("source.base_url", "http://127.0.0.1:8000")?
        .set_default("source.request_timeout_ms", 10_000)?
        .set_default("poll.interval_ms", 2_000)?
        .set_default("server.listen", "0.0.0.0:8080")?
        .set_default("history.default_limit", 10)?
        .set_default("display.bucket_label_format", display.bucket_label_format)?
        .set_default("display.timestamp_format", display.timestamp_format)
}

/// Built-in defaults, overridden by `config/inspection.{toml,...}` when present
/// and then by `INSPECTION__SECTION__KEY` environment variables.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = defaults()?
        .add_source(config::File::with_name("config/inspection").required(false))
        .add_source(config::Environment::with_prefix("INSPECTION").separator("__"))
        .build()?;

    settings.try_deserialize::<AppConfig>()?.validate()
}
