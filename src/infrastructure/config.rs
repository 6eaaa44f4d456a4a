use crate::application::poll_loop::PollSettings;
use crate::error::MonitorError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Payload field name -> channel id, e.g. `temp = "temperature"`
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    pub stale_after_ms: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            capacity: default_capacity(),
            stale_after_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetsConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_precision")]
    pub precision: u32,
    pub color: Option<String>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

fn default_request_timeout_ms() -> u64 {
    1500
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_capacity() -> usize {
    30
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_title() -> String {
    "Window Monitor".to_string()
}

fn default_precision() -> u32 {
    1
}

impl MonitorConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll.interval_ms),
            request_timeout: Duration::from_millis(self.api.request_timeout_ms),
        }
    }

    /// How old the last success may get before the live view is stale.
    /// Defaults to three poll intervals.
    pub fn stale_after(&self) -> Duration {
        let millis = self
            .poll
            .stale_after_ms
            .unwrap_or(self.poll.interval_ms.saturating_mul(3));
        Duration::from_millis(millis)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, MonitorError> {
        self.server.listen.parse().map_err(|e| {
            MonitorError::InvalidConfig(format!("server.listen {:?}: {}", self.server.listen, e))
        })
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.api.base_url.trim().is_empty() {
            return Err(MonitorError::InvalidConfig("api.base_url is empty".to_string()));
        }
        if self.api.request_timeout_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "api.request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll.interval_ms == 0 {
            return Err(MonitorError::InvalidConfig(
                "poll.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll.capacity == 0 {
            return Err(MonitorError::InvalidCapacity);
        }
        self.listen_addr()?;
        Ok(())
    }
}

impl WidgetsConfig {
    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.channels.is_empty() {
            return Err(MonitorError::EmptyChannelSet);
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.id.as_str()) {
                return Err(MonitorError::InvalidConfig(format!(
                    "duplicate channel id {:?}",
                    channel.id
                )));
            }
        }
        Ok(())
    }
}

pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/monitor"))
        .add_source(
            config::Environment::with_prefix("MONITOR")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let monitor: MonitorConfig = settings.try_deserialize()?;
    monitor.validate()?;
    Ok(monitor)
}

pub fn load_widgets_config() -> anyhow::Result<WidgetsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/widgets"))
        .build()?;

    let widgets: WidgetsConfig = settings.try_deserialize()?;
    widgets.validate()?;
    Ok(widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse<T: serde::de::DeserializeOwned>(toml: &str) -> T {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let monitor: MonitorConfig = parse(
            r#"
            [api]
            base_url = "http://127.0.0.1:5001/api"
            "#,
        );

        assert!(monitor.validate().is_ok());
        assert_eq!(monitor.poll.capacity, 30);
        assert_eq!(monitor.poll_settings().interval, Duration::from_millis(2000));
        assert_eq!(monitor.poll_settings().request_timeout, Duration::from_millis(1500));
        assert_eq!(monitor.stale_after(), Duration::from_millis(6000));
        assert_eq!(monitor.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_explicit_values_and_aliases() {
        let monitor: MonitorConfig = parse(
            r#"
            [api]
            base_url = "http://sensors.local/api"
            request_timeout_ms = 800

            [api.aliases]
            temp = "temperature"

            [poll]
            interval_ms = 1000
            capacity = 60
            stale_after_ms = 10000
            "#,
        );

        assert_eq!(monitor.api.aliases.get("temp").map(String::as_str), Some("temperature"));
        assert_eq!(monitor.poll.capacity, 60);
        assert_eq!(monitor.stale_after(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let monitor: MonitorConfig = parse(
            r#"
            [api]
            base_url = "http://127.0.0.1:5001/api"

            [poll]
            interval_ms = 0
            "#,
        );

        assert!(matches!(monitor.validate(), Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_widgets_require_unique_channels() {
        let widgets: WidgetsConfig = parse(
            r#"
            [[channels]]
            id = "temperature"
            title = "Temperature"

            [[channels]]
            id = "temperature"
            title = "Temperature again"
            "#,
        );
        assert!(matches!(widgets.validate(), Err(MonitorError::InvalidConfig(_))));

        let empty: WidgetsConfig = parse("title = \"Empty\"");
        assert_eq!(empty.validate().unwrap_err(), MonitorError::EmptyChannelSet);
    }

    #[test]
    fn test_channel_defaults() {
        let widgets: WidgetsConfig = parse(
            r##"
            [[channels]]
            id = "air_quality"
            title = "Air Quality"
            color = "#10b981"
            "##,
        );

        assert_eq!(widgets.title, "Window Monitor");
        assert_eq!(widgets.channel_ids(), vec!["air_quality".to_string()]);
        assert_eq!(widgets.channels[0].precision, 1);
        assert_eq!(widgets.channels[0].unit, "");
    }
}
