//! Configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Both binaries share the logging
//! settings; the device and the dashboard each have their own section.
//!
//! | Variable                   | Used by   | Default                   |
//! |----------------------------|-----------|---------------------------|
//! | `LISTEN_ADDR`              | device    | `0.0.0.0:3000`            |
//! | `EVENT_BUS_CAPACITY`       | device    | `1024`                    |
//! | `SAMPLE_INTERVAL_MS`       | device    | `500`                     |
//! | `ADC_CHANNELS`             | both      | `4`                       |
//! | `PANEL_ENDPOINT`           | dashboard | `ws://127.0.0.1:3000/ws`  |
//! | `PANEL_SIGNALS`            | dashboard | stock IO board layout     |
//! | `PANEL_VALUE_FIELD`        | dashboard | `text`                    |
//! | `PANEL_PLACEHOLDER`        | dashboard | `--`                      |
//! | `PANEL_RECONNECT_MIN_MS`   | dashboard | `500`                     |
//! | `PANEL_RECONNECT_MAX_MS`   | dashboard | `10000`                   |
//! | `PANEL_RENDER_INTERVAL_MS` | dashboard | `1000`                    |
//! | `LOG_FORMAT`               | both      | `text` (`json` optional)  |

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::client::{ConnectOptions, DashboardLayout};
use crate::domain::SignalId;
use crate::wire::DEFAULT_VALUE_FIELD;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Device (server) configuration.
///
/// Loaded once at startup via [`DeviceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,
    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
    /// Time between board samples.
    pub sample_interval: Duration,
    /// Number of ADC channels exposed.
    pub adc_channels: u8,
    /// Log line format.
    pub log_format: LogFormat,
}

impl DeviceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        Ok(Self {
            listen_addr,
            event_bus_capacity: parse_var(&lookup, "EVENT_BUS_CAPACITY", 1024),
            sample_interval: parse_millis(&lookup, "SAMPLE_INTERVAL_MS", 500),
            adc_channels: parse_var(&lookup, "ADC_CHANNELS", 4),
            log_format: parse_log_format(&lookup),
        })
    }
}

/// Dashboard (client) configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Websocket endpoint of the device.
    pub endpoint: String,
    /// Explicit signal list; `None` means the stock IO board layout.
    pub signals: Option<Vec<SignalId>>,
    /// Number of ADC channels in the stock layout.
    pub adc_channels: u8,
    /// Inbound field holding the displayed value.
    pub value_field: String,
    /// Text shown before a widget's first value.
    pub placeholder: String,
    /// First reconnect delay.
    pub reconnect_min: Duration,
    /// Reconnect delay ceiling.
    pub reconnect_max: Duration,
    /// Time between rendered tables in the log.
    pub render_interval: Duration,
    /// Log line format.
    pub log_format: LogFormat,
}

impl PanelConfig {
    /// Loads configuration from environment variables, with an optional
    /// `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let signals = lookup("PANEL_SIGNALS").map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SignalId::from)
                .collect()
        });

        Self {
            endpoint: lookup("PANEL_ENDPOINT")
                .unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string()),
            signals,
            adc_channels: parse_var(&lookup, "ADC_CHANNELS", 4),
            value_field: lookup("PANEL_VALUE_FIELD")
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_VALUE_FIELD.to_string()),
            placeholder: lookup("PANEL_PLACEHOLDER")
                .unwrap_or_else(|| crate::client::dashboard::DEFAULT_PLACEHOLDER.to_string()),
            reconnect_min: parse_millis(&lookup, "PANEL_RECONNECT_MIN_MS", 500),
            reconnect_max: parse_millis(&lookup, "PANEL_RECONNECT_MAX_MS", 10_000),
            render_interval: parse_millis(&lookup, "PANEL_RENDER_INTERVAL_MS", 1000),
            log_format: parse_log_format(&lookup),
        }
    }

    /// Options for [`crate::client::ConnectionRegistry::acquire`].
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            value_field: self.value_field.clone(),
            reconnect_min: self.reconnect_min,
            reconnect_max: self.reconnect_max,
        }
    }

    /// The layout to mount. Explicit signals get the stock buttons too.
    #[must_use]
    pub fn layout(&self) -> DashboardLayout {
        let stock = DashboardLayout::io_board(self.adc_channels);
        let layout = match &self.signals {
            Some(signals) => DashboardLayout {
                signals: signals.clone(),
                ..stock
            },
            None => stock,
        };
        layout.with_placeholder(self.placeholder.clone())
    }
}

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parses a millisecond duration. Zero counts as invalid: every interval
/// here drives a timer or a backoff that must make progress.
fn parse_millis<F>(lookup: &F, key: &str, default_ms: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let millis = parse_var(lookup, key, default_ms);
    Duration::from_millis(if millis == 0 { default_ms } else { millis })
}

/// `LOG_FORMAT=json` (case-insensitive) selects JSON; anything else is text.
fn parse_log_format<F>(lookup: &F) -> LogFormat
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("LOG_FORMAT") {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn device_defaults() {
        let Ok(cfg) = DeviceConfig::from_lookup(lookup(&[])) else {
            panic!("defaults should parse");
        };
        assert_eq!(cfg.listen_addr.port(), 3000);
        assert_eq!(cfg.event_bus_capacity, 1024);
        assert_eq!(cfg.sample_interval, Duration::from_millis(500));
        assert_eq!(cfg.adc_channels, 4);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn device_rejects_bad_listen_addr() {
        assert!(DeviceConfig::from_lookup(lookup(&[("LISTEN_ADDR", "nowhere")])).is_err());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let Ok(cfg) = DeviceConfig::from_lookup(lookup(&[
            ("ADC_CHANNELS", "many"),
            ("LOG_FORMAT", "JSON"),
        ])) else {
            panic!("should parse");
        };
        assert_eq!(cfg.adc_channels, 4);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn zero_sample_interval_falls_back() {
        let Ok(cfg) = DeviceConfig::from_lookup(lookup(&[("SAMPLE_INTERVAL_MS", "0")])) else {
            panic!("should parse");
        };
        assert_eq!(cfg.sample_interval, Duration::from_millis(500));
    }

    #[test]
    fn zero_panel_intervals_fall_back() {
        let cfg = PanelConfig::from_lookup(lookup(&[
            ("PANEL_RECONNECT_MIN_MS", "0"),
            ("PANEL_RECONNECT_MAX_MS", "0"),
            ("PANEL_RENDER_INTERVAL_MS", "0"),
        ]));
        assert_eq!(cfg.reconnect_min, Duration::from_millis(500));
        assert_eq!(cfg.reconnect_max, Duration::from_millis(10_000));
        assert_eq!(cfg.render_interval, Duration::from_millis(1000));

        let cfg = PanelConfig::from_lookup(lookup(&[("PANEL_RENDER_INTERVAL_MS", "250")]));
        assert_eq!(cfg.render_interval, Duration::from_millis(250));
    }

    #[test]
    fn panel_defaults_use_stock_layout() {
        let cfg = PanelConfig::from_lookup(lookup(&[("ADC_CHANNELS", "2")]));
        assert_eq!(cfg.endpoint, "ws://127.0.0.1:3000/ws");
        assert_eq!(cfg.value_field, "text");
        let layout = cfg.layout();
        assert_eq!(layout.signals.len(), 6);
        assert_eq!(layout.placeholder, "--");
        assert_eq!(layout.buttons.len(), 3);
    }

    #[test]
    fn panel_signal_list_keeps_order_and_duplicates() {
        let cfg = PanelConfig::from_lookup(lookup(&[
            ("PANEL_SIGNALS", "pin_two, adc1_channel0,,pin_two"),
            ("PANEL_VALUE_FIELD", "value"),
            ("PANEL_PLACEHOLDER", "?"),
        ]));
        let layout = cfg.layout();
        let names: Vec<&str> = layout.signals.iter().map(SignalId::as_str).collect();
        assert_eq!(names, ["pin_two", "adc1_channel0", "pin_two"]);
        assert_eq!(layout.placeholder, "?");
        assert_eq!(cfg.connect_options().value_field, "value");
    }
}
