//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub replay: ReplaySettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "backtest".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Settings for the synthetic replay harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// Quote currency name, e.g. `ETH`
    pub quote_name: String,
    /// Base currency name, e.g. `BTC`
    pub base_name: String,
    /// Replay start, Unix milliseconds
    pub start_timestamp: i64,
    /// Step width in milliseconds
    pub step_ms: i64,
    /// Number of replay steps
    pub steps: usize,
    /// Price level the synthetic walk oscillates around
    pub base_price: f64,
    /// Fee charged per fill, as a fraction of the notional
    pub fee_rate: Decimal,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            quote_name: "ETH".to_string(),
            base_name: "BTC".to_string(),
            start_timestamp: 1_517_599_560_000,
            step_ms: 60_000,
            steps: 120,
            base_price: 0.09,
            // 0.001 = 10 basis points
            fee_rate: Decimal::new(1, 3),
        }
    }
}
