//! Runtime configuration. Every tunable is an env var with a default so a
//! bare `shortscan` invocation scans with the stock strategy settings.

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Clone, Debug)]
pub struct Config {
    pub okx_base: String,
    pub http_timeout_secs: u64,
    /// Top-K instruments by 24h volume considered each cycle.
    pub pool_size: usize,
    /// Minimum 24h pump (percent) before an instrument is evaluated.
    pub change_24h_limit: f64,
    /// Minimum score for a ranked alert.
    pub alert_threshold: f64,
    pub rsi_overheat_hard: f64,
    pub rsi_overheat_soft: f64,
    pub funding_danger_limit: f64,
    pub funding_clean_limit: f64,
    pub wall_strong_limit: f64,
    pub rsi_period: usize,
    pub candle_bar: String,
    pub candle_limit: u32,
    pub book_depth: u32,
    /// Reference instrument whose 24h change is shown as market trend.
    pub trend_inst: String,
    /// Substring a symbol must contain to pass the quote-currency filter.
    pub quote_filter: String,
    pub history_path: String,
    /// Drift checks against the previous cycle's record.
    pub wall_weaken_factor: f64,
    pub funding_drop_limit: f64,
    pub score_drop_limit: f64,
    pub telegram_base: String,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            okx_base: env_str("OKX_BASE", "https://www.okx.com"),
            http_timeout_secs: env_u64("HTTP_TIMEOUT_SECS", 10),
            pool_size: env_usize("POOL_SIZE", 100),
            change_24h_limit: env_f64("CHANGE_24H_LIMIT", 8.0),
            alert_threshold: env_f64("ALERT_THRESHOLD", 6.0),
            rsi_overheat_hard: env_f64("RSI_OVERHEAT_HARD", 85.0),
            rsi_overheat_soft: env_f64("RSI_OVERHEAT_SOFT", 75.0),
            funding_danger_limit: env_f64("FUNDING_DANGER_LIMIT", -0.1),
            funding_clean_limit: env_f64("FUNDING_CLEAN_LIMIT", 0.02),
            wall_strong_limit: env_f64("WALL_STRONG_LIMIT", 3.0),
            rsi_period: env_usize("RSI_PERIOD", 14),
            candle_bar: env_str("CANDLE_BAR", "1H"),
            candle_limit: env_u32("CANDLE_LIMIT", 50),
            book_depth: env_u32("BOOK_DEPTH", 20),
            trend_inst: env_str("TREND_INST", "BTC-USDT-SWAP"),
            quote_filter: env_str("QUOTE_FILTER", "-USDT-"),
            history_path: env_str("HISTORY_PATH", "./signal_history.json"),
            wall_weaken_factor: env_f64("WALL_WEAKEN_FACTOR", 0.6),
            funding_drop_limit: env_f64("FUNDING_DROP_LIMIT", 0.05),
            score_drop_limit: env_f64("SCORE_DROP_LIMIT", 2.0),
            telegram_base: env_str("TELEGRAM_BASE", "https://api.telegram.org"),
            telegram_token: std::env::var("TELEGRAM_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),
        }
    }
}
