use anyhow::Result;

use shortscan::config::Config;
use shortscan::history::{HistoryTracker, JsonFileStore};
use shortscan::logging::{json_log, obj, v_str};
use shortscan::notify;
use shortscan::okx::OkxClient;
use shortscan::scanner::Scanner;

/// One invocation runs exactly one scan cycle; scheduling lives in cron.
#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    json_log(
        "main",
        obj(&[
            ("event", v_str("cycle_start")),
            ("okx_base", v_str(&cfg.okx_base)),
            ("history_path", v_str(&cfg.history_path)),
        ]),
    );

    let source = Box::new(OkxClient::new(&cfg)?);
    let notifier = notify::from_config(&cfg)?;
    let store = Box::new(JsonFileStore::new(&cfg.history_path));
    let tracker = HistoryTracker::open(store, &cfg);

    let mut scanner = Scanner::new(cfg, source, notifier, tracker);
    let report = scanner.run_cycle().await?;

    json_log(
        "main",
        obj(&[
            ("event", v_str("cycle_end")),
            ("pool", serde_json::Value::from(report.pool)),
            ("evaluated", serde_json::Value::from(report.evaluated)),
            ("drift_notices", serde_json::Value::from(report.drift_notices)),
            ("alerts", serde_json::Value::from(report.alerts.len())),
        ]),
    );
    Ok(())
}
