//! Scan orchestrator: one cycle over the candidate pool.
//!
//! The pipeline is strictly sequential per candidate. Dispatch is two-tier:
//! drift notifications go out immediately in candidate-iteration order;
//! threshold alerts are buffered, ranked by score descending, and sent as a
//! batch at the end. Data-source failures degrade to neutral values and
//! never abort the cycle.

use anyhow::Result;
use chrono::Utc;
use std::cmp::Ordering;

use crate::config::Config;
use crate::depth;
use crate::history::{HistoryTracker, SignalMeasurement};
use crate::indicators;
use crate::logging::{json_log, log, obj, v_num, v_str, Level};
use crate::notify::Notifier;
use crate::okx::{MarketData, OrderBook, Ticker};
use crate::scoring::{self, Scorecard};

/// What one cycle did, for the caller and the cycle-summary log entry.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Instruments in the volume-ranked candidate pool.
    pub pool: usize,
    /// Candidates that survived the symbol and 24h-change filters.
    pub evaluated: usize,
    pub drift_notices: usize,
    /// Ranked alert texts, in the order they were dispatched.
    pub alerts: Vec<String>,
}

pub struct Scanner {
    cfg: Config,
    source: Box<dyn MarketData>,
    notifier: Box<dyn Notifier>,
    tracker: HistoryTracker,
}

/// 24h change percent, undefined when either price is missing or zero.
fn change_24h(t: &Ticker) -> Option<f64> {
    if t.last > 0.0 && t.open_24h > 0.0 {
        Some((t.last / t.open_24h - 1.0) * 100.0)
    } else {
        None
    }
}

fn warn_unavailable(what: &str, inst_id: &str, err: &anyhow::Error) {
    log(
        Level::Warn,
        "scanner",
        obj(&[
            ("event", v_str("source_unavailable")),
            ("what", v_str(what)),
            ("inst_id", v_str(inst_id)),
            ("error", v_str(&err.to_string())),
        ]),
    );
}

fn format_alert(
    inst_id: &str,
    trend: &str,
    change: f64,
    m: &SignalMeasurement,
    card: &Scorecard,
) -> String {
    let notes = if card.warnings.is_empty() {
        "- stable".to_string()
    } else {
        card.warnings
            .iter()
            .map(|w| format!("- {}", w))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let rsi = m
        .rsi
        .map(|r| format!("{:.2}", r))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "*confidence {:.1}/10* {}\n\
         market trend: {} | 24h change: {:.2}%\n\
         RSI: {} | funding: {:.4}%\n\
         sell wall: {:.1}x\n\
         notes:\n{}",
        card.score, inst_id, trend, change, rsi, m.funding_pct, m.wall_ratio, notes
    )
}

impl Scanner {
    pub fn new(
        cfg: Config,
        source: Box<dyn MarketData>,
        notifier: Box<dyn Notifier>,
        tracker: HistoryTracker,
    ) -> Self {
        Self { cfg, source, notifier, tracker }
    }

    /// Reference instrument's 24h change, display only.
    async fn market_trend(&self) -> String {
        match self.source.ticker(&self.cfg.trend_inst).await {
            Ok(Some(t)) => match change_24h(&t) {
                Some(c) if c < 0.0 => format!("{:.2}%", c),
                Some(c) => format!("+{:.2}%", c),
                None => "undetermined".to_string(),
            },
            Ok(None) => "undetermined".to_string(),
            Err(err) => {
                warn_unavailable("trend_ticker", &self.cfg.trend_inst, &err);
                "undetermined".to_string()
            }
        }
    }

    /// Top instruments by 24h volume. An unreachable source reads as an
    /// empty pool; the cycle then sends zero alerts and exits cleanly.
    async fn candidate_pool(&self) -> Vec<Ticker> {
        let mut tickers = match self.source.tickers("SWAP").await {
            Ok(tickers) => tickers,
            Err(err) => {
                warn_unavailable("tickers", "SWAP", &err);
                Vec::new()
            }
        };
        tickers.sort_by(|a, b| {
            b.vol_24h.partial_cmp(&a.vol_24h).unwrap_or(Ordering::Equal)
        });
        tickers.truncate(self.cfg.pool_size);
        tickers
    }

    async fn evaluate(
        &mut self,
        ticker: &Ticker,
        trend: &str,
        change: f64,
        report: &mut CycleReport,
    ) -> Option<(f64, String)> {
        let inst_id = &ticker.inst_id;

        let mut candles = match self
            .source
            .candles(inst_id, &self.cfg.candle_bar, self.cfg.candle_limit)
            .await
        {
            Ok(candles) => candles,
            Err(err) => {
                warn_unavailable("candles", inst_id, &err);
                Vec::new()
            }
        };
        if candles.is_empty() {
            return None;
        }
        // Exchange returns newest-first; the indicator wants oldest-first.
        candles.reverse();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let rsi = indicators::rsi(&closes, self.cfg.rsi_period);

        let funding_pct = match self.source.funding_rate(inst_id).await {
            Ok(Some(f)) => f.rate * 100.0,
            Ok(None) => 0.0,
            Err(err) => {
                warn_unavailable("funding_rate", inst_id, &err);
                0.0
            }
        };

        let book = match self.source.order_book(inst_id, self.cfg.book_depth).await {
            Ok(book) => book,
            Err(err) => {
                warn_unavailable("order_book", inst_id, &err);
                OrderBook::default()
            }
        };
        let (wall_ratio, _total_ask) = depth::wall_ratio(&book);

        let card = scoring::score(&self.cfg, rsi, funding_pct, wall_ratio, change);
        let measurement = SignalMeasurement {
            inst_id: inst_id.clone(),
            score: card.score,
            rsi,
            funding_pct,
            wall_ratio,
            observed_at: Utc::now().timestamp(),
        };

        log(
            Level::Debug,
            "scanner",
            obj(&[
                ("event", v_str("evaluated")),
                ("inst_id", v_str(inst_id)),
                ("score", v_num(card.score)),
                ("rsi", rsi.map(v_num).unwrap_or(serde_json::Value::Null)),
                ("funding_pct", v_num(funding_pct)),
                ("wall_ratio", v_num(wall_ratio)),
                ("change_24h", v_num(change)),
            ]),
        );

        // Drift notifications are dispatched immediately, in candidate
        // order, never batched with the ranked alerts.
        match self.tracker.record_and_diff(&measurement) {
            Ok(Some(update)) => {
                report.drift_notices += 1;
                let text = format!("active tracking update\n\n*{}*\n{}", inst_id, update);
                self.notifier.send(&text).await;
            }
            Ok(None) => {}
            Err(err) => {
                log(
                    Level::Error,
                    "history",
                    obj(&[
                        ("event", v_str("persist_failed")),
                        ("inst_id", v_str(inst_id)),
                        ("error", v_str(&err.to_string())),
                    ]),
                );
            }
        }

        if card.score >= self.cfg.alert_threshold {
            Some((card.score, format_alert(inst_id, trend, change, &measurement, &card)))
        } else {
            None
        }
    }

    /// Run one full scan cycle and return what was dispatched.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let trend = self.market_trend().await;
        let pool = self.candidate_pool().await;

        let mut report = CycleReport { pool: pool.len(), ..CycleReport::default() };
        let mut buffered: Vec<(f64, String)> = Vec::new();

        for ticker in &pool {
            if !ticker.inst_id.contains(&self.cfg.quote_filter) {
                continue;
            }
            let change = match change_24h(ticker) {
                Some(change) => change,
                None => continue,
            };
            if change <= self.cfg.change_24h_limit {
                continue;
            }
            report.evaluated += 1;
            if let Some(alert) = self.evaluate(ticker, &trend, change, &mut report).await {
                buffered.push(alert);
            }
        }

        buffered.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        for (_, msg) in buffered {
            self.notifier.send(&msg).await;
            report.alerts.push(msg);
        }

        json_log(
            "scanner",
            obj(&[
                ("event", v_str("cycle_done")),
                ("trend", v_str(&trend)),
                ("pool", serde_json::Value::from(report.pool)),
                ("evaluated", serde_json::Value::from(report.evaluated)),
                ("drift_notices", serde_json::Value::from(report.drift_notices)),
                ("alerts", serde_json::Value::from(report.alerts.len())),
            ]),
        );
        Ok(report)
    }
}
