//! OKX v5 public market data.
//!
//! Raw records plus the `MarketData` trait the scanner consumes. Every
//! endpoint wraps its payload in the same `{code, msg, data}` envelope with
//! string-encoded numerics; parsing is lenient because the scanner treats
//! any malformed response as unavailable data, never as a fatal error.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Ticker {
    pub inst_id: String,
    pub last: f64,
    pub open_24h: f64,
    pub vol_24h: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Candle {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

#[derive(Debug, Clone)]
pub struct FundingRate {
    pub inst_id: String,
    /// Fraction, e.g. 0.0002. Percent-scale before scoring.
    pub rate: f64,
}

#[async_trait]
pub trait MarketData: Send + Sync {
    async fn tickers(&self, inst_type: &str) -> Result<Vec<Ticker>>;
    async fn ticker(&self, inst_id: &str) -> Result<Option<Ticker>>;
    /// Newest-first, as the exchange returns them.
    async fn candles(&self, inst_id: &str, bar: &str, limit: u32) -> Result<Vec<Candle>>;
    async fn order_book(&self, inst_id: &str, depth: u32) -> Result<OrderBook>;
    async fn funding_rate(&self, inst_id: &str) -> Result<Option<FundingRate>>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
struct RawTicker {
    #[serde(rename = "instId")]
    inst_id: String,
    #[serde(default)]
    last: String,
    #[serde(rename = "open24h", default)]
    open_24h: String,
    #[serde(rename = "vol24h", default)]
    vol_24h: String,
}

#[derive(Deserialize)]
struct RawBook {
    #[serde(default)]
    asks: Vec<Vec<String>>,
    #[serde(default)]
    bids: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawFunding {
    #[serde(rename = "instId")]
    inst_id: String,
    #[serde(rename = "fundingRate", default)]
    funding_rate: String,
}

fn num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

impl From<RawTicker> for Ticker {
    fn from(raw: RawTicker) -> Self {
        Ticker {
            inst_id: raw.inst_id,
            last: num(&raw.last),
            open_24h: num(&raw.open_24h),
            vol_24h: num(&raw.vol_24h),
        }
    }
}

/// Candle rows arrive as string arrays: [ts, o, h, l, c, vol, ...].
fn parse_candle_row(row: &[String]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    Some(Candle {
        ts: row[0].parse().unwrap_or(0),
        open: num(&row[1]),
        high: num(&row[2]),
        low: num(&row[3]),
        close: num(&row[4]),
        volume: num(&row[5]),
    })
}

fn parse_level(row: &[String]) -> Option<BookLevel> {
    if row.len() < 2 {
        return None;
    }
    Some(BookLevel { price: num(&row[0]), size: num(&row[1]) })
}

pub struct OkxClient {
    client: Client,
    base: String,
}

impl OkxClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self { client, base: cfg.okx_base.clone() })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base, path);
        let resp = self.client.get(&url).query(params).send().await?;
        let envelope: Envelope<T> = resp.json().await?;
        if envelope.code != "0" {
            return Err(anyhow!("okx error {}: {}", envelope.code, envelope.msg));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl MarketData for OkxClient {
    async fn tickers(&self, inst_type: &str) -> Result<Vec<Ticker>> {
        let raw: Vec<RawTicker> = self
            .get_data("/api/v5/market/tickers", &[("instType", inst_type)])
            .await?;
        Ok(raw.into_iter().map(Ticker::from).collect())
    }

    async fn ticker(&self, inst_id: &str) -> Result<Option<Ticker>> {
        let raw: Vec<RawTicker> = self
            .get_data("/api/v5/market/ticker", &[("instId", inst_id)])
            .await?;
        Ok(raw.into_iter().next().map(Ticker::from))
    }

    async fn candles(&self, inst_id: &str, bar: &str, limit: u32) -> Result<Vec<Candle>> {
        let limit = limit.to_string();
        let raw: Vec<Vec<String>> = self
            .get_data(
                "/api/v5/market/candles",
                &[("instId", inst_id), ("bar", bar), ("limit", &limit)],
            )
            .await?;
        Ok(raw.iter().filter_map(|row| parse_candle_row(row)).collect())
    }

    async fn order_book(&self, inst_id: &str, depth: u32) -> Result<OrderBook> {
        let depth = depth.to_string();
        let raw: Vec<RawBook> = self
            .get_data("/api/v5/market/books", &[("instId", inst_id), ("sz", &depth)])
            .await?;
        let book = raw.into_iter().next().unwrap_or_else(|| RawBook {
            asks: Vec::new(),
            bids: Vec::new(),
        });
        Ok(OrderBook {
            asks: book.asks.iter().filter_map(|r| parse_level(r)).collect(),
            bids: book.bids.iter().filter_map(|r| parse_level(r)).collect(),
        })
    }

    async fn funding_rate(&self, inst_id: &str) -> Result<Option<FundingRate>> {
        let raw: Vec<RawFunding> = self
            .get_data("/api/v5/public/funding-rate", &[("instId", inst_id)])
            .await?;
        Ok(raw.into_iter().next().map(|f| FundingRate {
            inst_id: f.inst_id,
            rate: num(&f.funding_rate),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_envelope_decodes() {
        let body = r#"{"code":"0","msg":"","data":[
            {"instId":"BTC-USDT-SWAP","last":"65000.1","open24h":"60000","vol24h":"123456"}
        ]}"#;
        let envelope: Envelope<RawTicker> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.code, "0");
        let t = Ticker::from(envelope.data.into_iter().next().unwrap());
        assert_eq!(t.inst_id, "BTC-USDT-SWAP");
        assert!((t.last - 65000.1).abs() < 1e-9);
        assert!((t.open_24h - 60000.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_envelope_has_nonzero_code() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist"}"#;
        let envelope: Envelope<RawTicker> = serde_json::from_str(body).unwrap();
        assert_ne!(envelope.code, "0");
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn test_candle_row_parses() {
        let row: Vec<String> = ["1700000000000", "1.0", "1.2", "0.9", "1.1", "5000", "x", "y", "1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let c = parse_candle_row(&row).unwrap();
        assert_eq!(c.ts, 1700000000000);
        assert!((c.close - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_short_candle_row_rejected() {
        let row: Vec<String> = ["1700000000000", "1.0"].iter().map(|s| s.to_string()).collect();
        assert!(parse_candle_row(&row).is_none());
    }

    #[test]
    fn test_book_levels_parse() {
        let body = r#"{"code":"0","msg":"","data":[
            {"asks":[["10.0","6","0","1"],["10.1","2","0","1"]],
             "bids":[["9.9","1","0","1"]]}
        ]}"#;
        let envelope: Envelope<RawBook> = serde_json::from_str(body).unwrap();
        let raw = envelope.data.into_iter().next().unwrap();
        let asks: Vec<BookLevel> = raw.asks.iter().filter_map(|r| parse_level(r)).collect();
        assert_eq!(asks.len(), 2);
        assert!((asks[0].size - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_numeric_reads_zero() {
        assert_eq!(num("not-a-number"), 0.0);
        assert_eq!(num(""), 0.0);
    }
}
