//! Technical indicators over close-price series.

use std::collections::VecDeque;

/// Relative Strength Index over a simple moving average of gains and
/// losses (trailing `period` deltas, not Wilder smoothing).
///
/// `value()` is `None` until `period` deltas have been seen, and for a
/// fully flat window. A window of pure gains reads 100 rather than
/// dividing by a zero average loss.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
    prev_close: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            gains: VecDeque::with_capacity(period),
            losses: VecDeque::with_capacity(period),
            prev_close: None,
        }
    }

    pub fn update(&mut self, close: f64) {
        if let Some(prev) = self.prev_close {
            let delta = close - prev;
            self.gains.push_back(if delta > 0.0 { delta } else { 0.0 });
            self.losses.push_back(if delta < 0.0 { -delta } else { 0.0 });
            if self.gains.len() > self.period {
                self.gains.pop_front();
                self.losses.pop_front();
            }
        }
        self.prev_close = Some(close);
    }

    pub fn is_ready(&self) -> bool {
        self.gains.len() >= self.period
    }

    pub fn value(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let n = self.gains.len() as f64;
        let avg_gain: f64 = self.gains.iter().sum::<f64>() / n;
        let avg_loss: f64 = self.losses.iter().sum::<f64>() / n;
        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                // Flat window: no strength to measure.
                return None;
            }
            return Some(100.0);
        }
        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

/// RSI of the last element of an oldest-first close series.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    let mut ind = Rsi::new(period);
    for &close in closes {
        ind.update(close);
    }
    ind.value()
}
