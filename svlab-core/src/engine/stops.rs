//! Stop-loss / stop-win registries.
//!
//! A registry maps a trigger price to an accumulated signed quantity. Prices
//! are snapped to a 1e-8 grid and kept in a `BTreeMap`, so registering the
//! same level twice sums the quantities and a trigger scan is a single range
//! split of the ordered map.
//!
//! - stop-loss entries trigger when the current price is strictly below the key
//! - stop-win entries trigger when the current price is strictly above the key
//!
//! Triggered entries are removed in the same call.
//!
//! Keys are `i64`, so a trigger price must lie within
//! `±MAX_TRIGGER_PRICE` (about 9.2e10); registering one outside that range is
//! an error rather than a silent collapse onto the saturated key.

use crate::domain::StopOrder;
use std::collections::BTreeMap;
use thiserror::Error;

/// Grid resolution for trigger prices.
const KEY_SCALE: f64 = 1e8;

/// Largest trigger price magnitude the key grid can hold.
pub const MAX_TRIGGER_PRICE: f64 = i64::MAX as f64 / KEY_SCALE;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StopError {
    #[error("stop trigger price {price} is outside the supported range ±{max:e}")]
    TriggerOutOfRange { price: f64, max: f64 },
}

fn price_key(price: f64) -> i64 {
    (price * KEY_SCALE).round() as i64
}

fn key_price(key: i64) -> f64 {
    key as f64 / KEY_SCALE
}

/// Direction in which a registry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Fires when price < trigger.
    Loss,
    /// Fires when price > trigger.
    Win,
}

/// Sum of the quantities released by one trigger scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triggered {
    pub quantity: f64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
pub struct StopRegistry {
    kind: StopKind,
    entries: BTreeMap<i64, f64>,
}

impl StopRegistry {
    pub fn new(kind: StopKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn stop_loss() -> Self {
        Self::new(StopKind::Loss)
    }

    pub fn stop_win() -> Self {
        Self::new(StopKind::Win)
    }

    pub fn kind(&self) -> StopKind {
        self.kind
    }

    /// Add `order.quantity` at `order.trigger_price`, summing on collision.
    ///
    /// A non-finite trigger price can never compare true against a price, so
    /// such an order is dropped.
    pub fn register(&mut self, order: StopOrder) -> Result<(), StopError> {
        let price = order.trigger_price;
        if !price.is_finite() {
            return Ok(());
        }
        // `>=`: MAX_TRIGGER_PRICE itself rounds up to 2^63 and would saturate.
        if price.abs() >= MAX_TRIGGER_PRICE {
            return Err(StopError::TriggerOutOfRange {
                price,
                max: MAX_TRIGGER_PRICE,
            });
        }
        *self.entries.entry(price_key(price)).or_insert(0.0) += order.quantity;
        Ok(())
    }

    /// Remove and sum every entry that fires at `price`.
    pub fn trigger(&mut self, price: f64) -> Triggered {
        if self.entries.is_empty() || !price.is_finite() {
            return Triggered::default();
        }
        let key = price_key(price);
        let fired = match self.kind {
            StopKind::Loss => self.entries.split_off(&key.saturating_add(1)),
            StopKind::Win => {
                let kept = self.entries.split_off(&key);
                std::mem::replace(&mut self.entries, kept)
            }
        };
        Triggered {
            quantity: fired.values().sum(),
            entries: fired.len(),
        }
    }

    /// Accumulated quantity resting at `price`, if any.
    pub fn quantity_at(&self, price: f64) -> Option<f64> {
        self.entries.get(&price_key(price)).copied()
    }

    /// `(trigger_price, quantity)` pairs in ascending price order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().map(|(&k, &q)| (key_price(k), q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
