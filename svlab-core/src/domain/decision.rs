//! StrategyDecision: what a strategy wants to do at one tick.

use serde::{Deserialize, Serialize};

/// A conditional order resting in a stop registry.
///
/// `quantity` is signed and fractional. The engine subtracts triggered
/// stop-loss quantities from the tick's action and adds triggered stop-win
/// quantities to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopOrder {
    pub trigger_price: f64,
    pub quantity: f64,
}

impl StopOrder {
    pub fn new(trigger_price: f64, quantity: f64) -> Self {
        Self {
            trigger_price,
            quantity,
        }
    }
}

/// `(action, stop_loss, stop_win)` returned by a strategy for one tick.
///
/// `action` is the desired change in holdings: positive buys, negative sells.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub action: f64,
    pub stop_loss: Option<StopOrder>,
    pub stop_win: Option<StopOrder>,
}

impl StrategyDecision {
    /// Do nothing this tick.
    pub fn hold() -> Self {
        Self::default()
    }

    pub fn trade(action: f64) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn with_stop_loss(mut self, trigger_price: f64, quantity: f64) -> Self {
        self.stop_loss = Some(StopOrder::new(trigger_price, quantity));
        self
    }

    pub fn with_stop_win(mut self, trigger_price: f64, quantity: f64) -> Self {
        self.stop_win = Some(StopOrder::new(trigger_price, quantity));
        self
    }
}
