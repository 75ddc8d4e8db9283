//! Signal events and the alternating history they are recorded into.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a signal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
}

/// One buy or sell decision, priced at the close of the day it completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub action: Action,
}

/// Ordered events for one rule family.
///
/// # Invariants
/// - Actions strictly alternate, starting with `Buy`.
/// - Events are only added through [`buy`](Self::buy) and [`sell`](Self::sell),
///   which silently drop a request that would break alternation.
/// - Deserializing replays the stored events through the same gate and fails
///   on the first one it would drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SignalHistory {
    events: Vec<SignalEvent>,
}

/// A stored event sequence that does not alternate buy/sell from a buy.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("event {index} ({action:?} on {date}) breaks buy/sell alternation")]
pub struct HistoryError {
    pub index: usize,
    pub action: Action,
    pub date: NaiveDate,
}

impl TryFrom<Vec<SignalEvent>> for SignalHistory {
    type Error = HistoryError;

    fn try_from(events: Vec<SignalEvent>) -> Result<Self, Self::Error> {
        let mut history = SignalHistory::new();
        for (index, event) in events.into_iter().enumerate() {
            let accepted = match event.action {
                Action::Buy => history.buy(&event.symbol, event.date, event.price),
                Action::Sell => history.sell(&event.symbol, event.date, event.price),
            };
            if !accepted {
                return Err(HistoryError {
                    index,
                    action: event.action,
                    date: event.date,
                });
            }
        }
        Ok(history)
    }
}

impl<'de> Deserialize<'de> for SignalHistory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let events = Vec::<SignalEvent>::deserialize(deserializer)?;
        SignalHistory::try_from(events).map_err(serde::de::Error::custom)
    }
}

impl SignalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buy is allowed on an empty history or after a sell.
    pub fn can_buy(&self) -> bool {
        match self.events.last() {
            None => true,
            Some(last) => last.action == Action::Sell,
        }
    }

    /// A sell is allowed only while holding (last action was a buy).
    pub fn can_sell(&self) -> bool {
        matches!(self.events.last(), Some(last) if last.action == Action::Buy)
    }

    /// Record a buy. Returns false (and records nothing) if the gate is closed.
    pub fn buy(&mut self, symbol: &str, date: NaiveDate, price: f64) -> bool {
        if !self.can_buy() {
            return false;
        }
        self.events.push(SignalEvent {
            symbol: symbol.to_string(),
            date,
            price,
            action: Action::Buy,
        });
        true
    }

    /// Record a sell. Returns false (and records nothing) if the gate is closed.
    pub fn sell(&mut self, symbol: &str, date: NaiveDate, price: f64) -> bool {
        if !self.can_sell() {
            return false;
        }
        self.events.push(SignalEvent {
            symbol: symbol.to_string(),
            date,
            price,
            action: Action::Sell,
        });
        true
    }

    /// Realized profit over closed round trips.
    ///
    /// Buys debit and sells credit a running total; each sell snapshots it.
    /// A trailing unmatched buy is ignored entirely, so the score reflects only
    /// completed round trips (0 if no sell ever happened).
    pub fn profit(&self) -> f64 {
        let mut running = 0.0;
        let mut realized = 0.0;
        let mut holding = false;

        for event in &self.events {
            match event.action {
                Action::Buy => {
                    running -= event.price;
                    holding = true;
                }
                Action::Sell => {
                    running += event.price;
                    realized = running;
                    holding = false;
                }
            }
        }

        if holding {
            realized
        } else {
            running
        }
    }

    pub fn events(&self) -> &[SignalEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&SignalEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the history ends on an open (unmatched) buy.
    pub fn is_holding(&self) -> bool {
        self.can_sell()
    }
}
