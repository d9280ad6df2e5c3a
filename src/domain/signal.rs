//! Signal classification from the latest indicator snapshot.
//!
//! Two independent first-match-wins ladders over the same snapshot: a
//! coarse investment advice and a stricter mechanical action signal.
//! An undefined indicator value never triggers a rule.

use super::indicator::IndicatorSnapshot;
use std::fmt;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_WEAK_SELL: f64 = 65.0;
pub const RSI_STRONG_BUY: f64 = 35.0;
pub const RSI_WEAK_BUY: f64 = 45.0;
pub const MA_RATIO_STRETCHED: f64 = 1.2;
pub const MA_RATIO_DEPRESSED: f64 = 0.8;
pub const MA_RATIO_STRONG_SELL: f64 = 0.95;
pub const MA_RATIO_STRONG_BUY: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    Accumulate,
    WaitForPullback,
    Observe,
}

impl Advice {
    /// Report ordering: buy-side advice first.
    pub fn priority(self) -> u8 {
        match self {
            Advice::Accumulate => 1,
            Advice::Observe => 2,
            Advice::WaitForPullback => 3,
        }
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Advice::Accumulate => "accumulate",
            Advice::WaitForPullback => "wait-for-pullback",
            Advice::Observe => "observe",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StrongBuy,
    WeakBuy,
    Hold,
    WeakSell,
    StrongSell,
    Unavailable,
}

impl Action {
    /// Report ordering: strong buys first, unavailable last.
    pub fn priority(self) -> u8 {
        match self {
            Action::StrongBuy => 1,
            Action::WeakBuy => 2,
            Action::Hold => 3,
            Action::WeakSell => 4,
            Action::StrongSell => 5,
            Action::Unavailable => 6,
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, Action::StrongBuy | Action::WeakBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, Action::StrongSell | Action::WeakSell)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::StrongBuy => "strong-buy",
            Action::WeakBuy => "weak-buy",
            Action::Hold => "hold",
            Action::WeakSell => "weak-sell",
            Action::StrongSell => "strong-sell",
            Action::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Where the latest value sits relative to its Bollinger bands.
/// Reporting only; the ladders compare against the bands directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerPosition {
    AboveUpper,
    BelowLower,
    Mid,
}

impl fmt::Display for BollingerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BollingerPosition::AboveUpper => "above-upper",
            BollingerPosition::BelowLower => "below-lower",
            BollingerPosition::Mid => "mid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub advice: Advice,
    pub action: Action,
}

impl Signal {
    /// Signal for an instrument whose data could not be classified.
    pub fn unavailable() -> Self {
        Signal {
            advice: Advice::Observe,
            action: Action::Unavailable,
        }
    }
}

pub fn bollinger_position(snapshot: &IndicatorSnapshot) -> BollingerPosition {
    if snapshot.value > snapshot.bb_upper {
        BollingerPosition::AboveUpper
    } else if snapshot.value < snapshot.bb_lower {
        BollingerPosition::BelowLower
    } else {
        BollingerPosition::Mid
    }
}

/// Classify the most recent snapshot into an {advice, action} pair.
/// Pure and deterministic; rule order matters.
pub fn classify(snapshot: &IndicatorSnapshot) -> Signal {
    Signal {
        advice: classify_advice(snapshot),
        action: classify_action(snapshot),
    }
}

fn rsi_above(snapshot: &IndicatorSnapshot, threshold: f64) -> bool {
    snapshot.rsi.is_some_and(|r| r > threshold)
}

fn rsi_below(snapshot: &IndicatorSnapshot, threshold: f64) -> bool {
    snapshot.rsi.is_some_and(|r| r < threshold)
}

fn classify_advice(s: &IndicatorSnapshot) -> Advice {
    let macd_diff = s.macd_diff();

    if rsi_above(s, RSI_OVERBOUGHT) || s.value > s.bb_upper || s.ma_ratio > MA_RATIO_STRETCHED {
        Advice::WaitForPullback
    } else if rsi_below(s, RSI_OVERSOLD)
        || s.value < s.bb_lower
        || s.ma_ratio < MA_RATIO_DEPRESSED
    {
        Advice::Accumulate
    } else if s.ma_ratio > 1.0 && macd_diff > 0.0 {
        Advice::Accumulate
    } else if s.ma_ratio < 1.0 && macd_diff < 0.0 {
        Advice::WaitForPullback
    } else {
        Advice::Observe
    }
}

fn classify_action(s: &IndicatorSnapshot) -> Action {
    let macd_diff = s.macd_diff();

    if s.ma_ratio < MA_RATIO_STRONG_SELL {
        Action::StrongSell
    } else if rsi_above(s, RSI_OVERBOUGHT) && s.ma_ratio > MA_RATIO_STRETCHED && macd_diff < 0.0 {
        Action::StrongSell
    } else if rsi_above(s, RSI_WEAK_SELL)
        || s.value > s.bb_upper
        || s.ma_ratio > MA_RATIO_STRETCHED
    {
        Action::WeakSell
    } else if rsi_below(s, RSI_STRONG_BUY) && s.ma_ratio < MA_RATIO_STRONG_BUY && macd_diff > 0.0 {
        Action::StrongBuy
    } else if rsi_below(s, RSI_WEAK_BUY) || s.value < s.bb_lower || s.ma_ratio < 1.0 {
        Action::WeakBuy
    } else {
        Action::Hold
    }
}
