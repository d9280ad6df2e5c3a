//! Top-N buy ranking with an even-split allocation.

use super::indicator::IndicatorSnapshot;
use super::signal::{self, Action, BollingerPosition, Signal};

#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub max_positions: usize,
    /// Nominal budget split evenly across the selected candidates.
    pub budget: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        PortfolioConfig {
            max_positions: 3,
            budget: 10_000.0,
        }
    }
}

/// An instrument currently flagged as a buy, with its ranking inputs.
#[derive(Debug, Clone)]
pub struct BuyCandidate {
    pub code: String,
    pub action: Action,
    pub score: u32,
    pub rsi: Option<f64>,
    pub ma_ratio: f64,
    pub value: f64,
}

/// A selected candidate with its slice of the budget.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub candidate: BuyCandidate,
    pub allocation: f64,
}

/// Weighted dip-buying score. Higher means a deeper, better-supported
/// pullback. Undefined inputs contribute nothing.
pub fn buy_score(snapshot: &IndicatorSnapshot) -> u32 {
    let mut score = 0;

    score += match snapshot.rsi {
        Some(r) if r < 30.0 => 40,
        Some(r) if r < 45.0 => 30,
        Some(_) => 10,
        None => 0,
    };

    score += if snapshot.ma_ratio < 0.9 {
        30
    } else if snapshot.ma_ratio < 1.0 {
        20
    } else {
        5
    };

    let diff = snapshot.macd_diff();
    score += if diff > 0.0 {
        10
    } else if diff < 0.0 {
        5
    } else {
        0
    };

    score += match signal::bollinger_position(snapshot) {
        BollingerPosition::BelowLower => 25,
        BollingerPosition::Mid => 15,
        BollingerPosition::AboveUpper => 5,
    };

    score
}

/// Build a candidate from a classified snapshot; `None` unless the
/// action is buy-side.
pub fn candidate(code: &str, snapshot: &IndicatorSnapshot, sig: &Signal) -> Option<BuyCandidate> {
    if !sig.action.is_buy() {
        return None;
    }
    Some(BuyCandidate {
        code: code.to_string(),
        action: sig.action,
        score: buy_score(snapshot),
        rsi: snapshot.rsi,
        ma_ratio: snapshot.ma_ratio,
        value: snapshot.value,
    })
}

/// Rank candidates and split the budget evenly over the top N.
///
/// Order: action priority (strong buys first), score descending, RSI
/// ascending with undefined RSI last. Deterministic for equal inputs.
pub fn recommend(mut candidates: Vec<BuyCandidate>, config: &PortfolioConfig) -> Vec<Recommendation> {
    candidates.sort_by(|a, b| {
        a.action
            .priority()
            .cmp(&b.action.priority())
            .then(b.score.cmp(&a.score))
            .then_with(|| {
                let ra = a.rsi.unwrap_or(f64::MAX);
                let rb = b.rsi.unwrap_or(f64::MAX);
                ra.total_cmp(&rb)
            })
            .then_with(|| a.code.cmp(&b.code))
    });
    candidates.truncate(config.max_positions);

    if candidates.is_empty() {
        return Vec::new();
    }
    let allocation = config.budget / candidates.len() as f64;
    candidates
        .into_iter()
        .map(|candidate| Recommendation {
            candidate,
            allocation,
        })
        .collect()
}
