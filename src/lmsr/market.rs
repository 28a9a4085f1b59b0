//! LMSR market state and the stable cost/price functions.
//!
//! Grounded on `lmsr_core::{Market, cost, prob_yes, log_sum_exp}`:
//! generalized from `f64` quantities to `Decimal`, and from a single
//! liquidity-only market struct to one that also tracks settlement state
//! (the teacher's market state lived in Postgres columns instead).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::log_sum_exp;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "YES",
            Outcome::No => "NO",
        }
    }

    pub fn parse(s: &str) -> EngineResult<Self> {
        match s {
            "YES" => Ok(Outcome::Yes),
            "NO" => Ok(Outcome::No),
            other => Err(EngineError::InvalidOutcome(other.to_string())),
        }
    }
}

/// `{ pYES, pNO }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prices {
    pub p_yes: Decimal,
    pub p_no: Decimal,
}

/// LMSR market state (spec.md §3 `LMSRMarketState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmsrMarketState {
    pub q_yes: Decimal,
    pub q_no: Decimal,
    pub b: Decimal,
    pub total_collected: Decimal,
    pub settled: bool,
    pub outcome: Option<Outcome>,
}

impl LmsrMarketState {
    pub fn new(b: Decimal) -> EngineResult<Self> {
        if b <= Decimal::ZERO {
            return Err(EngineError::InvalidLiquidity);
        }
        Ok(Self {
            q_yes: Decimal::ZERO,
            q_no: Decimal::ZERO,
            b,
            total_collected: Decimal::ZERO,
            settled: false,
            outcome: None,
        })
    }

    /// `C(qYes, qNo) = b * ln(exp(qYes/b) + exp(qNo/b))`, computed via the
    /// numerically stable log-sum-exp reduction (spec.md §4.2).
    pub fn cost(&self) -> EngineResult<Decimal> {
        let a = self.q_yes / self.b;
        let c = self.q_no / self.b;
        Ok(self.b * log_sum_exp(a, c)?)
    }

    /// Spot prices via the stable softmax gradient.
    pub fn prices(&self) -> EngineResult<Prices> {
        let a = self.q_yes / self.b;
        let c = self.q_no / self.b;
        let m = a.max(c);
        let ey = crate::decimal::exp(a - m)?;
        let en = crate::decimal::exp(c - m)?;
        let denom = ey + en;
        let p_yes = crate::decimal::checked_div(ey, denom)?;
        Ok(Prices { p_yes, p_no: Decimal::ONE - p_yes })
    }

    /// Cost of the market state that would result from adding `qty` shares
    /// of `outcome` to the current state, without mutating `self`.
    pub fn cost_after(&self, outcome: Outcome, qty: Decimal) -> EngineResult<Decimal> {
        let mut hypothetical = self.clone();
        match outcome {
            Outcome::Yes => hypothetical.q_yes += qty,
            Outcome::No => hypothetical.q_no += qty,
        }
        hypothetical.cost()
    }

    pub fn price_of(&self, outcome: Outcome) -> EngineResult<Decimal> {
        let prices = self.prices()?;
        Ok(match outcome {
            Outcome::Yes => prices.p_yes,
            Outcome::No => prices.p_no,
        })
    }

    fn apply_buy(&mut self, outcome: Outcome, qty: Decimal) {
        match outcome {
            Outcome::Yes => self.q_yes += qty,
            Outcome::No => self.q_no += qty,
        }
    }

    pub(crate) fn execute_delta(&mut self, outcome: Outcome, qty: Decimal, payment: Decimal) {
        self.apply_buy(outcome, qty);
        self.total_collected += payment;
    }
}

/// `worstCaseLoss(b) = b * ln 2` (spec.md §4.2).
pub fn worst_case_loss(b: Decimal) -> EngineResult<Decimal> {
    if b <= Decimal::ZERO {
        return Err(EngineError::InvalidLiquidity);
    }
    Ok(b * crate::decimal::ln(Decimal::TWO)?)
}
