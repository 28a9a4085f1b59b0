//! Spend-to-quantity inversion via bisection (spec.md §4.2 `quoteSpendBuy`,
//! §9 "the repository uses a numeric solver... binary search is simplest").
//!
//! The teacher's `delta_q_for_stake` inverts a *different* market model
//! (the stake-weighted scalar-probability LMSR used by `lmsr_api.rs`) in
//! closed form; it does not apply to the canonical Hanson cost function
//! this engine implements, so this is a fresh solver built directly
//! against spec.md's algorithm description, using `LmsrMarketState::cost`
//! as its monotonic objective function.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SolverConfig;
use crate::error::{EngineError, EngineResult};
use crate::lmsr::market::{LmsrMarketState, Outcome};

/// Binary-search the maximum `qty` such that
/// `C(qBefore + qty * e_outcome) - C(qBefore) <= spend`.
///
/// Upper bound: `spend / price_before * 2` (spec.md §4.2: "safe upper
/// bound since price ≤ 1"). This is sound because the marginal price of
/// `outcome` only increases as more of it is bought, so the true cost of
/// buying `qty` shares is always `>= price_before * qty`; picking
/// `qty = spend / price_before` therefore already guarantees
/// `cost_delta(qty) >= spend`, and the factor of 2 plus the widening loop
/// below cover any residual rounding at the edges of the price domain.
pub fn solve_qty_for_spend(
    market: &LmsrMarketState,
    outcome: Outcome,
    spend: Decimal,
    config: &SolverConfig,
) -> EngineResult<Decimal> {
    if spend <= Decimal::ZERO {
        return Err(EngineError::NonPositiveSpend(spend.to_string()));
    }

    let price_before = market.price_of(outcome)?;
    if price_before >= Decimal::ONE {
        return Err(EngineError::NoLiquidity);
    }
    if price_before <= Decimal::ZERO {
        return Err(EngineError::NoLiquidity);
    }

    let mut lo = Decimal::ZERO;
    let mut hi = (spend / price_before) * dec!(2);

    let cost_before = market.cost()?;
    let cost_delta = |qty: Decimal| -> EngineResult<Decimal> {
        Ok(market.cost_after(outcome, qty)? - cost_before)
    };

    // Widen `hi` until it brackets the target, in case the bound above
    // undershoots due to rounding at the edges of the price domain.
    let mut widen_guard = 0;
    while cost_delta(hi)? < spend && widen_guard < config.max_iterations {
        hi *= dec!(2);
        widen_guard += 1;
    }

    let mut best = Decimal::ZERO;
    for _ in 0..config.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let delta = cost_delta(mid)?;
        if delta <= spend {
            best = mid;
            lo = mid;
        } else {
            hi = mid;
        }
        if (delta - spend).abs() <= config.cost_tolerance {
            break;
        }
    }

    Ok(best)
}
