//! Binary LMSR automated market maker (spec.md §4.2).

pub mod engine;
pub mod market;
pub mod solver;

pub use engine::{BuyResult, LmsrLedger, Payout, QuoteQty, QuoteSpend, SettlementResult};
pub use market::{worst_case_loss, LmsrMarketState, Outcome, Prices};
pub use solver::solve_qty_for_spend;
