//! Structural-precondition errors shared by both engines.
//!
//! Per spec.md §7: these represent bugs in the caller (unknown trader,
//! mutating a settled market, non-positive qty/spend) and must fail
//! loudly rather than silently no-op. Policy violations (insufficient
//! cash, insufficient shares, price out of range) are a CLOB-only
//! concept and are carried in `OrderResult::rejection_reason` instead of
//! this enum — see `crate::clob::order::OrderResult`.

use crate::decimal::DecimalError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown trader: {0}")]
    UnknownTrader(String),

    #[error("market already settled")]
    MarketSettled,

    #[error("quantity must be positive, got {0}")]
    NonPositiveQty(String),

    #[error("spend must be positive, got {0}")]
    NonPositiveSpend(String),

    #[error("insufficient cash: have {have}, need {need}")]
    InsufficientCash { have: String, need: String },

    #[error("market has no liquidity at this spend level")]
    NoLiquidity,

    #[error("liquidity parameter b must be positive")]
    InvalidLiquidity,

    #[error("order not found: {0}")]
    UnknownOrder(String),

    #[error("invalid outcome: {0}, expected \"YES\" or \"NO\"")]
    InvalidOutcome(String),

    #[error("decimal arithmetic error: {0}")]
    Decimal(#[from] DecimalError),

    #[error("solver failed to converge")]
    SolverDidNotConverge,
}

pub type EngineResult<T> = Result<T, EngineError>;
