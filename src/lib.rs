//! Binary LMSR market maker and prediction-market CLOB matching engine.
//!
//! Two independent engines — [`lmsr`] and [`clob`] — share the
//! [`ledger`] trader vocabulary, a [`decimal`] kernel for exact
//! accounting, and the [`logging`] event log. Neither engine does any
//! I/O; callers own a ledger value and serialize calls to it themselves.

pub mod clob;
pub mod config;
pub mod decimal;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod lmsr;
pub mod logging;
