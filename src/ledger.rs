//! Shared trader/ledger vocabulary used by both the LMSR and CLOB engines.
//!
//! Grounded on the teacher's per-trader row shape (`users.rp_balance_ledger`,
//! `user_shares.yes_shares`/`no_shares` in `db_adapter.rs`), reshaped as a
//! plain in-memory struct since this crate owns no database: callers hold a
//! `Ledger`, pass it by `&mut` into an engine method, and get a result back.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A single trader's cash and share balances.
///
/// Invariant (spec.md §3): `cash >= 0`, `yes_shares >= 0`, `no_shares >= 0`
/// at all times outside of an atomic engine transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraderAccount {
    pub trader_id: String,
    pub cash: Decimal,
    pub yes_shares: Decimal,
    pub no_shares: Decimal,
}

impl TraderAccount {
    pub fn new(trader_id: impl Into<String>, cash: Decimal) -> Self {
        Self {
            trader_id: trader_id.into(),
            cash,
            yes_shares: Decimal::ZERO,
            no_shares: Decimal::ZERO,
        }
    }
}

/// Input to `init_ledger`: an opaque trader id plus starting cash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderSeed {
    pub id: String,
    pub cash: Decimal,
}

/// Generic container of traders shared by both engines' ledgers.
///
/// Traders are fixed at construction time (spec.md §3: "traders are not
/// added post-init").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traders {
    accounts: HashMap<String, TraderAccount>,
}

impl Traders {
    pub fn new(seeds: Vec<TraderSeed>) -> Self {
        let accounts = seeds
            .into_iter()
            .map(|seed| (seed.id.clone(), TraderAccount::new(seed.id, seed.cash)))
            .collect();
        Self { accounts }
    }

    pub fn get(&self, trader_id: &str) -> EngineResult<&TraderAccount> {
        self.accounts
            .get(trader_id)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    pub fn get_mut(&mut self, trader_id: &str) -> EngineResult<&mut TraderAccount> {
        self.accounts
            .get_mut(trader_id)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    pub fn contains(&self, trader_id: &str) -> bool {
        self.accounts.contains_key(trader_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraderAccount> {
        self.accounts.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TraderAccount> {
        self.accounts.values_mut()
    }

    pub fn total_cash(&self) -> Decimal {
        self.accounts.values().map(|a| a.cash).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unknown_trader_errors() {
        let traders = Traders::new(vec![TraderSeed { id: "alice".into(), cash: dec!(100) }]);
        assert!(traders.get("bob").is_err());
        assert!(traders.get("alice").is_ok());
    }

    #[test]
    fn total_cash_sums_all_traders() {
        let traders = Traders::new(vec![
            TraderSeed { id: "alice".into(), cash: dec!(100) },
            TraderSeed { id: "bob".into(), cash: dec!(250) },
        ]);
        assert_eq!(traders.total_cash(), dec!(350));
    }
}
