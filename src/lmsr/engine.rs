//! `LmsrEngine`/`LmsrLedger`: the orchestration layer binding market state,
//! trader balances, trade IDs, and the event log into the method surface
//! spec.md §6 specifies (`initLedger`, `quoteQtyBuy`, `quoteSpendBuy`,
//! `executeBuy`, `executeBuySpend`, `worstCaseLoss`, `settle`).
//!
//! Grounded on `lmsr_api::update_market`/`resolve_event`'s control flow
//! (validate preconditions, compute the delta, apply it atomically, log,
//! return a result struct) with the teacher's `sqlx` transaction replaced
//! by plain `&mut self` mutation, since this crate owns no database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SolverConfig;
use crate::error::{EngineError, EngineResult};
use crate::ids::{IdGenerator, MonotonicClock};
use crate::ledger::{TraderAccount, TraderSeed, Traders};
use crate::logging::{EventKind, EventLog};
use crate::lmsr::market::{worst_case_loss, LmsrMarketState, Outcome, Prices};
use crate::lmsr::solver::solve_qty_for_spend;

/// `quoteQtyBuy` result (spec.md §4.2/§6): the payment a `qty`-sized buy
/// would cost at the current state, without mutating anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteQty {
    pub qty: Decimal,
    pub payment: Decimal,
    pub avg_price: Decimal,
    pub prices_before: Prices,
    pub prices_after: Prices,
}

/// `quoteSpendBuy` result (spec.md §4.2/§6): the qty a `spend`-dollar
/// budget converges on, without mutating anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSpend {
    pub qty: Decimal,
    pub spend: Decimal,
    pub avg_price: Decimal,
    pub prices_after: Prices,
}

/// Result of a single LMSR buy (spec.md §4.2 step 4 / §6
/// `executeBuy`/`executeBuySpend`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyResult {
    pub trade_id: String,
    pub trader_id: String,
    pub outcome: Outcome,
    pub qty: Decimal,
    pub payment: Decimal,
    pub avg_price: Decimal,
    pub prices_before: Prices,
    pub prices_after: Prices,
    pub new_trader_account: TraderAccount,
    pub timestamp: u64,
}

/// Per-trader payout produced by `settle` (spec.md §4.2 "settlement pays
/// `$1` per winning share, `$0` per losing share").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub trader_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub outcome: Outcome,
    pub payouts: Vec<Payout>,
    pub total_paid: Decimal,
    pub profit_loss: Decimal,
}

/// Everything one LMSR market needs: price state, trader balances, ID
/// generation, and an optional event log — a single value the caller
/// threads through every engine call, in place of the teacher's `PgPool`
/// handle.
#[derive(Debug)]
pub struct LmsrLedger {
    pub market: LmsrMarketState,
    pub traders: Traders,
    ids: IdGenerator,
    clock: MonotonicClock,
    pub log: Option<EventLog>,
}

impl LmsrLedger {
    pub fn init_ledger(seeds: Vec<TraderSeed>, b: Decimal) -> EngineResult<Self> {
        Ok(Self {
            market: LmsrMarketState::new(b)?,
            traders: Traders::new(seeds),
            ids: IdGenerator::new(),
            clock: MonotonicClock::new(),
            log: None,
        })
    }

    /// Attach an `EventLog` so state-changing calls record structured
    /// entries (spec.md §4.4: logging is optional, off by default).
    pub fn with_logging(mut self) -> Self {
        self.log = Some(EventLog::new());
        self
    }

    pub fn cost(&self) -> EngineResult<Decimal> {
        self.market.cost()
    }

    pub fn get_prices(&self) -> EngineResult<Prices> {
        self.market.prices()
    }

    pub fn worst_case_loss(&self) -> EngineResult<Decimal> {
        worst_case_loss(self.market.b)
    }

    /// Cost in dollars of buying `qty` shares of `outcome` at the current
    /// state, without mutating anything (spec.md §6 `quoteQtyBuy`).
    pub fn quote_qty_buy(&self, outcome: Outcome, qty: Decimal) -> EngineResult<QuoteQty> {
        if qty <= Decimal::ZERO {
            return Err(EngineError::NonPositiveQty(qty.to_string()));
        }
        if self.market.settled {
            return Err(EngineError::MarketSettled);
        }
        let prices_before = self.market.prices()?;
        let cost_before = self.market.cost()?;
        let cost_after = self.market.cost_after(outcome, qty)?;
        let payment = cost_after - cost_before;

        let mut hypothetical = self.market.clone();
        hypothetical.execute_delta(outcome, qty, payment);
        let prices_after = hypothetical.prices()?;

        Ok(QuoteQty { qty, payment, avg_price: payment / qty, prices_before, prices_after })
    }

    /// Maximum `qty` purchasable of `outcome` without exceeding `spend`
    /// dollars (spec.md §6 `quoteSpendBuy`).
    pub fn quote_spend_buy(
        &self,
        outcome: Outcome,
        spend: Decimal,
        config: &SolverConfig,
    ) -> EngineResult<QuoteSpend> {
        if self.market.settled {
            return Err(EngineError::MarketSettled);
        }
        let qty = solve_qty_for_spend(&self.market, outcome, spend, config)?;
        if qty <= Decimal::ZERO {
            return Ok(QuoteSpend { qty, spend, avg_price: Decimal::ZERO, prices_after: self.market.prices()? });
        }

        let cost_before = self.market.cost()?;
        let cost_after = self.market.cost_after(outcome, qty)?;
        let payment = cost_after - cost_before;

        let mut hypothetical = self.market.clone();
        hypothetical.execute_delta(outcome, qty, payment);
        let prices_after = hypothetical.prices()?;

        Ok(QuoteSpend { qty, spend, avg_price: payment / qty, prices_after })
    }

    /// Buy an exact quantity of `outcome` on behalf of `trader_id`
    /// (spec.md §6 `executeBuy`).
    pub fn execute_buy(
        &mut self,
        trader_id: &str,
        outcome: Outcome,
        qty: Decimal,
    ) -> EngineResult<BuyResult> {
        let quote = self.quote_qty_buy(outcome, qty)?;
        let payment = quote.payment;

        let account = self.traders.get(trader_id)?;
        if account.cash < payment {
            return Err(EngineError::InsufficientCash {
                have: account.cash.to_string(),
                need: payment.to_string(),
            });
        }

        self.market.execute_delta(outcome, qty, payment);
        let account = self.traders.get_mut(trader_id)?;
        account.cash -= payment;
        match outcome {
            Outcome::Yes => account.yes_shares += qty,
            Outcome::No => account.no_shares += qty,
        }
        let new_trader_account = account.clone();

        let trade_id = self.ids.next_trade_id();
        let timestamp = self.clock.tick();
        let prices_after = self.market.prices()?;

        if let Some(log) = self.log.as_mut() {
            log.record(
                EventKind::Trade,
                json!({
                    "tradeId": trade_id,
                    "traderId": trader_id,
                    "outcome": outcome.as_str(),
                    "qty": qty.to_string(),
                    "payment": payment.to_string(),
                }),
            );
        }
        tracing::debug!(trade_id = %trade_id, trader_id, outcome = outcome.as_str(), %qty, %payment, "lmsr buy executed");

        Ok(BuyResult {
            trade_id,
            trader_id: trader_id.to_string(),
            outcome,
            qty,
            payment,
            avg_price: quote.avg_price,
            prices_before: quote.prices_before,
            prices_after,
            new_trader_account,
            timestamp,
        })
    }

    /// Spend up to `spend` dollars buying `outcome`, executing whatever
    /// quantity the solver converges on (spec.md §6 `executeBuySpend`).
    pub fn execute_buy_spend(
        &mut self,
        trader_id: &str,
        outcome: Outcome,
        spend: Decimal,
        config: &SolverConfig,
    ) -> EngineResult<BuyResult> {
        let quote = self.quote_spend_buy(outcome, spend, config)?;
        if quote.qty <= Decimal::ZERO {
            return Err(EngineError::NoLiquidity);
        }
        self.execute_buy(trader_id, outcome, quote.qty)
    }

    /// Resolve the market to `outcome`, paying `$1` per winning share and
    /// `$0` per losing share to every trader, then zeroing all share
    /// balances (spec.md §4.2 `settle`).
    pub fn settle(&mut self, outcome: Outcome) -> EngineResult<SettlementResult> {
        if self.market.settled {
            return Err(EngineError::MarketSettled);
        }

        let mut payouts = Vec::new();
        let mut total_paid = Decimal::ZERO;
        for account in self.traders.iter_mut() {
            let winning_shares = match outcome {
                Outcome::Yes => account.yes_shares,
                Outcome::No => account.no_shares,
            };
            account.cash += winning_shares;
            total_paid += winning_shares;
            account.yes_shares = Decimal::ZERO;
            account.no_shares = Decimal::ZERO;
            payouts.push(Payout { trader_id: account.trader_id.clone(), amount: winning_shares });
        }

        let profit_loss = self.market.total_collected - total_paid;

        self.market.settled = true;
        self.market.outcome = Some(outcome);

        if let Some(log) = self.log.as_mut() {
            log.record(
                EventKind::MarketData,
                json!({
                    "event": "settled",
                    "outcome": outcome.as_str(),
                    "totalPaid": total_paid.to_string(),
                    "profitLoss": profit_loss.to_string(),
                }),
            );
        }
        tracing::info!(outcome = outcome.as_str(), %total_paid, %profit_loss, "lmsr market settled");

        Ok(SettlementResult { outcome, payouts, total_paid, profit_loss })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> LmsrLedger {
        LmsrLedger::init_ledger(
            vec![
                TraderSeed { id: "alice".into(), cash: dec!(1000) },
                TraderSeed { id: "bob".into(), cash: dec!(1000) },
            ],
            dec!(100),
        )
        .unwrap()
    }

    #[test]
    fn execute_buy_deducts_cash_and_credits_shares() {
        let mut ledger = ledger();
        let result = ledger.execute_buy("alice", Outcome::Yes, dec!(10)).unwrap();
        assert!(result.payment > Decimal::ZERO);

        let alice = ledger.traders.get("alice").unwrap();
        assert_eq!(alice.yes_shares, dec!(10));
        assert_eq!(alice.cash, dec!(1000) - result.payment);
    }

    #[test]
    fn execute_buy_rejects_insufficient_cash() {
        let mut ledger = LmsrLedger::init_ledger(
            vec![TraderSeed { id: "alice".into(), cash: dec!(1) }],
            dec!(100),
        )
        .unwrap();
        let result = ledger.execute_buy("alice", Outcome::Yes, dec!(10000));
        assert!(matches!(result, Err(EngineError::InsufficientCash { .. })));
    }

    #[test]
    fn execute_buy_reports_avg_price_and_prices_before() {
        let mut ledger = ledger();
        let prices_before = ledger.get_prices().unwrap();
        let result = ledger.execute_buy("alice", Outcome::Yes, dec!(10)).unwrap();

        assert_eq!(result.prices_before.p_yes, prices_before.p_yes);
        assert_eq!(result.avg_price, result.payment / dec!(10));
        assert!(result.prices_after.p_yes > result.prices_before.p_yes);
        assert_eq!(result.new_trader_account.yes_shares, dec!(10));
        assert_eq!(result.timestamp, 0);
    }

    #[test]
    fn execute_buy_unknown_trader_errors() {
        let mut ledger = ledger();
        assert!(ledger.execute_buy("carol", Outcome::Yes, dec!(1)).is_err());
    }

    #[test]
    fn execute_buy_spend_respects_budget() {
        let mut ledger = ledger();
        let config = SolverConfig::default();
        let before_cash = ledger.traders.get("alice").unwrap().cash;
        let result = ledger.execute_buy_spend("alice", Outcome::Yes, dec!(50), &config).unwrap();
        assert!(result.payment <= dec!(50));
        let after_cash = ledger.traders.get("alice").unwrap().cash;
        assert_eq!(after_cash, before_cash - result.payment);
    }

    /// S7 — PM-style settlement: winning shares pay $1, losing shares pay $0.
    #[test]
    fn settle_pays_winning_shares_and_zeroes_book() {
        let mut ledger = ledger();
        ledger.execute_buy("alice", Outcome::Yes, dec!(10)).unwrap();
        ledger.execute_buy("bob", Outcome::No, dec!(5)).unwrap();

        let cash_before_settle = ledger.traders.get("alice").unwrap().cash;
        let result = ledger.settle(Outcome::Yes).unwrap();
        assert_eq!(result.outcome, Outcome::Yes);

        let alice = ledger.traders.get("alice").unwrap();
        assert_eq!(alice.cash, cash_before_settle + dec!(10));
        assert_eq!(alice.yes_shares, Decimal::ZERO);

        let bob = ledger.traders.get("bob").unwrap();
        assert_eq!(bob.no_shares, Decimal::ZERO);

        assert!(ledger.settle(Outcome::No).is_err());
    }

    #[test]
    fn settle_reports_profit_loss() {
        let mut ledger = ledger();
        let r1 = ledger.execute_buy("alice", Outcome::Yes, dec!(10)).unwrap();
        let r2 = ledger.execute_buy("bob", Outcome::No, dec!(5)).unwrap();

        let result = ledger.settle(Outcome::Yes).unwrap();
        let expected = (r1.payment + r2.payment) - result.total_paid;
        assert_eq!(result.profit_loss, expected);
    }

    #[test]
    fn cash_conservation_across_buy_and_settle() {
        let mut ledger = ledger();
        let total_before = ledger.traders.total_cash();

        let r1 = ledger.execute_buy("alice", Outcome::Yes, dec!(10)).unwrap();
        let r2 = ledger.execute_buy("bob", Outcome::No, dec!(10)).unwrap();
        let collected = r1.payment + r2.payment;
        assert_eq!(ledger.traders.total_cash(), total_before - collected);

        // Settling pays out at most what was collected plus the market's
        // own worst-case-loss exposure; here we only assert it never
        // fabricates cash beyond collected + shares outstanding.
        let result = ledger.settle(Outcome::Yes).unwrap();
        assert_eq!(ledger.traders.total_cash(), total_before - collected + result.total_paid);
    }
}
