//! `ClobLedger`: order book + trader balances + settlement, bound together
//! behind the method surface spec.md §6 specifies.
//!
//! Matching loop grounded on
//! `examples/other_examples/49e8ec66_capn1marmota-hft-simulator__src-matching_engine.rs.rs`'s
//! `match_buy_order`/`match_sell_order` (walk price levels closest-to-best
//! first, drain FIFO heads, stop once the incoming order no longer
//! crosses), generalized to add the PM sell-to-close share check, the
//! buy-side cash reservation check, and $1/$0 settlement — none of which
//! that reference engine has, since it trades ordinary equities with no
//! settlement event.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{EngineError, EngineResult};
use crate::ids::{IdGenerator, MonotonicClock};
use crate::ledger::{TraderSeed, Traders};
use crate::logging::{EventKind, EventLog};
use crate::lmsr::market::Outcome;

use super::book::OrderBook;
use super::order::{LimitOrder, OrderResult, OrderStatus, Side, Trade};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderPayout {
    pub trader_id: String,
    pub initial_cash: Decimal,
    pub payout_received: Decimal,
    pub final_cash: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub outcome: Outcome,
    pub total_payout: Decimal,
    pub trader_payouts: Vec<TraderPayout>,
}

#[derive(Debug)]
pub struct ClobLedger {
    pub book: OrderBook,
    pub traders: Traders,
    initial_cash: HashMap<String, Decimal>,
    pub settled: bool,
    pub outcome: Option<Outcome>,
    ids: IdGenerator,
    clock: MonotonicClock,
    pub log: Option<EventLog>,
}

impl ClobLedger {
    pub fn init_ledger(seeds: Vec<TraderSeed>) -> Self {
        let initial_cash = seeds.iter().map(|seed| (seed.id.clone(), seed.cash)).collect();
        Self {
            book: OrderBook::new(),
            traders: Traders::new(seeds),
            initial_cash,
            settled: false,
            outcome: None,
            ids: IdGenerator::new(),
            clock: MonotonicClock::new(),
            log: None,
        }
    }

    pub fn with_logging(mut self) -> Self {
        self.log = Some(EventLog::new());
        self
    }

    /// `getAvailableShares` (spec.md §6): yes-shares not already reserved
    /// by this trader's own resting sell orders.
    pub fn get_available_shares(&self, trader_id: &str) -> EngineResult<Decimal> {
        let account = self.traders.get(trader_id)?;
        let reserved: Decimal = self
            .book
            .open_orders_for(trader_id)
            .into_iter()
            .filter(|order| order.side == Side::Sell)
            .map(|order| order.qty)
            .sum();
        Ok(account.yes_shares - reserved)
    }

    /// Cash already committed by this trader's other resting buy orders,
    /// mirroring `get_available_shares` on the sell side.
    fn reserved_buy_cash(&self, trader_id: &str) -> Decimal {
        self.book
            .open_orders_for(trader_id)
            .into_iter()
            .filter(|order| order.side == Side::Buy)
            .map(|order| order.price * order.qty)
            .sum()
    }

    pub fn get_trader_portfolio_value(
        &self,
        trader_id: &str,
        current_price: Decimal,
    ) -> EngineResult<Decimal> {
        let account = self.traders.get(trader_id)?;
        Ok(account.cash + account.yes_shares * current_price
            + account.no_shares * (Decimal::ONE - current_price))
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.best_bid()
    }
    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.best_ask()
    }
    pub fn spread(&self) -> Option<Decimal> {
        self.book.spread()
    }
    pub fn mid_price(&self) -> Option<Decimal> {
        self.book.mid_price()
    }
    pub fn get_depth(&self, side: Side, levels: usize) -> Decimal {
        self.book.depth(side, levels)
    }
    pub fn get_orders_at_price(&self, side: Side, price: Decimal) -> Vec<&LimitOrder> {
        self.book.orders_at_price(side, price)
    }
    pub fn get_open_orders(&self, trader_id: &str) -> Vec<&LimitOrder> {
        self.book.open_orders_for(trader_id)
    }

    fn rejected(trader_id: &str, side: Side, qty: Decimal, reason: impl Into<String>) -> OrderResult {
        OrderResult {
            order_id: String::new(),
            trader_id: trader_id.to_string(),
            side,
            status: OrderStatus::Rejected,
            filled_qty: Decimal::ZERO,
            remaining_qty: qty,
            avg_fill_price: None,
            trades: Vec::new(),
            rejection_reason: Some(reason.into()),
        }
    }

    fn validate_policy(&self, trader_id: &str, side: Side, price: Option<Decimal>, qty: Decimal) -> EngineResult<Option<String>> {
        if let Some(price) = price {
            if price <= Decimal::ZERO || price > Decimal::ONE {
                return Ok(Some("Price must be in (0, 1]".to_string()));
            }
        }
        if qty <= Decimal::ZERO {
            return Ok(Some("Quantity must be positive".to_string()));
        }

        match side {
            Side::Sell => {
                let available = self.get_available_shares(trader_id)?;
                if available < qty {
                    return Ok(Some(format!("Insufficient shares. Available: {available}")));
                }
            }
            Side::Buy => {
                if let Some(price) = price {
                    let account = self.traders.get(trader_id)?;
                    let available = account.cash - self.reserved_buy_cash(trader_id);
                    let required = price * qty;
                    if available < required {
                        return Ok(Some(format!("Insufficient cash. Available: {available}")));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Run the price-time-priority matching loop for an incoming order.
    /// `limit_price = None` means a market order (crosses at any price).
    fn match_incoming(
        &mut self,
        trader_id: &str,
        incoming_order_id: &str,
        side: Side,
        limit_price: Option<Decimal>,
        mut remaining: Decimal,
    ) -> EngineResult<(Vec<Trade>, Decimal)> {
        let opposite = match side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };

        let mut trades = Vec::new();

        loop {
            if remaining <= Decimal::ZERO {
                break;
            }
            let best = match opposite {
                Side::Sell => self.book.best_ask(),
                Side::Buy => self.book.best_bid(),
            };
            let Some(resting_price) = best else { break };

            let crosses = match (side, limit_price) {
                (Side::Buy, None) => true,
                (Side::Buy, Some(p)) => resting_price <= p,
                (Side::Sell, None) => true,
                (Side::Sell, Some(p)) => resting_price >= p,
            };
            if !crosses {
                break;
            }

            let resting_id = self
                .book
                .best_order(opposite)
                .map(|order| order.order_id.clone())
                .expect("best price level has at least one order");

            let resting_qty = self.book.get(&resting_id).expect("resting order exists").qty;
            let fill_qty = remaining.min(resting_qty);
            let price = resting_price;

            let (buy_trader, sell_trader, buy_order_id, sell_order_id) = match side {
                Side::Buy => (
                    trader_id.to_string(),
                    self.book.get(&resting_id).unwrap().trader_id.clone(),
                    incoming_order_id.to_string(),
                    resting_id.clone(),
                ),
                Side::Sell => (
                    self.book.get(&resting_id).unwrap().trader_id.clone(),
                    trader_id.to_string(),
                    resting_id.clone(),
                    incoming_order_id.to_string(),
                ),
            };

            {
                let buyer = self.traders.get_mut(&buy_trader)?;
                buyer.cash -= price * fill_qty;
                buyer.yes_shares += fill_qty;
            }
            {
                let seller = self.traders.get_mut(&sell_trader)?;
                seller.cash += price * fill_qty;
                seller.yes_shares -= fill_qty;
            }

            remaining -= fill_qty;
            {
                let resting = self.book.get_mut(&resting_id).expect("resting order exists");
                resting.qty -= fill_qty;
                resting.status = if resting.qty.is_zero() { OrderStatus::Filled } else { OrderStatus::PartiallyFilled };
            }
            if self.book.get(&resting_id).unwrap().qty.is_zero() {
                self.book.pop_filled_head(opposite, resting_price);
            }

            let trade_id = self.ids.next_trade_id();
            let timestamp = self.clock.tick();
            let trade = Trade {
                trade_id,
                buy_order_id,
                sell_order_id,
                buy_trader_id: buy_trader,
                sell_trader_id: sell_trader,
                price,
                qty: fill_qty,
                timestamp,
            };
            if let Some(log) = self.log.as_mut() {
                log.record(
                    EventKind::Trade,
                    json!({
                        "tradeId": trade.trade_id,
                        "price": price.to_string(),
                        "qty": fill_qty.to_string(),
                    }),
                );
            }
            tracing::debug!(price = %price, qty = %fill_qty, "clob trade executed");
            trades.push(trade);
        }

        Ok((trades, remaining))
    }

    fn avg_fill_price(trades: &[Trade]) -> Option<Decimal> {
        if trades.is_empty() {
            return None;
        }
        let total_qty: Decimal = trades.iter().map(|t| t.qty).sum();
        if total_qty.is_zero() {
            return None;
        }
        let weighted: Decimal = trades.iter().map(|t| t.price * t.qty).sum();
        Some(weighted / total_qty)
    }

    pub fn place_limit_order(
        &mut self,
        trader_id: &str,
        side: Side,
        price: Decimal,
        qty: Decimal,
    ) -> EngineResult<OrderResult> {
        self.traders.get(trader_id)?;
        if self.settled {
            return Err(EngineError::MarketSettled);
        }

        if let Some(reason) = self.validate_policy(trader_id, side, Some(price), qty)? {
            return Ok(Self::rejected(trader_id, side, qty, reason));
        }

        let order_id = self.ids.next_order_id();
        let (trades, remaining) = self.match_incoming(trader_id, &order_id, side, Some(price), qty)?;
        let filled = qty - remaining;

        let status = if remaining.is_zero() {
            OrderStatus::Filled
        } else if filled > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        };

        if remaining > Decimal::ZERO {
            let timestamp = self.clock.tick();
            self.book.insert_resting(LimitOrder {
                order_id: order_id.clone(),
                trader_id: trader_id.to_string(),
                side,
                price,
                qty: remaining,
                original_qty: qty,
                timestamp,
                status,
            });
            if let Some(log) = self.log.as_mut() {
                log.record(EventKind::OrderPlaced, json!({"orderId": order_id, "remaining": remaining.to_string()}));
            }
        }

        Ok(OrderResult {
            order_id,
            trader_id: trader_id.to_string(),
            side,
            status,
            filled_qty: filled,
            remaining_qty: remaining,
            avg_fill_price: Self::avg_fill_price(&trades),
            trades,
            rejection_reason: None,
        })
    }

    pub fn place_market_order(
        &mut self,
        trader_id: &str,
        side: Side,
        qty: Decimal,
    ) -> EngineResult<OrderResult> {
        self.traders.get(trader_id)?;
        if self.settled {
            return Err(EngineError::MarketSettled);
        }

        if let Some(reason) = self.validate_policy(trader_id, side, None, qty)? {
            return Ok(Self::rejected(trader_id, side, qty, reason));
        }

        let order_id = self.ids.next_order_id();
        let (trades, remaining) = self.match_incoming(trader_id, &order_id, side, None, qty)?;
        let filled = qty - remaining;
        let status = if remaining.is_zero() { OrderStatus::Filled } else { OrderStatus::PartiallyFilled };

        Ok(OrderResult {
            order_id,
            trader_id: trader_id.to_string(),
            side,
            status,
            filled_qty: filled,
            remaining_qty: remaining,
            avg_fill_price: Self::avg_fill_price(&trades),
            trades,
            rejection_reason: None,
        })
    }

    /// `cancelOrder` (spec.md §4.3): idempotent soft-cancel for unknown
    /// ids, `Err` only for cancellation on a settled market.
    pub fn cancel_order(&mut self, order_id: &str) -> EngineResult<OrderResult> {
        if self.settled {
            return Err(EngineError::MarketSettled);
        }

        let Some(order) = self.book.remove(order_id) else {
            return Ok(OrderResult {
                order_id: order_id.to_string(),
                trader_id: String::new(),
                side: Side::Buy,
                status: OrderStatus::Cancelled,
                filled_qty: Decimal::ZERO,
                remaining_qty: Decimal::ZERO,
                avg_fill_price: None,
                trades: Vec::new(),
                rejection_reason: None,
            });
        };

        if let Some(log) = self.log.as_mut() {
            log.record(EventKind::OrderCancelled, json!({"orderId": order_id}));
        }
        tracing::debug!(order_id, "clob order cancelled");

        Ok(OrderResult {
            order_id: order.order_id,
            trader_id: order.trader_id,
            side: order.side,
            status: OrderStatus::Cancelled,
            filled_qty: order.filled_qty(),
            remaining_qty: order.qty,
            avg_fill_price: None,
            trades: Vec::new(),
            rejection_reason: None,
        })
    }

    fn payouts_for(&self, outcome: Outcome) -> Vec<TraderPayout> {
        self.traders
            .iter()
            .map(|account| {
                let payout = match outcome {
                    Outcome::Yes => account.yes_shares,
                    Outcome::No => account.no_shares,
                };
                let initial_cash = *self.initial_cash.get(&account.trader_id).unwrap_or(&Decimal::ZERO);
                TraderPayout {
                    trader_id: account.trader_id.clone(),
                    initial_cash,
                    payout_received: payout,
                    final_cash: account.cash + payout,
                    net_profit: payout,
                }
            })
            .collect()
    }

    /// `getSettlementPreview` (spec.md §4.3): same payout computation as
    /// `settle`, for both outcomes, without mutating ledger state.
    pub fn get_settlement_preview(&self) -> HashMap<Outcome, Vec<TraderPayout>> {
        let mut map = HashMap::new();
        map.insert(Outcome::Yes, self.payouts_for(Outcome::Yes));
        map.insert(Outcome::No, self.payouts_for(Outcome::No));
        map
    }

    pub fn settle(&mut self, outcome: Outcome) -> EngineResult<SettlementResult> {
        if self.settled {
            return Err(EngineError::MarketSettled);
        }

        let payouts = self.payouts_for(outcome);
        let total_payout: Decimal = payouts.iter().map(|p| p.payout_received).sum();

        self.book.clear();
        for account in self.traders.iter_mut() {
            let payout = match outcome {
                Outcome::Yes => account.yes_shares,
                Outcome::No => account.no_shares,
            };
            account.cash += payout;
            account.yes_shares = Decimal::ZERO;
            account.no_shares = Decimal::ZERO;
        }
        self.settled = true;
        self.outcome = Some(outcome);

        if let Some(log) = self.log.as_mut() {
            log.record(EventKind::MarketData, json!({"event": "settled", "outcome": outcome.as_str(), "totalPayout": total_payout.to_string()}));
        }
        tracing::info!(outcome = outcome.as_str(), %total_payout, "clob market settled");

        Ok(SettlementResult { outcome, total_payout, trader_payouts: payouts })
    }
}
