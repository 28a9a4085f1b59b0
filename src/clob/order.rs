//! CLOB order/trade vocabulary (spec.md §3 `LimitOrder`/`Trade`).
//!
//! Shaped directly on the pack's order-book type references —
//! `examples/other_examples/1c3bc894_Ash20pk-near-market__orderbook-service-src-types.rs.rs`'s
//! `Order`/`OrderSide`/`OrderStatus` and
//! `examples/other_examples/6ab8c335_aMarketology-blackBook-ledger-rust__src-orderbook-orders.rs.rs`'s
//! `Side`/`LimitOrder` — generalized to the PM sell-to-close model this
//! engine trades under (one book, one implicit outcome token: YES).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

/// A resting or just-submitted limit order. `qty` is always the
/// *remaining* quantity; `original_qty` never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    pub order_id: String,
    pub trader_id: String,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    pub original_qty: Decimal,
    /// Strictly monotonic per-engine logical timestamp (spec.md §9), used
    /// for FIFO tie-breaking within a price level — not wall-clock.
    pub timestamp: u64,
    pub status: OrderStatus,
}

impl LimitOrder {
    pub fn filled_qty(&self) -> Decimal {
        self.original_qty - self.qty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buy_trader_id: String,
    pub sell_trader_id: String,
    pub price: Decimal,
    pub qty: Decimal,
    pub timestamp: u64,
}

/// Result of `placeLimitOrder`/`placeMarketOrder`/`cancelOrder` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub trader_id: String,
    pub side: Side,
    pub status: OrderStatus,
    pub filled_qty: Decimal,
    pub remaining_qty: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub trades: Vec<Trade>,
    pub rejection_reason: Option<String>,
}
