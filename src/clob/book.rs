//! Price-level-indexed order book: a sorted map per side plus a FIFO
//! queue per price level, backed by an order-id index (spec.md §9).
//!
//! `BTreeMap` gives O(log n) per-level insert/remove with iteration in
//! key order for free, so the best bid is simply the map's last entry and
//! the best ask its first — no `Reverse` wrapper needed (contrast
//! `examples/other_examples/49e8ec66_capn1marmota-hft-simulator__src-matching_engine.rs.rs`'s
//! `Reverse<Decimal>` bid keys, which exist only because that engine's
//! `bids` map lacks a double-ended iterator in its dependency version).
//! `VecDeque` gives O(1) FIFO append/pop per level.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;

use crate::clob::order::{LimitOrder, Side};

#[derive(Debug, Default)]
pub struct OrderBook {
    bids: BTreeMap<Decimal, VecDeque<String>>,
    asks: BTreeMap<Decimal, VecDeque<String>>,
    orders: HashMap<String, LimitOrder>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_map(&self, side: Side) -> &BTreeMap<Decimal, VecDeque<String>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, VecDeque<String>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Highest resting bid price, or `None` if the bid side is empty.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest resting ask price, or `None` if the ask side is empty.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        Some((self.best_bid()? + self.best_ask()?) / Decimal::TWO)
    }

    /// Sum of resting qty across the top `levels` price levels on `side`.
    pub fn depth(&self, side: Side, levels: usize) -> Decimal {
        let map = self.side_map(side);
        let prices: Box<dyn Iterator<Item = &Decimal>> = match side {
            Side::Buy => Box::new(map.keys().rev()),
            Side::Sell => Box::new(map.keys()),
        };
        prices
            .take(levels)
            .map(|price| {
                map.get(price)
                    .map(|queue| {
                        queue
                            .iter()
                            .filter_map(|id| self.orders.get(id))
                            .map(|order| order.qty)
                            .sum::<Decimal>()
                    })
                    .unwrap_or(Decimal::ZERO)
            })
            .sum()
    }

    /// Orders resting at `price` on `side`, in FIFO (timestamp) order.
    pub fn orders_at_price(&self, side: Side, price: Decimal) -> Vec<&LimitOrder> {
        self.side_map(side)
            .get(&price)
            .map(|queue| queue.iter().filter_map(|id| self.orders.get(id)).collect())
            .unwrap_or_default()
    }

    /// Best (FIFO head) resting order on `side`, if any.
    pub fn best_order(&self, side: Side) -> Option<&LimitOrder> {
        let price = match side {
            Side::Buy => self.best_bid()?,
            Side::Sell => self.best_ask()?,
        };
        let id = self.side_map(side).get(&price)?.front()?;
        self.orders.get(id)
    }

    pub fn get(&self, order_id: &str) -> Option<&LimitOrder> {
        self.orders.get(order_id)
    }

    pub fn get_mut(&mut self, order_id: &str) -> Option<&mut LimitOrder> {
        self.orders.get_mut(order_id)
    }

    /// Insert a brand-new resting order at the tail of its price level.
    pub fn insert_resting(&mut self, order: LimitOrder) {
        let side = order.side;
        let price = order.price;
        let id = order.order_id.clone();
        self.orders.insert(id.clone(), order);
        self.side_map_mut(side).entry(price).or_default().push_back(id);
    }

    /// Remove the FIFO head resting order fully filled by the matching
    /// loop. Removes the empty price level too, if this was the last
    /// order at that price.
    pub fn pop_filled_head(&mut self, side: Side, price: Decimal) {
        let map = self.side_map_mut(side);
        if let Some(queue) = map.get_mut(&price) {
            queue.pop_front();
            if queue.is_empty() {
                map.remove(&price);
            }
        }
    }

    /// Remove a resting order by id regardless of fill state (used by
    /// `cancelOrder` and by `settle`'s book-clearing step).
    pub fn remove(&mut self, order_id: &str) -> Option<LimitOrder> {
        let order = self.orders.remove(order_id)?;
        if let Some(queue) = self.side_map_mut(order.side).get_mut(&order.price) {
            queue.retain(|id| id != order_id);
            if queue.is_empty() {
                self.side_map_mut(order.side).remove(&order.price);
            }
        }
        Some(order)
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    /// All resting orders for `trader_id`, across both sides.
    pub fn open_orders_for(&self, trader_id: &str) -> Vec<&LimitOrder> {
        self.orders.values().filter(|order| order.trader_id == trader_id).collect()
    }

    /// `true` once neither side has a crossing order left, or one side is
    /// empty (spec.md §8 "uncrossed" invariant).
    pub fn is_uncrossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid <= ask,
            _ => true,
        }
    }

    /// Drop every resting order on both sides (used by `settle`).
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }
}
