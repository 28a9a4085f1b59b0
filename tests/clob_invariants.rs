//! Quantified CLOB invariants (spec.md §8): FIFO ordering, uncrossed
//! book, cash/share conservation, non-negative balances, determinism.
//! Grounded on the same proptest discipline as
//! `lmsr_core::tests::round_trip_is_zero_cost`, applied here to random
//! sequences of limit orders against a freshly seeded book.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use market_engine::clob::{ClobLedger, Side};
use market_engine::ledger::TraderSeed;

fn seeded_ledger() -> ClobLedger {
    let mut ledger = ClobLedger::init_ledger(vec![
        TraderSeed { id: "alice".into(), cash: dec!(100000) },
        TraderSeed { id: "bob".into(), cash: dec!(100000) },
        TraderSeed { id: "carol".into(), cash: dec!(100000) },
    ]);
    ledger.traders.get_mut("alice").unwrap().yes_shares = dec!(500);
    ledger.traders.get_mut("bob").unwrap().yes_shares = dec!(500);
    ledger.traders.get_mut("carol").unwrap().yes_shares = dec!(500);
    ledger
}

fn trader_for(i: usize) -> &'static str {
    match i % 3 {
        0 => "alice",
        1 => "bob",
        _ => "carol",
    }
}

proptest! {
    /// Uncrossed book + non-negative balances hold after any sequence of
    /// limit orders, regardless of side/price/qty chosen.
    #[test]
    fn uncrossed_and_nonnegative_after_order_sequence(
        sides in prop::collection::vec(0u8..=1u8, 1..20),
        prices in prop::collection::vec(1u32..=99u32, 1..20),
        qtys in prop::collection::vec(1.0f64..10.0, 1..20),
    ) {
        let mut ledger = seeded_ledger();
        let n = sides.len().min(prices.len()).min(qtys.len());
        for i in 0..n {
            let side = if sides[i] == 0 { Side::Buy } else { Side::Sell };
            let price = Decimal::new(prices[i] as i64, 2);
            let qty = Decimal::try_from(qtys[i]).unwrap();
            let trader = trader_for(i);
            let _ = ledger.place_limit_order(trader, side, price, qty);

            prop_assert!(ledger.book.is_uncrossed());
            for account in ledger.traders.iter() {
                prop_assert!(account.cash >= Decimal::ZERO);
                prop_assert!(account.yes_shares >= Decimal::ZERO);
                prop_assert!(account.no_shares >= Decimal::ZERO);
            }
        }
    }

    /// Cash and share conservation across any sequence of limit orders
    /// that only trade, never settle.
    #[test]
    fn cash_and_shares_conserved(
        sides in prop::collection::vec(0u8..=1u8, 1..20),
        prices in prop::collection::vec(1u32..=99u32, 1..20),
        qtys in prop::collection::vec(1.0f64..10.0, 1..20),
    ) {
        let mut ledger = seeded_ledger();
        let cash_before = ledger.traders.total_cash();
        let shares_before: Decimal = ledger.traders.iter().map(|a| a.yes_shares + a.no_shares).sum();

        let n = sides.len().min(prices.len()).min(qtys.len());
        for i in 0..n {
            let side = if sides[i] == 0 { Side::Buy } else { Side::Sell };
            let price = Decimal::new(prices[i] as i64, 2);
            let qty = Decimal::try_from(qtys[i]).unwrap();
            let _ = ledger.place_limit_order(trader_for(i), side, price, qty);
        }

        let cash_after = ledger.traders.total_cash();
        let shares_after: Decimal = ledger.traders.iter().map(|a| a.yes_shares + a.no_shares).sum();
        prop_assert_eq!(cash_before, cash_after);
        prop_assert_eq!(shares_before, shares_after);
    }
}

/// FIFO: two orders at the same price from different traders fill in
/// submission order.
#[test]
fn fifo_within_a_price_level() {
    let mut ledger = seeded_ledger();
    ledger.place_limit_order("alice", Side::Sell, dec!(0.5), dec!(5)).unwrap();
    ledger.place_limit_order("bob", Side::Sell, dec!(0.5), dec!(5)).unwrap();

    let result = ledger.place_limit_order("carol", Side::Buy, dec!(0.5), dec!(6)).unwrap();
    assert_eq!(result.trades[0].sell_trader_id, "alice");
    assert_eq!(result.trades[1].sell_trader_id, "bob");
}

/// Determinism: two ledgers given the same call sequence end up in the
/// same state with the same trade/order ids.
#[test]
fn deterministic_given_same_sequence() {
    let mut a = seeded_ledger();
    let mut b = seeded_ledger();

    let ops: Vec<(&str, Side, Decimal, Decimal)> = vec![
        ("alice", Side::Sell, dec!(0.5), dec!(5)),
        ("bob", Side::Sell, dec!(0.55), dec!(3)),
        ("carol", Side::Buy, dec!(0.6), dec!(4)),
    ];

    for (trader, side, price, qty) in &ops {
        let ra = a.place_limit_order(trader, *side, *price, *qty).unwrap();
        let rb = b.place_limit_order(trader, *side, *price, *qty).unwrap();
        assert_eq!(ra.order_id, rb.order_id);
        assert_eq!(ra.status, rb.status);
        assert_eq!(ra.trades.len(), rb.trades.len());
    }

    assert_eq!(a.traders.total_cash(), b.traders.total_cash());
}
