//! Runnable demonstration of both engines against an in-memory ledger.
//! Run with: cargo run --bin demo
//!
//! Replaces the teacher's `bin/stress_test.rs` (which stood up a Postgres
//! pool and ran `stress::run_stress_test` against it): the engines here
//! are synchronous and own no database, so the harness needs neither
//! `tokio` nor a connection string, only the same config-load-then-run
//! shape.

use anyhow::Result;
use rust_decimal_macros::dec;

use market_engine::clob::{ClobLedger, Side};
use market_engine::config::EngineConfig;
use market_engine::ledger::TraderSeed;
use market_engine::lmsr::{LmsrLedger, Outcome};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,market_engine=debug")
        .init();

    println!("Market Engine Demo");
    println!("==================\n");

    let config = EngineConfig::from_env();
    println!("Configuration loaded:");
    println!("  - Solver tolerance: {}", config.solver.cost_tolerance);
    println!("  - Solver max iterations: {}", config.solver.max_iterations);
    println!("  - Default liquidity b: {}\n", config.default_liquidity_b);

    run_lmsr_demo(&config)?;
    run_clob_demo()?;

    println!("\nDemo completed successfully.");
    Ok(())
}

fn run_lmsr_demo(config: &EngineConfig) -> Result<()> {
    println!("--- LMSR market ---");
    let mut ledger = LmsrLedger::init_ledger(
        vec![
            TraderSeed { id: "alice".to_string(), cash: dec!(1000) },
            TraderSeed { id: "bob".to_string(), cash: dec!(1000) },
        ],
        config.default_liquidity_b,
    )?
    .with_logging();

    println!("Initial prices: {:?}", ledger.get_prices()?);
    println!("Worst-case loss: {}", ledger.worst_case_loss()?);

    let buy = ledger.execute_buy("alice", Outcome::Yes, dec!(10))?;
    println!("Alice bought 10 YES for {} (trade {})", buy.payment, buy.trade_id);

    let spend_buy = ledger.execute_buy_spend("bob", Outcome::No, dec!(50), &config.solver)?;
    println!("Bob spent up to 50 on NO, got {} shares (trade {})", spend_buy.qty, spend_buy.trade_id);

    let settlement = ledger.settle(Outcome::Yes)?;
    println!("Settled YES. Total paid out: {}, profit/loss: {}", settlement.total_paid, settlement.profit_loss);
    Ok(())
}

fn run_clob_demo() -> Result<()> {
    println!("\n--- CLOB market ---");
    let mut ledger = ClobLedger::init_ledger(vec![
        TraderSeed { id: "alice".to_string(), cash: dec!(9900) },
        TraderSeed { id: "bob".to_string(), cash: dec!(10000) },
    ])
    .with_logging();
    ledger.traders.get_mut("alice")?.yes_shares = dec!(200);

    let sell = ledger.place_limit_order("alice", Side::Sell, dec!(0.60), dec!(100))?;
    println!("Alice resting sell: status {:?}", sell.status);

    let buy = ledger.place_limit_order("bob", Side::Buy, dec!(0.60), dec!(100))?;
    println!("Bob's buy matched {} trade(s) at avg price {:?}", buy.trades.len(), buy.avg_fill_price);

    let settlement = ledger.settle(Outcome::Yes)?;
    println!("Settled YES. Total payout: {}", settlement.total_payout);
    Ok(())
}
