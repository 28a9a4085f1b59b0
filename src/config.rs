//! Engine configuration: solver tolerances, iteration caps, default
//! liquidity presets.
//!
//! Grounded on `Config::from_env`/`validate` (env var parsing with
//! fallback to defaults, then a clamp-and-warn validation pass) — same
//! shape, different parameters, since this crate's knobs are the LMSR
//! solver's numerical behavior rather than the teacher's hold-period/Kelly
//! settings.

use std::env;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Convergence tolerance on cost error (spec.md §4.2: "≤ 1e-12").
    pub cost_tolerance: Decimal,
    /// Maximum bisection iterations (spec.md §9: "60 iterations").
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cost_tolerance: dec!(0.000000000001),
            max_iterations: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub solver: SolverConfig,
    /// Default liquidity parameter offered by presets/demos when the
    /// caller does not specify one.
    pub default_liquidity_b: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            default_liquidity_b: dec!(100),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("LMSR_SOLVER_COST_TOLERANCE") {
            match raw.parse::<Decimal>() {
                Ok(value) => config.solver.cost_tolerance = value,
                Err(_) => tracing::warn!(value = %raw, "invalid LMSR_SOLVER_COST_TOLERANCE, using default"),
            }
        }

        if let Ok(raw) = env::var("LMSR_SOLVER_MAX_ITERATIONS") {
            match raw.parse::<u32>() {
                Ok(value) => config.solver.max_iterations = value,
                Err(_) => tracing::warn!(value = %raw, "invalid LMSR_SOLVER_MAX_ITERATIONS, using default"),
            }
        }

        if let Ok(raw) = env::var("LMSR_DEFAULT_LIQUIDITY_B") {
            match raw.parse::<Decimal>() {
                Ok(value) => config.default_liquidity_b = value,
                Err(_) => tracing::warn!(value = %raw, "invalid LMSR_DEFAULT_LIQUIDITY_B, using default"),
            }
        }

        config.validate();
        config
    }

    fn validate(&mut self) {
        if self.solver.cost_tolerance <= Decimal::ZERO {
            tracing::warn!("cost_tolerance must be positive, using default");
            self.solver.cost_tolerance = SolverConfig::default().cost_tolerance;
        }
        if self.solver.max_iterations == 0 {
            tracing::warn!("max_iterations must be positive, using default");
            self.solver.max_iterations = SolverConfig::default().max_iterations;
        }
        if self.default_liquidity_b <= Decimal::ZERO {
            tracing::warn!("default_liquidity_b must be positive, using default");
            self.default_liquidity_b = EngineConfig::default().default_liquidity_b;
        }
    }
}
