//! Deal evaluation: maximum allowable offer plus one projection per exit strategy.

mod amortization;
mod config;
mod error;
mod exits;
mod facts;
mod offer;

pub use amortization::{monthly_payment, remaining_balance, AmortizedLoan};
pub use config::{EvaluationConfig, FinancingTerms, LeaseCredit, LeaseOptionTerms, SubjectToTerms};
pub use error::{ConfigurationError, EvaluationError, ValidationError};
pub use exits::{
    ExitProjections, ExitStrategy, FinancedExit, FlipExit, LeaseOptionExit, SubjectToExit,
    WholesaleExit,
};
pub use facts::Facts;
pub use offer::{initial_offer, InitialOffer};

use serde::Serialize;
use serde_json::Value;

/// Stateless evaluator that applies investor assumptions to property facts.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn evaluate(&self, facts: &Facts) -> Result<EvaluationResult, EvaluationError> {
        facts.validate()?;
        let facts = facts.sanitized();

        let base = self.base_valuation(&facts);
        let exits = exits::project_all(&facts, &base, &self.config)?;

        Ok(EvaluationResult { base, exits })
    }

    /// Parses loosely typed facts before evaluating them.
    pub fn evaluate_json(&self, facts: &Value) -> Result<EvaluationResult, EvaluationError> {
        let facts = Facts::from_json(facts)?;
        self.evaluate(&facts)
    }

    fn base_valuation(&self, facts: &Facts) -> BaseValuation {
        let discounted_arv = facts.arv * self.config.offer_margin;
        let suggested = facts.arv * self.config.wholesale_offer_pct - facts.repairs;

        BaseValuation {
            arv: round_currency(facts.arv),
            repairs: round_currency(facts.repairs),
            offer_margin: self.config.offer_margin,
            discounted_arv: round_currency(discounted_arv),
            // Repairs beyond the discounted ARV mean there is no offer to make.
            mao: round_currency((discounted_arv - facts.repairs).max(0.0)),
            suggested_cash_offer: round_currency(suggested.max(0.0)),
        }
    }
}

/// MAO and the figures it is derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseValuation {
    pub arv: f64,
    pub repairs: f64,
    pub offer_margin: f64,
    pub discounted_arv: f64,
    pub mao: f64,
    pub suggested_cash_offer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub base: BaseValuation,
    pub exits: ExitProjections,
}

pub(crate) fn round_currency(amount: f64) -> f64 {
    amount.round()
}
