use serde::{Deserialize, Serialize};

use super::amortization::amortize;
use super::config::{EvaluationConfig, FinancingTerms};
use super::error::ConfigurationError;
use super::facts::Facts;
use super::{round_currency, BaseValuation};

/// Monetization plans reported for every evaluated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStrategy {
    Wholesale,
    Flip,
    OwnerFinance,
    LeaseOption,
    SubjectTo,
    LandContract,
}

impl ExitStrategy {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Wholesale,
            Self::Flip,
            Self::OwnerFinance,
            Self::LeaseOption,
            Self::SubjectTo,
            Self::LandContract,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Wholesale => "Wholesale",
            Self::Flip => "Flip",
            Self::OwnerFinance => "Owner Finance",
            Self::LeaseOption => "Lease Option",
            Self::SubjectTo => "Subject To",
            Self::LandContract => "Land Contract",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WholesaleExit {
    pub assignment_fee: f64,
    pub net_to_seller: f64,
    /// Whether the cash offer sits at or below the maximum allowable offer.
    pub offer_within_mao: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlipExit {
    pub holding_months: u32,
    pub holding_costs: f64,
    /// Negative when the numbers describe a loss.
    pub profit: f64,
    pub profit_at_mao: f64,
    pub required_capital: f64,
}

/// Seller-financed sale; used for both owner finance and land contracts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancedExit {
    pub price: f64,
    pub down_payment: f64,
    pub amount_financed: f64,
    pub annual_rate: f64,
    pub term_months: u32,
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub balloon_after_months: u32,
    pub balloon_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaseOptionExit {
    pub option_fee: f64,
    pub strike_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<f64>,
    pub monthly_credit: f64,
    pub term_months: u32,
    pub total_credits: f64,
    pub cash_needed_on_exercise: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectToExit {
    pub cash_to_seller: f64,
    pub upfront_cash: f64,
    pub monthly_obligation: f64,
    pub potential_wholesale_fee: f64,
}

/// One projection per exit strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitProjections {
    pub wholesale: WholesaleExit,
    pub flip: FlipExit,
    pub owner_finance: FinancedExit,
    pub lease_option: LeaseOptionExit,
    pub subject_to: SubjectToExit,
    pub land_contract: FinancedExit,
}

pub(crate) fn project_all(
    facts: &Facts,
    base: &BaseValuation,
    config: &EvaluationConfig,
) -> Result<ExitProjections, ConfigurationError> {
    Ok(ExitProjections {
        wholesale: wholesale(facts, base),
        flip: flip(facts, base, config.holding_months),
        owner_finance: financed(facts.arv, &config.owner_finance)?,
        lease_option: lease_option(facts, config),
        subject_to: subject_to(facts, config.subject_to.wholesale_fee_pct),
        land_contract: financed(facts.arv, &config.land_contract)?,
    })
}

fn wholesale(facts: &Facts, base: &BaseValuation) -> WholesaleExit {
    WholesaleExit {
        assignment_fee: round_currency((facts.investor_cash_price - facts.cash_offer).max(0.0)),
        net_to_seller: round_currency(facts.cash_offer),
        offer_within_mao: facts.cash_offer <= base.mao,
    }
}

fn flip(facts: &Facts, base: &BaseValuation, holding_months: u32) -> FlipExit {
    let holding_costs = (facts.monthly_taxes + facts.insurance) * f64::from(holding_months);
    let before_purchase = facts.arv - facts.repairs - holding_costs;

    FlipExit {
        holding_months,
        holding_costs: round_currency(holding_costs),
        profit: round_currency(before_purchase - facts.cash_offer),
        profit_at_mao: round_currency(before_purchase - base.mao),
        required_capital: round_currency(facts.cash_offer + facts.repairs),
    }
}

fn financed(price: f64, terms: &FinancingTerms) -> Result<FinancedExit, ConfigurationError> {
    let down_payment = price * terms.down_payment_pct;
    let loan = amortize(price - down_payment, terms)?;

    Ok(FinancedExit {
        price: round_currency(price),
        down_payment: round_currency(down_payment),
        amount_financed: round_currency(loan.principal),
        annual_rate: terms.annual_rate,
        term_months: terms.term_months,
        monthly_payment: round_currency(loan.monthly_payment),
        total_interest: round_currency(loan.total_interest),
        balloon_after_months: terms.balloon_after_months,
        balloon_balance: round_currency(loan.balloon_balance),
    })
}

fn lease_option(facts: &Facts, config: &EvaluationConfig) -> LeaseOptionExit {
    let terms = &config.lease_option;
    let option_fee = facts.arv * terms.option_fee_pct;
    let strike_price = facts.arv * terms.strike_pct_of_arv - facts.repairs;
    let monthly_credit = terms.monthly_credit.monthly(facts.market_rent);
    let total_credits = monthly_credit * f64::from(terms.term_months);

    LeaseOptionExit {
        option_fee: round_currency(option_fee),
        strike_price: round_currency(strike_price),
        monthly_rent: (facts.market_rent > 0.0).then(|| round_currency(facts.market_rent)),
        monthly_credit: round_currency(monthly_credit),
        term_months: terms.term_months,
        total_credits: round_currency(total_credits),
        cash_needed_on_exercise: round_currency(
            (strike_price - option_fee - total_credits).max(0.0),
        ),
    }
}

fn subject_to(facts: &Facts, fee_pct: f64) -> SubjectToExit {
    let upfront_cash = facts.reinstatement_amount + facts.cash_for_equity;
    let equity = facts.arv - facts.repairs;

    SubjectToExit {
        cash_to_seller: round_currency(facts.cash_for_equity),
        upfront_cash: round_currency(upfront_cash),
        monthly_obligation: round_currency(
            facts.mortgage_payment + facts.monthly_taxes + facts.insurance,
        ),
        potential_wholesale_fee: round_currency(equity * fee_pct - upfront_cash),
    }
}
