use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// Investor assumptions applied to every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Share of ARV an investor pays before repairs (the "70% rule").
    pub offer_margin: f64,
    /// Share of ARV used for the suggested wholesale cash offer (the "64% rule").
    pub wholesale_offer_pct: f64,
    pub holding_months: u32,
    pub owner_finance: FinancingTerms,
    pub land_contract: FinancingTerms,
    pub lease_option: LeaseOptionTerms,
    pub subject_to: SubjectToTerms,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            offer_margin: 0.70,
            wholesale_offer_pct: 0.64,
            holding_months: 4,
            owner_finance: FinancingTerms {
                down_payment_pct: 0.05,
                annual_rate: 0.05,
                term_months: 360,
                balloon_after_months: 300,
            },
            land_contract: FinancingTerms {
                down_payment_pct: 0.10,
                annual_rate: 0.045,
                term_months: 360,
                balloon_after_months: 300,
            },
            lease_option: LeaseOptionTerms {
                option_fee_pct: 0.03,
                monthly_credit: LeaseCredit::PercentOfRent(0.15),
                strike_pct_of_arv: 0.95,
                term_months: 36,
            },
            subject_to: SubjectToTerms {
                wholesale_fee_pct: 0.18,
            },
        }
    }
}

impl EvaluationConfig {
    /// Checks every setting up front so a bad deployment fails at startup.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.offer_margin > 0.0 && self.offer_margin <= 1.0) {
            return Err(ConfigurationError::new(
                "offer_margin",
                format!("expected a fraction in (0, 1], got {}", self.offer_margin),
            ));
        }
        check_fraction("wholesale_offer_pct", self.wholesale_offer_pct)?;
        self.owner_finance.validate("owner_finance")?;
        self.land_contract.validate("land_contract")?;

        check_fraction("lease_option.option_fee_pct", self.lease_option.option_fee_pct)?;
        check_fraction(
            "lease_option.strike_pct_of_arv",
            self.lease_option.strike_pct_of_arv,
        )?;
        match self.lease_option.monthly_credit {
            LeaseCredit::Fixed(amount) if !(amount >= 0.0 && amount.is_finite()) => {
                return Err(ConfigurationError::new(
                    "lease_option.monthly_credit",
                    format!("fixed credit must be a non-negative amount, got {amount}"),
                ));
            }
            LeaseCredit::PercentOfRent(pct) => {
                check_fraction("lease_option.monthly_credit", pct)?;
            }
            LeaseCredit::Fixed(_) => {}
        }

        check_fraction("subject_to.wholesale_fee_pct", self.subject_to.wholesale_fee_pct)
    }
}

/// Seller-financing terms shared by the owner-finance and land-contract exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    pub down_payment_pct: f64,
    pub annual_rate: f64,
    pub term_months: u32,
    pub balloon_after_months: u32,
}

impl FinancingTerms {
    fn validate(&self, prefix: &'static str) -> Result<(), ConfigurationError> {
        check_fraction(prefix, self.down_payment_pct)?;
        if !(self.annual_rate >= 0.0 && self.annual_rate.is_finite()) {
            return Err(ConfigurationError::new(
                prefix,
                format!("annual rate must be non-negative, got {}", self.annual_rate),
            ));
        }
        if self.term_months == 0 {
            return Err(ConfigurationError::new(
                prefix,
                "amortization term must be at least one month",
            ));
        }
        if self.balloon_after_months > self.term_months {
            return Err(ConfigurationError::new(
                prefix,
                format!(
                    "balloon after {} months exceeds the {} month term",
                    self.balloon_after_months, self.term_months
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseOptionTerms {
    /// Option fee as a share of ARV.
    pub option_fee_pct: f64,
    pub monthly_credit: LeaseCredit,
    pub strike_pct_of_arv: f64,
    pub term_months: u32,
}

/// Portion of each lease payment credited toward the purchase price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LeaseCredit {
    Fixed(f64),
    PercentOfRent(f64),
}

impl LeaseCredit {
    pub(crate) fn monthly(self, market_rent: f64) -> f64 {
        match self {
            LeaseCredit::Fixed(amount) => amount,
            LeaseCredit::PercentOfRent(pct) => market_rent * pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectToTerms {
    /// Share of the post-repair equity an end buyer pays as an assignment fee.
    pub wholesale_fee_pct: f64,
}

fn check_fraction(setting: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            setting,
            format!("expected a fraction between 0 and 1, got {value}"),
        ))
    }
}
