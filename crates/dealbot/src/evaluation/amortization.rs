use serde::Serialize;

use super::config::FinancingTerms;
use super::error::ConfigurationError;

/// Fixed-rate payment: `P·r / (1 − (1+r)^−n)`, or `P / n` for a zero rate.
pub fn monthly_payment(
    principal: f64,
    monthly_rate: f64,
    term_months: u32,
) -> Result<f64, ConfigurationError> {
    if term_months == 0 {
        return Err(ConfigurationError::new(
            "term_months",
            "amortization term must be at least one month",
        ));
    }

    let n = f64::from(term_months);
    if monthly_rate == 0.0 {
        return Ok(principal / n);
    }

    Ok(principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-n)))
}

/// Balance left after `payments_made` scheduled payments, never below zero.
pub fn remaining_balance(
    principal: f64,
    monthly_rate: f64,
    term_months: u32,
    payments_made: u32,
) -> Result<f64, ConfigurationError> {
    let payment = monthly_payment(principal, monthly_rate, term_months)?;
    let k = f64::from(payments_made.min(term_months));

    let balance = if monthly_rate == 0.0 {
        principal - payment * k
    } else {
        let growth = (1.0 + monthly_rate).powf(k);
        principal * growth - payment * (growth - 1.0) / monthly_rate
    };

    Ok(balance.max(0.0))
}

/// Amortized view of a seller-financed note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizedLoan {
    pub principal: f64,
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub balloon_balance: f64,
}

pub(crate) fn amortize(
    principal: f64,
    terms: &FinancingTerms,
) -> Result<AmortizedLoan, ConfigurationError> {
    let rate = terms.annual_rate / 12.0;
    let payment = monthly_payment(principal, rate, terms.term_months)?;
    let balloon_balance = remaining_balance(
        principal,
        rate,
        terms.term_months,
        terms.balloon_after_months,
    )?;

    Ok(AmortizedLoan {
        principal,
        monthly_payment: payment,
        total_interest: payment * f64::from(terms.term_months) - principal,
        balloon_balance,
    })
}
