use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::error::ValidationError;

/// Property facts supplied for a single evaluation. Absent amounts are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Facts {
    pub address: Option<String>,
    pub arv: f64,
    pub repairs: f64,
    pub monthly_taxes: f64,
    pub insurance: f64,
    pub cash_offer: f64,
    pub investor_cash_price: f64,
    pub reinstatement_amount: f64,
    pub cash_for_equity: f64,
    /// Expected monthly rent, used for lease-option credits.
    pub market_rent: f64,
    /// Seller's existing monthly principal and interest, used for subject-to.
    pub mortgage_payment: f64,
}

const ADDRESS_KEYS: &[&str] = &["address", "full_address"];
const ARV_KEYS: &[&str] = &["arv", "ARV", "arv_manual", "zestimate"];
const REPAIRS_KEYS: &[&str] = &["repairs", "repairs_flip", "real_repairs_flip", "Real Repairs (flip)"];
const MONTHLY_TAXES_KEYS: &[&str] = &["monthly_taxes", "Monthly Taxes"];
const INSURANCE_KEYS: &[&str] = &["insurance", "monthly_insurance", "Estimated Insurance"];
const CASH_OFFER_KEYS: &[&str] = &["cash_offer", "my_cash_offer"];
const INVESTOR_PRICE_KEYS: &[&str] = &["investor_cash_price"];
const REINSTATEMENT_KEYS: &[&str] = &["reinstatement_amount", "Reinstatement Amount"];
const CASH_FOR_EQUITY_KEYS: &[&str] = &["cash_for_equity", "Cash for Equity"];
const MARKET_RENT_KEYS: &[&str] = &["market_rent", "market_rent_est", "rent_zestimate"];
const MORTGAGE_PAYMENT_KEYS: &[&str] = &["mortgage_payment"];

impl Facts {
    /// Builds facts from a loosely typed JSON object, accepting legacy form aliases.
    ///
    /// `arv` and `repairs` must be numeric when present; other amounts that fail to
    /// parse are treated as zero.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let map = value
            .as_object()
            .ok_or_else(|| ValidationError::new("facts", "expected a JSON object"))?;

        Ok(Self {
            address: lookup(map, ADDRESS_KEYS)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string),
            arv: required_amount(map, "arv", ARV_KEYS)?,
            repairs: required_amount(map, "repairs", REPAIRS_KEYS)?,
            monthly_taxes: optional_amount(map, "monthly_taxes", MONTHLY_TAXES_KEYS),
            insurance: optional_amount(map, "insurance", INSURANCE_KEYS),
            cash_offer: optional_amount(map, "cash_offer", CASH_OFFER_KEYS),
            investor_cash_price: optional_amount(map, "investor_cash_price", INVESTOR_PRICE_KEYS),
            reinstatement_amount: optional_amount(map, "reinstatement_amount", REINSTATEMENT_KEYS),
            cash_for_equity: optional_amount(map, "cash_for_equity", CASH_FOR_EQUITY_KEYS),
            market_rent: optional_amount(map, "market_rent", MARKET_RENT_KEYS),
            mortgage_payment: optional_amount(map, "mortgage_payment", MORTGAGE_PAYMENT_KEYS),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        check_required("arv", self.arv)?;
        check_required("repairs", self.repairs)
    }

    /// Optional amounts with negative or non-finite values collapse to zero.
    pub(crate) fn sanitized(&self) -> Self {
        Self {
            address: self.address.clone(),
            arv: self.arv,
            repairs: self.repairs,
            monthly_taxes: non_negative(self.monthly_taxes),
            insurance: non_negative(self.insurance),
            cash_offer: non_negative(self.cash_offer),
            investor_cash_price: non_negative(self.investor_cash_price),
            reinstatement_amount: non_negative(self.reinstatement_amount),
            cash_for_equity: non_negative(self.cash_for_equity),
            market_rent: non_negative(self.market_rent),
            mortgage_payment: non_negative(self.mortgage_payment),
        }
    }
}

fn check_required(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    Ok(())
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn required_amount(
    map: &Map<String, Value>,
    field: &'static str,
    keys: &[&str],
) -> Result<f64, ValidationError> {
    let Some(value) = lookup(map, keys) else {
        return Ok(0.0);
    };
    let amount = parse_amount(value).map_err(|reason| ValidationError::new(field, reason))?;
    check_required(field, amount)?;
    Ok(amount)
}

fn optional_amount(map: &Map<String, Value>, field: &'static str, keys: &[&str]) -> f64 {
    let Some(value) = lookup(map, keys) else {
        return 0.0;
    };
    match parse_amount(value) {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
        Ok(amount) => {
            debug!(field, amount, "negative amount treated as zero");
            0.0
        }
        Err(reason) => {
            debug!(field, %reason, "unparseable amount treated as zero");
            0.0
        }
    }
}

/// Accepts JSON numbers and currency strings such as `"$218,000.50"`.
pub(crate) fn parse_amount(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| format!("{number} is out of range")),
        Value::String(raw) => {
            let cleaned: String = raw
                .trim()
                .chars()
                .filter(|ch| !matches!(ch, '$' | ',' | ' ' | '_'))
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| format!("expected a number, got {raw:?}"))
        }
        other => Err(format!("expected a number, got {other}")),
    }
}
