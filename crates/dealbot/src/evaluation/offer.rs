use serde::{Deserialize, Serialize};

use super::round_currency;

const DEFAULT_CONDITION: u8 = 7;
/// Repair allowance per condition point below a perfect 10, as a share of ARV.
const REPAIR_RATE_PER_POINT: f64 = 0.045;

/// Automatic first cash offer derived from the seller-stated condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialOffer {
    pub arv: f64,
    pub condition: u8,
    pub repairs: f64,
    pub cash_offer: f64,
}

/// Returns `None` unless the ARV is a positive amount.
pub fn initial_offer(arv: f64, condition: Option<u8>) -> Option<InitialOffer> {
    if !(arv.is_finite() && arv > 0.0) {
        return None;
    }

    let condition = condition.unwrap_or(DEFAULT_CONDITION).clamp(1, 10);
    let repairs = f64::from(10 - condition) * REPAIR_RATE_PER_POINT * arv;

    Some(InitialOffer {
        arv: round_currency(arv),
        condition,
        repairs: round_currency(repairs),
        cash_offer: round_currency(arv - repairs),
    })
}
