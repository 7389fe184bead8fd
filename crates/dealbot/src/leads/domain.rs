use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::evaluation::InitialOffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub u64);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage of a seller lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    NewLead,
    Contacted,
    AppointmentSet,
    OfferMade,
    UnderContract,
    Closed,
    Dead,
}

impl LeadStatus {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::NewLead,
            Self::Contacted,
            Self::AppointmentSet,
            Self::OfferMade,
            Self::UnderContract,
            Self::Closed,
            Self::Dead,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NewLead => "New Lead",
            Self::Contacted => "Contacted",
            Self::AppointmentSet => "Appointment Set",
            Self::OfferMade => "Offer Made",
            Self::UnderContract => "Under Contract",
            Self::Closed => "Closed",
            Self::Dead => "Dead",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = LeadValidationError;

    /// Accepts either the display label or the snake_case key.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::ordered()
            .into_iter()
            .find(|status| status.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| LeadValidationError::UnknownStatus(value.trim().to_string()))
    }
}

/// Seller lead as stored by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub condition: Option<u8>,
    pub asking_price: Option<String>,
    pub occupancy_status: Option<String>,
    pub timeline: Option<String>,
    pub reason: Option<String>,
    pub lead_source: String,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub arv: Option<f64>,
    pub initial_offer: Option<InitialOffer>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    /// Case-insensitive match across the searchable contact columns.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        [
            Some(self.first_name.as_str()),
            self.last_name.as_deref(),
            Some(self.phone.as_str()),
            self.email.as_deref(),
            self.address.as_deref(),
            Some(self.lead_source.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_ascii_lowercase().contains(&needle))
    }
}

/// Inbound lead payload from the API or intake forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default, alias = "seller_first_name")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "seller_last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub condition: Option<u8>,
    #[serde(default)]
    pub asking_price: Option<String>,
    #[serde(default)]
    pub occupancy_status: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "source")]
    pub lead_source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub arv: Option<f64>,
}

/// Lead fields after validation, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedLead {
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub condition: Option<u8>,
    pub asking_price: Option<String>,
    pub occupancy_status: Option<String>,
    pub timeline: Option<String>,
    pub reason: Option<String>,
    pub lead_source: String,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub arv: Option<f64>,
}

impl LeadSubmission {
    pub(crate) fn validate(self) -> Result<ValidatedLead, LeadValidationError> {
        let first_name = clean(self.first_name)
            .or_else(|| clean(self.name))
            .ok_or(LeadValidationError::MissingField("name"))?;
        let phone = clean(self.phone).ok_or(LeadValidationError::MissingField("phone"))?;

        let email = clean(self.email);
        if let Some(address) = &email {
            if !address.contains('@') {
                return Err(LeadValidationError::InvalidEmail(address.clone()));
            }
        }

        if let Some(condition) = self.condition {
            if !(1..=10).contains(&condition) {
                return Err(LeadValidationError::ConditionOutOfRange(condition));
            }
        }

        let status = match clean(self.status) {
            Some(raw) => raw.parse()?,
            None => LeadStatus::NewLead,
        };

        let arv = match self.arv {
            Some(value) if !(value.is_finite() && value >= 0.0) => {
                return Err(LeadValidationError::InvalidArv(value));
            }
            other => other,
        };

        Ok(ValidatedLead {
            first_name,
            last_name: clean(self.last_name),
            phone,
            email,
            address: clean(self.address),
            condition: self.condition,
            asking_price: clean(self.asking_price),
            occupancy_status: clean(self.occupancy_status),
            timeline: clean(self.timeline),
            reason: clean(self.reason),
            lead_source: clean(self.lead_source).unwrap_or_else(|| "API".to_string()),
            status,
            notes: clean(self.notes),
            arv,
        })
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Pipeline move requested for an existing lead.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadStatusUpdate {
    pub status: String,
}

/// Filters for lead listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Inbound webhook or API call recorded for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadEvent {
    pub id: u64,
    pub lead_id: Option<LeadId>,
    pub kind: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeadValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("condition must be between 1 and 10, got {0}")]
    ConditionOutOfRange(u8),
    #[error("unknown lead status '{0}'")]
    UnknownStatus(String),
    #[error("arv must be a non-negative amount, got {0}")]
    InvalidArv(f64),
    #[error("malformed lead payload: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> LeadSubmission {
        LeadSubmission {
            name: Some(" Dana ".to_string()),
            phone: Some("555-0100".to_string()),
            ..LeadSubmission::default()
        }
    }

    #[test]
    fn name_falls_back_and_defaults_apply() {
        let lead = submission().validate().expect("valid");
        assert_eq!(lead.first_name, "Dana");
        assert_eq!(lead.lead_source, "API");
        assert_eq!(lead.status, LeadStatus::NewLead);
    }

    #[test]
    fn phone_is_required() {
        let mut payload = submission();
        payload.phone = Some("   ".to_string());
        assert_eq!(
            payload.validate(),
            Err(LeadValidationError::MissingField("phone"))
        );
    }

    #[test]
    fn status_accepts_label_or_key() {
        assert_eq!("Offer Made".parse::<LeadStatus>(), Ok(LeadStatus::OfferMade));
        assert_eq!("under_contract".parse::<LeadStatus>(), Ok(LeadStatus::UnderContract));
        assert!("Archived".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn condition_outside_scale_is_rejected() {
        let mut payload = submission();
        payload.condition = Some(11);
        assert_eq!(
            payload.validate(),
            Err(LeadValidationError::ConditionOutOfRange(11))
        );
    }
}
