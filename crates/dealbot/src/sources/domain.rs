use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::normalizer::FieldKind;

/// External property-data providers whose payloads are merged into snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Melissa,
    Zillow,
}

impl Provider {
    pub const fn ordered() -> [Self; 2] {
        [Self::Melissa, Self::Zillow]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Melissa => "melissa",
            Self::Zillow => "zillow",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Melissa => "Melissa",
            Self::Zillow => "Zillow",
        }
    }
}

impl FromStr for Provider {
    type Err = SourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "melissa" => Ok(Self::Melissa),
            "zillow" => Ok(Self::Zillow),
            other => Err(SourceError::UnknownProvider(other.to_string())),
        }
    }
}

/// Payload kinds; each belongs to exactly one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    LookupProperty,
    LookupDeeds,
    PropertyDetails,
    MarketData,
}

impl PayloadKind {
    pub const fn provider(self) -> Provider {
        match self {
            Self::LookupProperty | Self::LookupDeeds => Provider::Melissa,
            Self::PropertyDetails | Self::MarketData => Provider::Zillow,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::LookupProperty => "lookup_property",
            Self::LookupDeeds => "lookup_deeds",
            Self::PropertyDetails => "property_details",
            Self::MarketData => "market_data",
        }
    }
}

impl FromStr for PayloadKind {
    type Err = SourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "lookup_property" | "lookupproperty" => Ok(Self::LookupProperty),
            "lookup_deeds" | "lookupdeeds" => Ok(Self::LookupDeeds),
            "property_details" | "details" => Ok(Self::PropertyDetails),
            "market_data" | "market" => Ok(Self::MarketData),
            _ => Err(SourceError::UnknownSubtype(value.trim().to_string())),
        }
    }
}

/// Raw provider response as captured; never modified once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    pub source: Provider,
    pub subtype: PayloadKind,
    pub captured_at: DateTime<Utc>,
    pub body: Value,
}

impl ProviderPayload {
    pub fn new(
        source: Provider,
        subtype: PayloadKind,
        captured_at: DateTime<Utc>,
        body: Value,
    ) -> Result<Self, SourceError> {
        if subtype.provider() != source {
            return Err(SourceError::SubtypeMismatch {
                provider: source,
                subtype,
            });
        }

        Ok(Self {
            source,
            subtype,
            captured_at,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
    #[error("unknown payload subtype '{0}'")]
    UnknownSubtype(String),
    #[error("{} does not publish {} payloads", .provider.label(), .subtype.key())]
    SubtypeMismatch {
        provider: Provider,
        subtype: PayloadKind,
    },
}

/// Logical property attributes exposed in a merged snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    Owner,
    Apn,
    LandUse,
    YearBuilt,
    Beds,
    Baths,
    Sqft,
    LotSize,
    LastSaleDate,
    LastSalePrice,
    EstimatedValue,
    RentEstimate,
    MortgageAmount,
    MortgageLender,
    Zpid,
}

impl SnapshotField {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::Owner,
            Self::Apn,
            Self::LandUse,
            Self::YearBuilt,
            Self::Beds,
            Self::Baths,
            Self::Sqft,
            Self::LotSize,
            Self::LastSaleDate,
            Self::LastSalePrice,
            Self::EstimatedValue,
            Self::RentEstimate,
            Self::MortgageAmount,
            Self::MortgageLender,
            Self::Zpid,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Apn => "apn",
            Self::LandUse => "land_use",
            Self::YearBuilt => "year_built",
            Self::Beds => "beds",
            Self::Baths => "baths",
            Self::Sqft => "sqft",
            Self::LotSize => "lot_size",
            Self::LastSaleDate => "last_sale_date",
            Self::LastSalePrice => "last_sale_price",
            Self::EstimatedValue => "estimated_value",
            Self::RentEstimate => "rent_estimate",
            Self::MortgageAmount => "mortgage_amount",
            Self::MortgageLender => "mortgage_lender",
            Self::Zpid => "zpid",
        }
    }

    pub(crate) const fn kind(self) -> FieldKind {
        match self {
            Self::Owner | Self::Apn | Self::LandUse | Self::MortgageLender | Self::Zpid => {
                FieldKind::Text
            }
            Self::YearBuilt | Self::Beds | Self::Sqft | Self::LotSize => FieldKind::Integer,
            Self::Baths => FieldKind::Decimal,
            Self::LastSaleDate => FieldKind::Date,
            Self::LastSalePrice
            | Self::EstimatedValue
            | Self::RentEstimate
            | Self::MortgageAmount => FieldKind::Currency,
        }
    }
}
