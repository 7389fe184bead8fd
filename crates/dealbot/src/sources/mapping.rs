use serde_json::Value;

use super::domain::{PayloadKind, SnapshotField};
use super::normalizer::normalize;

use SnapshotField::*;

/// Raw JSON path (dot separated) to logical field. Earlier rows win within a payload.
type FieldTable = &'static [(&'static str, SnapshotField)];

const MELISSA_PROPERTY_FIELDS: FieldTable = &[
    ("PrimaryOwner.Name1Full", Owner),
    ("Parcel.UnformattedAPN", Apn),
    ("Parcel.FormattedAPN", Apn),
    ("PropertyUseInfo.PropertyTypeDescription", LandUse),
    ("PropertyUseInfo.YearBuilt", YearBuilt),
    ("IntRoomInfo.BedroomsCount", Beds),
    ("IntRoomInfo.BathCount", Baths),
    ("PropertySize.AreaBuilding", Sqft),
    ("PropertySize.AreaLotSF", LotSize),
    ("SaleInfo.DeedLastSaleDate", LastSaleDate),
    ("SaleInfo.AssessorLastSaleDate", LastSaleDate),
    ("SaleInfo.DeedLastSalePrice", LastSalePrice),
    ("SaleInfo.AssessorLastSaleAmount", LastSalePrice),
    ("EstimatedValue.EstimatedValue", EstimatedValue),
    ("CurrentDeed.MortgageAmount", MortgageAmount),
    ("CurrentDeed.LenderName", MortgageLender),
];

const MELISSA_DEED_FIELDS: FieldTable = &[
    ("PrimaryGrantee.Name1Full", Owner),
    ("DocInfo.RecordingDate", LastSaleDate),
    ("DocInfo.InstrumentDate", LastSaleDate),
    ("TxAmtInfo.TransferAmount", LastSalePrice),
    ("Mortgage1.Amount", MortgageAmount),
    ("Mortgage1.LenderFullName", MortgageLender),
];

const ZILLOW_DETAIL_FIELDS: FieldTable = &[
    ("zpid", Zpid),
    ("parcelId", Apn),
    ("homeType", LandUse),
    ("yearBuilt", YearBuilt),
    ("bedrooms", Beds),
    ("bathrooms", Baths),
    ("livingArea", Sqft),
    ("lotSize", LotSize),
    ("lastSoldPrice", LastSalePrice),
    ("zestimate", EstimatedValue),
    ("rentZestimate", RentEstimate),
];

const ZILLOW_MARKET_FIELDS: FieldTable = &[("summary.medianRent", RentEstimate)];

pub(crate) fn field_table(kind: PayloadKind) -> FieldTable {
    match kind {
        PayloadKind::LookupProperty => MELISSA_PROPERTY_FIELDS,
        PayloadKind::LookupDeeds => MELISSA_DEED_FIELDS,
        PayloadKind::PropertyDetails => ZILLOW_DETAIL_FIELDS,
        PayloadKind::MarketData => ZILLOW_MARKET_FIELDS,
    }
}

/// Picks the record inside a payload body that the field table applies to.
pub(crate) fn select_record(kind: PayloadKind, body: &Value) -> Option<&Value> {
    match kind {
        PayloadKind::LookupProperty => match body.get("Records") {
            Some(Value::Array(records)) => records.first(),
            Some(_) => None,
            None => Some(body),
        },
        PayloadKind::LookupDeeds => latest_sale_deed(body),
        PayloadKind::PropertyDetails | PayloadKind::MarketData => Some(body),
    }
}

/// Latest-recorded deed that carries a non-zero transfer amount.
fn latest_sale_deed(body: &Value) -> Option<&Value> {
    let records = body.get("Records")?.as_array()?;
    let mut best: Option<(String, &Value)> = None;

    for record in records {
        let price = lookup_path(record, "TxAmtInfo.TransferAmount")
            .and_then(|raw| normalize(LastSalePrice.kind(), raw));
        let date = ["DocInfo.RecordingDate", "DocInfo.InstrumentDate"]
            .iter()
            .filter_map(|path| lookup_path(record, path))
            .find_map(|raw| normalize(LastSaleDate.kind(), raw))
            .and_then(|value| value.as_str().map(str::to_string));

        let (Some(_), Some(date)) = (price, date) else {
            continue;
        };
        // ISO dates order lexically; later rows win ties.
        if best.as_ref().map_or(true, |(current, _)| date >= *current) {
            best = Some((date, record));
        }
    }

    best.map(|(_, record)| record)
}

pub(crate) fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.get(segment))
}
