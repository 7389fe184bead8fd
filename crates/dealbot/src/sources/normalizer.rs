use chrono::NaiveDate;
use serde_json::{Number, Value};

/// How a raw provider value is cleaned before it lands in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Integer,
    Decimal,
    Currency,
    Date,
    Text,
}

/// Returns `None` for values that count as absent: nulls, blanks, and zero amounts.
pub(crate) fn normalize(kind: FieldKind, raw: &Value) -> Option<Value> {
    match kind {
        FieldKind::Integer => numeric(raw).map(|number| Value::from(number.round() as i64)),
        FieldKind::Decimal | FieldKind::Currency => {
            numeric(raw).and_then(Number::from_f64).map(Value::Number)
        }
        FieldKind::Date => raw.as_str().and_then(normalize_date).map(Value::String),
        FieldKind::Text => text(raw).map(Value::String),
    }
}

fn numeric(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-'))
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    (number.is_finite() && number != 0.0).then_some(number)
}

fn text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let parsed = if trimmed.len() == 8 && trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        NaiveDate::parse_from_str(trimmed, "%Y%m%d").ok()
    } else {
        // Timestamps such as `2024-06-04T00:00:00` keep only the date part.
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
            .ok()
    };

    parsed.map(|date| date.format("%Y-%m-%d").to_string())
}
