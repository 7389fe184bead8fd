use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::domain::LeadValidationError;

/// Cash buyer on the disposition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub city_focus: Option<String>,
    pub zip_codes: Option<String>,
    pub property_types: Option<String>,
    pub max_budget: Option<String>,
    pub min_beds: Option<String>,
    pub min_baths: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Buyer {
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        [
            Some(self.first_name.as_str()),
            self.last_name.as_deref(),
            Some(self.phone.as_str()),
            Some(self.email.as_str()),
            self.city_focus.as_deref(),
            self.zip_codes.as_deref(),
            self.property_types.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_ascii_lowercase().contains(&needle))
    }
}

/// Buyer payload from the API or a CSV row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuyerSubmission {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub city_focus: Option<String>,
    #[serde(default)]
    pub zip_codes: Option<String>,
    #[serde(default)]
    pub property_types: Option<String>,
    #[serde(default)]
    pub max_budget: Option<String>,
    #[serde(default)]
    pub min_beds: Option<String>,
    #[serde(default)]
    pub min_baths: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BuyerSubmission {
    pub(crate) fn into_buyer(
        self,
        id: u64,
        created_at: DateTime<Utc>,
    ) -> Result<Buyer, LeadValidationError> {
        let first_name = required(self.first_name, "first_name")?;
        let email = required(self.email, "email")?;
        if !email.contains('@') {
            return Err(LeadValidationError::InvalidEmail(email));
        }
        let phone = required(self.phone, "phone")?;

        Ok(Buyer {
            id,
            first_name,
            last_name: optional(self.last_name),
            email,
            phone,
            city_focus: optional(self.city_focus),
            zip_codes: optional(self.zip_codes),
            property_types: optional(self.property_types),
            max_budget: optional(self.max_budget),
            min_beds: optional(self.min_beds),
            min_baths: optional(self.min_baths),
            notes: optional(self.notes),
            created_at,
        })
    }
}

fn required(value: String, field: &'static str) -> Result<String, LeadValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LeadValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Debug)]
pub enum BuyerImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BuyerImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuyerImportError::Io(err) => write!(f, "failed to read buyer list: {}", err),
            BuyerImportError::Csv(err) => write!(f, "invalid buyer CSV data: {}", err),
        }
    }
}

impl std::error::Error for BuyerImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuyerImportError::Io(err) => Some(err),
            BuyerImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BuyerImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BuyerImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads a buyer list exported from the CRM spreadsheet.
pub struct BuyerCsvImporter;

impl BuyerCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<BuyerSubmission>, BuyerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<BuyerSubmission>, BuyerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut submissions = Vec::new();
        for row in csv_reader.deserialize::<BuyerSubmission>() {
            let submission = row?;
            submissions.push(submission);
        }
        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CSV: &str = "first_name,last_name,email,phone,city_focus,zip_codes,property_types,max_budget\n\
Rita,Gomez,rita@example.test,555-0111,Orlando,\"32810,32818\",SFR,250000\n\
Sam,,sam@example.test,555-0122,Tampa,,Duplex,\n";

    #[test]
    fn importer_reads_rows() {
        let rows = BuyerCsvImporter::from_reader(Cursor::new(CSV)).expect("import");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zip_codes.as_deref(), Some("32810,32818"));
        assert_eq!(rows[1].first_name, "Sam");
    }

    #[test]
    fn blank_optional_columns_become_none() {
        let rows = BuyerCsvImporter::from_reader(Cursor::new(CSV)).expect("import");
        let buyer = rows[1]
            .clone()
            .into_buyer(2, Utc::now())
            .expect("valid buyer");
        assert!(buyer.last_name.is_none());
        assert!(buyer.max_budget.is_none());
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        match BuyerCsvImporter::from_path("./no-such-buyers.csv") {
            Err(BuyerImportError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn search_covers_zip_codes() {
        let rows = BuyerCsvImporter::from_reader(Cursor::new(CSV)).expect("import");
        let buyer = rows[0].clone().into_buyer(1, Utc::now()).expect("valid");
        assert!(buyer.matches("32818"));
        assert!(buyer.matches("GOMEZ"));
        assert!(!buyer.matches("miami"));
    }
}
