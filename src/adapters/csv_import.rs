use crate::domain::model::{PersonRecord, PersonRow};
use crate::domain::ports::PersonSource;
use crate::utils::error::Result;
use std::io::Read;
use std::path::PathBuf;

/// Reads person rows in the mail room's roster format:
/// `LastName,FirstName,EmailAddress,PersonID`.
#[derive(Debug, Clone)]
pub struct CsvPersonSource {
    path: PathBuf,
    has_headers: bool,
}

impl CsvPersonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            has_headers: false,
        }
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }
}

impl PersonSource for CsvPersonSource {
    fn read_persons(&self) -> Result<Vec<PersonRow>> {
        tracing::debug!("Reading person roster from {}", self.path.display());
        let file = std::fs::File::open(&self.path)?;
        Ok(parse_person_csv(file, self.has_headers))
    }
}

/// Short rows come back with empty fields and unreadable rows carry the
/// reader's error text, so the ledger rejects them individually and the rest
/// of the file still imports.
pub fn parse_person_csv<R: Read>(reader: R, has_headers: bool) -> Vec<PersonRow> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .records()
        .map(|row| match row {
            Ok(row) => {
                let field = |i: usize| row.get(i).unwrap_or_default().to_string();
                Ok(PersonRecord {
                    last_name: field(0),
                    first_name: field(1),
                    email_address: field(2),
                    person_id: field(3),
                })
            }
            Err(e) => {
                tracing::warn!("Unreadable roster row: {}", e);
                Err(e.to_string())
            }
        })
        .collect()
}
