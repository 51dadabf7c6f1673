//! Bulk loading of tariff schedule CSV exports.

use std::io::Read;

use serde::{Deserialize, Serialize};

use super::repository::{ProductUpsert, TariffRepository};
use crate::core::errors::ApiError;

const HTS_NUMBER: &str = "HTS Number";
const DESCRIPTION: &str = "Description";
const UNIT_OF_MEASURE: &str = "Unit of Measure";
const GENERAL_RATE: &str = "General Rate of Duty";
const SPECIAL_RATE: &str = "Special Rate of Duty";
const COLUMN2_RATE: &str = "Column 2 Rate of Duty";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub errors: usize,
    pub total_processed: usize,
}

struct ColumnMap {
    hts_number: usize,
    description: Option<usize>,
    unit_of_measure: Option<usize>,
    general: Option<usize>,
    special: Option<usize>,
    column2: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ApiError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let hts_number = find(HTS_NUMBER).ok_or_else(|| {
            ApiError::BadRequest(format!("CSV is missing the '{}' column", HTS_NUMBER))
        })?;
        Ok(Self {
            hts_number,
            description: find(DESCRIPTION),
            unit_of_measure: find(UNIT_OF_MEASURE),
            general: find(GENERAL_RATE),
            special: find(SPECIAL_RATE),
            column2: find(COLUMN2_RATE),
        })
    }
}

fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Reads every row up front; a row that cannot be decoded becomes `Err`.
/// Rows without an HTS number are dropped here and never counted.
fn read_rows<R: Read>(reader: R) -> Result<Vec<Result<ProductUpsert, String>>, ApiError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ApiError::BadRequest(format!("Unreadable CSV header: {}", e)))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                rows.push(Err(format!("row {}: {}", line + 2, err)));
                continue;
            }
        };
        let Some(hts_number) = cell(&record, Some(columns.hts_number)) else {
            continue;
        };
        rows.push(Ok(ProductUpsert {
            hts_number,
            description: cell(&record, columns.description).unwrap_or_default(),
            unit_of_measure: cell(&record, columns.unit_of_measure),
            general_duty_rate: cell(&record, columns.general),
            special_duty_rate: cell(&record, columns.special),
            column2_duty_rate: cell(&record, columns.column2),
            additional_info: None,
        }));
    }
    Ok(rows)
}

/// Upserts every row, counting inserts, updates and failed rows.
///
/// A failing row is logged and skipped; the import carries on.
pub async fn import_products<R: Read>(
    repository: &dyn TariffRepository,
    reader: R,
) -> Result<ImportSummary, ApiError> {
    let rows = read_rows(reader)?;
    let mut summary = ImportSummary::default();

    for row in rows {
        let product = match row {
            Ok(product) => product,
            Err(reason) => {
                tracing::warn!("Error importing {}", reason);
                summary.errors += 1;
                continue;
            }
        };
        let hts_number = product.hts_number.clone();
        match repository.upsert_product(product).await {
            Ok(outcome) if outcome.was_inserted() => summary.imported += 1,
            Ok(_) => summary.updated += 1,
            Err(err) => {
                tracing::warn!("Error importing row {}: {}", hts_number, err);
                summary.errors += 1;
            }
        }
    }

    summary.total_processed = summary.imported + summary.updated + summary.errors;
    Ok(summary)
}
