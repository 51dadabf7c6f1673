//! TariffRepository trait: storage interface consumed by the tariff service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

/// A tariff schedule line keyed by its HTS number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtsProduct {
    pub id: i64,
    pub hts_number: String,
    pub description: String,
    pub unit_of_measure: Option<String>,
    pub general_duty_rate: Option<String>,
    pub special_duty_rate: Option<String>,
    pub column2_duty_rate: Option<String>,
    pub additional_info: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written by an insert-or-update keyed on `hts_number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub hts_number: String,
    pub description: String,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub general_duty_rate: Option<String>,
    #[serde(default)]
    pub special_duty_rate: Option<String>,
    #[serde(default)]
    pub column2_duty_rate: Option<String>,
    #[serde(default)]
    pub additional_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted(HtsProduct),
    Updated(HtsProduct),
}

impl UpsertOutcome {
    pub fn product(&self) -> &HtsProduct {
        match self {
            UpsertOutcome::Inserted(product) | UpsertOutcome::Updated(product) => product,
        }
    }

    pub fn into_product(self) -> HtsProduct {
        match self {
            UpsertOutcome::Inserted(product) | UpsertOutcome::Updated(product) => product,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub region: Option<String>,
}

impl Country {
    pub fn new(code: &str, name: &str, region: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            region: Some(region.to_string()),
        }
    }
}

/// Audit row appended after a calculation made within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub session_id: String,
    pub hts_number: String,
    pub country_code: String,
    pub product_cost: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub quantity: u32,
    pub weight_kg: Decimal,
    pub cif_value: Decimal,
    pub total_duty: Decimal,
    pub landed_cost: Decimal,
    pub calculation_details: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationHistoryRecord {
    pub id: i64,
    pub session_id: String,
    pub hts_number: String,
    pub country_code: String,
    pub product_cost: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub quantity: u32,
    pub weight_kg: Decimal,
    pub cif_value: Decimal,
    pub total_duty: Decimal,
    pub landed_cost: Decimal,
    pub calculation_details: Value,
    pub created_at: String,
}

#[async_trait]
pub trait TariffRepository: Send + Sync {
    async fn get_product(&self, hts_number: &str) -> Result<Option<HtsProduct>, ApiError>;

    async fn upsert_product(&self, product: ProductUpsert) -> Result<UpsertOutcome, ApiError>;

    /// Substring match on HTS number or description, ordered by HTS number.
    async fn search_products(&self, query: &str, limit: usize)
        -> Result<Vec<HtsProduct>, ApiError>;

    async fn list_products(&self, limit: usize, offset: usize)
        -> Result<Vec<HtsProduct>, ApiError>;

    async fn list_countries(&self) -> Result<Vec<Country>, ApiError>;

    /// Inserts countries whose code is not present yet; returns how many were added.
    async fn seed_countries(&self, countries: &[Country]) -> Result<usize, ApiError>;

    async fn append_history(&self, record: NewHistoryRecord) -> Result<(), ApiError>;

    /// Newest first, optionally restricted to one session.
    async fn list_history(
        &self,
        session_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CalculationHistoryRecord>, ApiError>;

    async fn count_products(&self) -> Result<u64, ApiError>;

    async fn count_countries(&self) -> Result<u64, ApiError>;

    /// Counts history rows, only those created at or after `since` when given.
    async fn count_history(&self, since: Option<DateTime<Utc>>) -> Result<u64, ApiError>;
}
