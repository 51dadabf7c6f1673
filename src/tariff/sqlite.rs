//! SQLite-backed tariff store.
//!
//! Products, countries and calculation history live in one database file.
//! Money columns are stored as exact decimal text so nothing passes through
//! binary floating point on the way in or out.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};

use super::countries::default_countries;
use super::repository::{
    CalculationHistoryRecord, Country, HtsProduct, NewHistoryRecord, ProductUpsert,
    TariffRepository, UpsertOutcome,
};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

const PRODUCT_COLUMNS: &str = "id, hts_number, description, unit_of_measure, general_duty_rate, \
     special_duty_rate, column2_duty_rate, additional_info, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, session_id, hts_number, country_code, product_cost, freight, \
     insurance, quantity, weight_kg, cif_value, total_duty, landed_cost, calculation_details, \
     created_at";

#[derive(Clone)]
pub struct SqliteTariffStore {
    pool: SqlitePool,
}

impl SqliteTariffStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.tariff_db_path.clone()).await
    }

    /// Opens (creating if needed) the database and seeds countries when empty.
    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to tariff db: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;

        if store.count_countries().await? == 0 {
            let added = store.seed_countries(&default_countries()).await?;
            tracing::info!("Initialized {} countries", added);
        }

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hts_products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hts_number TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                unit_of_measure TEXT,
                general_duty_rate TEXT,
                special_duty_rate TEXT,
                column2_duty_rate TEXT,
                additional_info TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init hts_products table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                region TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init countries table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS calculation_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                hts_number TEXT NOT NULL,
                country_code TEXT NOT NULL,
                product_cost TEXT NOT NULL,
                freight TEXT NOT NULL,
                insurance TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                weight_kg TEXT NOT NULL,
                cif_value TEXT NOT NULL,
                total_duty TEXT NOT NULL,
                landed_cost TEXT NOT NULL,
                calculation_details TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            ApiError::internal(format!("Failed to init calculation_history table: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_session_id ON calculation_history(session_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    async fn count(&self, sql: &str) -> Result<u64, ApiError> {
        let count: i64 = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?
            .get(0);
        Ok(count.max(0) as u64)
    }
}

fn now_rfc3339() -> String {
    timestamp(Utc::now())
}

fn timestamp(at: DateTime<Utc>) -> String {
    // fixed width so lexical order matches chronological order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn row_to_product(row: &SqliteRow) -> HtsProduct {
    let additional_info = row
        .try_get::<Option<String>, _>("additional_info")
        .unwrap_or(None)
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());

    HtsProduct {
        id: row.try_get::<i64, _>("id").unwrap_or_default(),
        hts_number: row.try_get::<String, _>("hts_number").unwrap_or_default(),
        description: row.try_get::<String, _>("description").unwrap_or_default(),
        unit_of_measure: row.try_get::<Option<String>, _>("unit_of_measure").unwrap_or(None),
        general_duty_rate: row
            .try_get::<Option<String>, _>("general_duty_rate")
            .unwrap_or(None),
        special_duty_rate: row
            .try_get::<Option<String>, _>("special_duty_rate")
            .unwrap_or(None),
        column2_duty_rate: row
            .try_get::<Option<String>, _>("column2_duty_rate")
            .unwrap_or(None),
        additional_info,
        created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
        updated_at: row.try_get::<String, _>("updated_at").unwrap_or_default(),
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, ApiError> {
    let raw: String = row.try_get(column).map_err(ApiError::internal)?;
    Decimal::from_str(&raw)
        .map_err(|e| ApiError::internal(format!("Corrupt {} value '{}': {}", column, raw, e)))
}

fn row_to_history(row: &SqliteRow) -> Result<CalculationHistoryRecord, ApiError> {
    let quantity: i64 = row.try_get("quantity").map_err(ApiError::internal)?;
    let details: String = row
        .try_get("calculation_details")
        .map_err(ApiError::internal)?;

    Ok(CalculationHistoryRecord {
        id: row.try_get("id").map_err(ApiError::internal)?,
        session_id: row.try_get("session_id").map_err(ApiError::internal)?,
        hts_number: row.try_get("hts_number").map_err(ApiError::internal)?,
        country_code: row.try_get("country_code").map_err(ApiError::internal)?,
        product_cost: decimal_column(row, "product_cost")?,
        freight: decimal_column(row, "freight")?,
        insurance: decimal_column(row, "insurance")?,
        quantity: u32::try_from(quantity).map_err(ApiError::internal)?,
        weight_kg: decimal_column(row, "weight_kg")?,
        cif_value: decimal_column(row, "cif_value")?,
        total_duty: decimal_column(row, "total_duty")?,
        landed_cost: decimal_column(row, "landed_cost")?,
        calculation_details: serde_json::from_str(&details).unwrap_or(Value::Null),
        created_at: row.try_get("created_at").map_err(ApiError::internal)?,
    })
}

#[async_trait]
impl TariffRepository for SqliteTariffStore {
    async fn get_product(&self, hts_number: &str) -> Result<Option<HtsProduct>, ApiError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM hts_products WHERE hts_number = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(hts_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(row_to_product))
    }

    async fn upsert_product(&self, product: ProductUpsert) -> Result<UpsertOutcome, ApiError> {
        let now = now_rfc3339();
        let additional_info = product
            .additional_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ApiError::internal)?;

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        let existing: Option<i64> =
            sqlx::query("SELECT id FROM hts_products WHERE hts_number = ?1")
                .bind(&product.hts_number)
                .fetch_optional(&mut *tx)
                .await
                .map_err(ApiError::internal)?
                .map(|row| row.get(0));

        if let Some(id) = existing {
            sqlx::query(
                "UPDATE hts_products SET description = ?1, unit_of_measure = ?2,
                    general_duty_rate = ?3, special_duty_rate = ?4, column2_duty_rate = ?5,
                    additional_info = COALESCE(?6, additional_info), updated_at = ?7
                 WHERE id = ?8",
            )
            .bind(&product.description)
            .bind(&product.unit_of_measure)
            .bind(&product.general_duty_rate)
            .bind(&product.special_duty_rate)
            .bind(&product.column2_duty_rate)
            .bind(&additional_info)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        } else {
            sqlx::query(
                "INSERT INTO hts_products (hts_number, description, unit_of_measure,
                    general_duty_rate, special_duty_rate, column2_duty_rate, additional_info,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&product.hts_number)
            .bind(&product.description)
            .bind(&product.unit_of_measure)
            .bind(&product.general_duty_rate)
            .bind(&product.special_duty_rate)
            .bind(&product.column2_duty_rate)
            .bind(&additional_info)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        let row = sqlx::query(&format!(
            "SELECT {} FROM hts_products WHERE hts_number = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(&product.hts_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;

        let stored = row_to_product(&row);
        Ok(if existing.is_some() {
            UpsertOutcome::Updated(stored)
        } else {
            UpsertOutcome::Inserted(stored)
        })
    }

    async fn search_products(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<HtsProduct>, ApiError> {
        let pattern = like_pattern(query);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM hts_products
             WHERE hts_number LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
             ORDER BY hts_number
             LIMIT ?2",
            PRODUCT_COLUMNS
        ))
        .bind(&pattern)
        .bind(limit.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn list_products(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HtsProduct>, ApiError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM hts_products ORDER BY hts_number LIMIT ?1 OFFSET ?2",
            PRODUCT_COLUMNS
        ))
        .bind(limit.max(1) as i64)
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn list_countries(&self) -> Result<Vec<Country>, ApiError> {
        let rows = sqlx::query("SELECT code, name, region FROM countries ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| Country {
                code: row.try_get::<String, _>("code").unwrap_or_default(),
                name: row.try_get::<String, _>("name").unwrap_or_default(),
                region: row.try_get::<Option<String>, _>("region").unwrap_or(None),
            })
            .collect())
    }

    async fn seed_countries(&self, countries: &[Country]) -> Result<usize, ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        let mut added = 0usize;

        for country in countries {
            let result =
                sqlx::query("INSERT OR IGNORE INTO countries (code, name, region) VALUES (?1, ?2, ?3)")
                    .bind(&country.code)
                    .bind(&country.name)
                    .bind(&country.region)
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::internal)?;
            added += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(added)
    }

    async fn append_history(&self, record: NewHistoryRecord) -> Result<(), ApiError> {
        let details =
            serde_json::to_string(&record.calculation_details).map_err(ApiError::internal)?;

        sqlx::query(
            "INSERT INTO calculation_history (session_id, hts_number, country_code,
                product_cost, freight, insurance, quantity, weight_kg, cif_value, total_duty,
                landed_cost, calculation_details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&record.session_id)
        .bind(&record.hts_number)
        .bind(&record.country_code)
        .bind(record.product_cost.to_string())
        .bind(record.freight.to_string())
        .bind(record.insurance.to_string())
        .bind(i64::from(record.quantity))
        .bind(record.weight_kg.to_string())
        .bind(record.cif_value.to_string())
        .bind(record.total_duty.to_string())
        .bind(record.landed_cost.to_string())
        .bind(details)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save calculation history: {}", e)))?;

        Ok(())
    }

    async fn list_history(
        &self,
        session_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CalculationHistoryRecord>, ApiError> {
        let limit = limit.max(1) as i64;
        let rows = if let Some(session_id) = session_id {
            sqlx::query(&format!(
                "SELECT {} FROM calculation_history WHERE session_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
                HISTORY_COLUMNS
            ))
            .bind(session_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query(&format!(
                "SELECT {} FROM calculation_history ORDER BY created_at DESC, id DESC LIMIT ?1",
                HISTORY_COLUMNS
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        };

        rows.iter().map(row_to_history).collect()
    }

    async fn count_products(&self) -> Result<u64, ApiError> {
        self.count("SELECT COUNT(*) FROM hts_products").await
    }

    async fn count_countries(&self) -> Result<u64, ApiError> {
        self.count("SELECT COUNT(*) FROM countries").await
    }

    async fn count_history(&self, since: Option<DateTime<Utc>>) -> Result<u64, ApiError> {
        let Some(since) = since else {
            return self.count("SELECT COUNT(*) FROM calculation_history").await;
        };

        let count: i64 =
            sqlx::query("SELECT COUNT(*) FROM calculation_history WHERE created_at >= ?1")
                .bind(timestamp(since))
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?
                .get(0);
        Ok(count.max(0) as u64)
    }
}
