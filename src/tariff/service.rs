use std::path::Path;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::import::{import_products, ImportSummary};
use super::repository::{
    CalculationHistoryRecord, Country, HtsProduct, NewHistoryRecord, ProductUpsert,
    TariffRepository, UpsertOutcome,
};
use crate::core::config::settings::TariffSettings;
use crate::core::errors::ApiError;
use crate::duty::{compute_cif, compute_landed_cost, parse_duty_rate, DutyBasis, DutyCalculation};

/// Validated commercial inputs for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInputs {
    pub hts_number: String,
    pub product_cost: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub quantity: u32,
    pub weight_kg: Decimal,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtsDetails {
    pub number: String,
    pub description: String,
    pub unit_of_measure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValues {
    pub product_cost: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub quantity: u32,
    pub weight_kg: Decimal,
    pub country_code: String,
    pub cif_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyResults {
    pub general: DutyCalculation,
    pub special: DutyCalculation,
    pub column2: DutyCalculation,
    pub applicable: DutyCalculation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub cif_value: Decimal,
    pub total_duty: Decimal,
    pub landed_cost: Decimal,
    pub effective_duty_rate: f64,
    /// False when none of the three columns could be evaluated.
    pub duty_calculable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub hts_details: HtsDetails,
    pub input_values: InputValues,
    pub duty_results: DutyResults,
    pub summary: CalculationSummary,
}

/// A calculation plus the result of the best-effort history write.
#[derive(Debug, Clone)]
pub struct CalculationReport {
    pub outcome: CalculationOutcome,
    pub history_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffStatistics {
    pub total_hts_products: u64,
    pub total_countries: u64,
    pub total_calculations: u64,
    pub recent_calculations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffHealth {
    pub status: String,
    pub database_connected: bool,
    pub total_hts_products: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Picks the lowest payable result; inapplicable results rank above any amount.
///
/// Ties keep the earlier candidate, so with nothing applicable the general
/// column is returned.
pub fn select_applicable<'a>(
    general: &'a DutyCalculation,
    special: &'a DutyCalculation,
    column2: &'a DutyCalculation,
) -> &'a DutyCalculation {
    fn rank(calc: &DutyCalculation) -> (bool, Decimal) {
        (!calc.is_applicable, calc.total_amount)
    }

    let mut best = general;
    for candidate in [special, column2] {
        let (best_blocked, best_amount) = rank(best);
        let (blocked, amount) = rank(candidate);
        let better = match (best_blocked, blocked) {
            (true, false) => true,
            (false, false) => amount < best_amount,
            _ => false,
        };
        if better {
            best = candidate;
        }
    }
    best
}

fn amount_out_of_range(what: &str) -> ApiError {
    ApiError::BadRequest(format!("{} is out of range for the given amounts", what))
}

#[derive(Clone)]
pub struct TariffService {
    repository: Arc<dyn TariffRepository>,
    settings: TariffSettings,
}

impl TariffService {
    pub fn new(repository: Arc<dyn TariffRepository>, settings: TariffSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<dyn TariffRepository> {
        &self.repository
    }

    pub async fn calculate_duties(
        &self,
        inputs: &CalculationInputs,
        session_id: Option<&str>,
    ) -> Result<CalculationReport, ApiError> {
        let product = self.lookup(&inputs.hts_number).await?;

        let cif_value = compute_cif(inputs.product_cost, inputs.freight, inputs.insurance)
            .ok_or_else(|| amount_out_of_range("CIF value"))?;
        let basis = DutyBasis::new(cif_value, Some(inputs.weight_kg), Some(inputs.quantity));

        let general = parse_duty_rate(product.general_duty_rate.as_deref(), &basis);
        let special = parse_duty_rate(product.special_duty_rate.as_deref(), &basis);
        let column2 = parse_duty_rate(product.column2_duty_rate.as_deref(), &basis);
        let applicable = select_applicable(&general, &special, &column2).clone();

        let landed_cost = compute_landed_cost(cif_value, applicable.total_amount)
            .ok_or_else(|| amount_out_of_range("Landed cost"))?;
        let summary = CalculationSummary {
            cif_value,
            total_duty: applicable.total_amount,
            landed_cost,
            effective_duty_rate: applicable.effective_rate_percent,
            duty_calculable: applicable.is_applicable,
        };
        if !summary.duty_calculable {
            tracing::warn!(
                "No duty column of {} could be evaluated for the given inputs",
                product.hts_number
            );
        }

        let outcome = CalculationOutcome {
            hts_details: HtsDetails {
                number: product.hts_number.clone(),
                description: product.description.clone(),
                unit_of_measure: product.unit_of_measure.clone(),
            },
            input_values: InputValues {
                product_cost: inputs.product_cost,
                freight: inputs.freight,
                insurance: inputs.insurance,
                quantity: inputs.quantity,
                weight_kg: inputs.weight_kg,
                country_code: inputs.country_code.clone(),
                cif_value,
            },
            duty_results: DutyResults {
                general,
                special,
                column2,
                applicable,
            },
            summary,
        };

        let history_warning = match session_id {
            Some(session_id) => self.record_history(session_id, inputs, &outcome).await,
            None => None,
        };

        Ok(CalculationReport {
            outcome,
            history_warning,
        })
    }

    /// Appends the audit row within the configured time bound.
    ///
    /// Returns a warning instead of an error so the calculation still succeeds.
    async fn record_history(
        &self,
        session_id: &str,
        inputs: &CalculationInputs,
        outcome: &CalculationOutcome,
    ) -> Option<String> {
        let calculation_details = match serde_json::to_value(outcome) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Failed to serialize calculation details: {}", err);
                serde_json::Value::Null
            }
        };
        let record = NewHistoryRecord {
            session_id: session_id.to_string(),
            hts_number: outcome.hts_details.number.clone(),
            country_code: inputs.country_code.clone(),
            product_cost: inputs.product_cost,
            freight: inputs.freight,
            insurance: inputs.insurance,
            quantity: inputs.quantity,
            weight_kg: inputs.weight_kg,
            cif_value: outcome.summary.cif_value,
            total_duty: outcome.summary.total_duty,
            landed_cost: outcome.summary.landed_cost,
            calculation_details,
        };

        let limit = self.settings.history_write_timeout;
        match tokio::time::timeout(limit, self.repository.append_history(record)).await {
            Ok(Ok(())) => None,
            Ok(Err(err)) => {
                tracing::warn!("Failed to save calculation history: {}", err);
                Some(format!("Calculation history not saved: {}", err))
            }
            Err(_) => {
                tracing::warn!(
                    "Saving calculation history timed out after {} ms",
                    limit.as_millis()
                );
                Some(format!(
                    "Calculation history not saved: timed out after {} ms",
                    limit.as_millis()
                ))
            }
        }
    }

    pub async fn lookup(&self, hts_number: &str) -> Result<HtsProduct, ApiError> {
        self.repository
            .get_product(hts_number)
            .await?
            .ok_or_else(|| ApiError::hts_not_found(hts_number))
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<HtsProduct>, ApiError> {
        self.repository.search_products(query, limit).await
    }

    pub async fn list_products(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HtsProduct>, ApiError> {
        self.repository.list_products(limit, offset).await
    }

    pub async fn upsert_product(&self, product: ProductUpsert) -> Result<UpsertOutcome, ApiError> {
        let outcome = self.repository.upsert_product(product).await?;
        tracing::info!(
            "{} HTS product {}",
            if outcome.was_inserted() { "Added" } else { "Updated" },
            outcome.product().hts_number
        );
        Ok(outcome)
    }

    pub async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        self.repository.list_countries().await
    }

    pub async fn history(
        &self,
        session_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CalculationHistoryRecord>, ApiError> {
        self.repository.list_history(session_id, limit).await
    }

    pub async fn statistics(&self) -> Result<TariffStatistics, ApiError> {
        let week_ago = Utc::now() - ChronoDuration::days(7);
        Ok(TariffStatistics {
            total_hts_products: self.repository.count_products().await?,
            total_countries: self.repository.count_countries().await?,
            total_calculations: self.repository.count_history(None).await?,
            recent_calculations: self.repository.count_history(Some(week_ago)).await?,
        })
    }

    pub async fn health(&self) -> TariffHealth {
        match self.repository.count_products().await {
            Ok(count) => TariffHealth {
                status: "healthy".to_string(),
                database_connected: true,
                total_hts_products: Some(count),
                error: None,
            },
            Err(err) => TariffHealth {
                status: "unhealthy".to_string(),
                database_connected: false,
                total_hts_products: None,
                error: Some(err.to_string()),
            },
        }
    }

    pub async fn import_csv_file(&self, path: &Path) -> Result<ImportSummary, ApiError> {
        if !path.is_file() {
            return Err(ApiError::NotFound(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }
        let file = std::fs::File::open(path).map_err(ApiError::internal)?;
        let summary = import_products(self.repository.as_ref(), file).await?;
        tracing::info!(
            "Bulk import of {} completed: {} imported, {} updated, {} errors",
            path.display(),
            summary.imported,
            summary.updated,
            summary.errors
        );
        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::duty::DutyKind;
    use async_trait::async_trait;
    use chrono::DateTime;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory repository; `history_delay` and `fail_history` exercise the
    /// best-effort history path, `fail_upsert_for` a failing import row.
    #[derive(Default)]
    pub(crate) struct MemoryRepository {
        pub(crate) products: Mutex<BTreeMap<String, HtsProduct>>,
        pub(crate) history: Mutex<Vec<NewHistoryRecord>>,
        pub fail_history: bool,
        pub history_delay: Option<Duration>,
        pub fail_upsert_for: Option<String>,
    }

    impl MemoryRepository {
        pub(crate) fn with_products(products: Vec<ProductUpsert>) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.products.lock().unwrap();
                for (index, product) in products.into_iter().enumerate() {
                    map.insert(product.hts_number.clone(), to_product(index as i64 + 1, product));
                }
            }
            repo
        }

        pub(crate) fn history_len(&self) -> usize {
            self.history.lock().unwrap().len()
        }
    }

    fn to_product(id: i64, upsert: ProductUpsert) -> HtsProduct {
        HtsProduct {
            id,
            hts_number: upsert.hts_number,
            description: upsert.description,
            unit_of_measure: upsert.unit_of_measure,
            general_duty_rate: upsert.general_duty_rate,
            special_duty_rate: upsert.special_duty_rate,
            column2_duty_rate: upsert.column2_duty_rate,
            additional_info: upsert.additional_info,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[async_trait]
    impl TariffRepository for MemoryRepository {
        async fn get_product(&self, hts_number: &str) -> Result<Option<HtsProduct>, ApiError> {
            Ok(self.products.lock().unwrap().get(hts_number).cloned())
        }

        async fn upsert_product(&self, product: ProductUpsert) -> Result<UpsertOutcome, ApiError> {
            if self.fail_upsert_for.as_deref() == Some(product.hts_number.as_str()) {
                return Err(ApiError::internal("disk I/O error"));
            }
            let mut map = self.products.lock().unwrap();
            let next_id = map.len() as i64 + 1;
            match map.get(&product.hts_number).map(|p| p.id) {
                Some(id) => {
                    let stored = to_product(id, product);
                    map.insert(stored.hts_number.clone(), stored.clone());
                    Ok(UpsertOutcome::Updated(stored))
                }
                None => {
                    let stored = to_product(next_id, product);
                    map.insert(stored.hts_number.clone(), stored.clone());
                    Ok(UpsertOutcome::Inserted(stored))
                }
            }
        }

        async fn search_products(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<HtsProduct>, ApiError> {
            let needle = query.to_lowercase();
            Ok(self
                .products
                .lock()
                .unwrap()
                .values()
                .filter(|p| {
                    p.hts_number.contains(&needle)
                        || p.description.to_lowercase().contains(&needle)
                })
                .take(limit)
                .cloned()
                .collect())
        }

        async fn list_products(
            &self,
            limit: usize,
            offset: usize,
        ) -> Result<Vec<HtsProduct>, ApiError> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .values()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn list_countries(&self) -> Result<Vec<Country>, ApiError> {
            Ok(crate::tariff::countries::default_countries())
        }

        async fn seed_countries(&self, _countries: &[Country]) -> Result<usize, ApiError> {
            Ok(0)
        }

        async fn append_history(&self, record: NewHistoryRecord) -> Result<(), ApiError> {
            if let Some(delay) = self.history_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_history {
                return Err(ApiError::internal("disk full"));
            }
            self.history.lock().unwrap().push(record);
            Ok(())
        }

        async fn list_history(
            &self,
            session_id: Option<&str>,
            limit: usize,
        ) -> Result<Vec<CalculationHistoryRecord>, ApiError> {
            let history = self.history.lock().unwrap();
            Ok(history
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, r)| session_id.map_or(true, |s| r.session_id == s))
                .take(limit)
                .map(|(index, r)| CalculationHistoryRecord {
                    id: index as i64 + 1,
                    session_id: r.session_id.clone(),
                    hts_number: r.hts_number.clone(),
                    country_code: r.country_code.clone(),
                    product_cost: r.product_cost,
                    freight: r.freight,
                    insurance: r.insurance,
                    quantity: r.quantity,
                    weight_kg: r.weight_kg,
                    cif_value: r.cif_value,
                    total_duty: r.total_duty,
                    landed_cost: r.landed_cost,
                    calculation_details: r.calculation_details.clone(),
                    created_at: String::new(),
                })
                .collect())
        }

        async fn count_products(&self) -> Result<u64, ApiError> {
            Ok(self.products.lock().unwrap().len() as u64)
        }

        async fn count_countries(&self) -> Result<u64, ApiError> {
            Ok(15)
        }

        async fn count_history(&self, _since: Option<DateTime<Utc>>) -> Result<u64, ApiError> {
            Ok(self.history.lock().unwrap().len() as u64)
        }
    }

    pub(crate) fn sample_products() -> Vec<ProductUpsert> {
        vec![
            ProductUpsert {
                hts_number: "0101.30.00.00".to_string(),
                description: "Asses".to_string(),
                unit_of_measure: Some("No.".to_string()),
                general_duty_rate: Some("Free".to_string()),
                special_duty_rate: None,
                column2_duty_rate: Some("20%".to_string()),
                additional_info: None,
            },
            ProductUpsert {
                hts_number: "0201.10.10.00".to_string(),
                description: "Carcasses and half-carcasses of bovine animals".to_string(),
                unit_of_measure: Some("kg".to_string()),
                general_duty_rate: Some("26.4%".to_string()),
                special_duty_rate: Some("See chapter notes".to_string()),
                column2_duty_rate: Some("30%".to_string()),
                additional_info: None,
            },
            ProductUpsert {
                hts_number: "0102.29.40.00".to_string(),
                description: "Cattle, other, weighing 320 kg or more each".to_string(),
                unit_of_measure: Some("No. kg".to_string()),
                general_duty_rate: Some("4.5¢/kg".to_string()),
                special_duty_rate: Some("$2/unit".to_string()),
                column2_duty_rate: Some("5.5¢/kg".to_string()),
                additional_info: None,
            },
        ]
    }

    fn service_with(repo: MemoryRepository) -> (Arc<MemoryRepository>, TariffService) {
        let repo = Arc::new(repo);
        let service = TariffService::new(
            repo.clone(),
            TariffSettings {
                history_write_timeout: Duration::from_millis(50),
            },
        );
        (repo, service)
    }

    fn inputs(
        hts_number: &str,
        cost: Decimal,
        freight: Decimal,
        insurance: Decimal,
    ) -> CalculationInputs {
        CalculationInputs {
            hts_number: hts_number.to_string(),
            product_cost: cost,
            freight,
            insurance,
            quantity: 5,
            weight_kg: dec!(500),
            country_code: "AU".to_string(),
        }
    }

    fn calc(amount: Decimal, applicable: bool) -> DutyCalculation {
        DutyCalculation {
            kind: DutyKind::Percentage,
            original_text: String::new(),
            components: Vec::new(),
            total_amount: amount,
            effective_rate_percent: 0.0,
            is_applicable: applicable,
            notes: Vec::new(),
        }
    }

    #[test]
    fn selection_prefers_lowest_applicable_amount() {
        let general = calc(dec!(50.00), true);
        let special = calc(dec!(22.50), true);
        let column2 = calc(dec!(0.00), false);

        let chosen = select_applicable(&general, &special, &column2);
        assert_eq!(chosen.total_amount, dec!(22.50));
        assert!(std::ptr::eq(chosen, &special));
    }

    #[test]
    fn selection_keeps_first_on_ties_and_when_nothing_applies() {
        let general = calc(dec!(10.00), true);
        let special = calc(dec!(10.00), true);
        let column2 = calc(dec!(99.00), true);
        assert!(std::ptr::eq(
            select_applicable(&general, &special, &column2),
            &general
        ));

        let general = calc(dec!(0.00), false);
        let special = calc(dec!(0.00), false);
        let column2 = calc(dec!(0.00), false);
        let chosen = select_applicable(&general, &special, &column2);
        assert!(std::ptr::eq(chosen, &general));
        assert!(!chosen.is_applicable);
    }

    #[tokio::test]
    async fn free_product_has_no_duty() {
        let (repo, service) = service_with(MemoryRepository::with_products(sample_products()));

        let report = service
            .calculate_duties(
                &inputs("0101.30.00.00", dec!(10000), dec!(500), dec!(100)),
                Some("session-1"),
            )
            .await
            .unwrap();

        let summary = &report.outcome.summary;
        assert_eq!(summary.cif_value.to_string(), "10600.00");
        assert_eq!(summary.total_duty, dec!(0));
        assert_eq!(summary.landed_cost.to_string(), "10600.00");
        assert!(summary.duty_calculable);
        assert_eq!(report.outcome.duty_results.applicable.kind, DutyKind::Free);
        assert!(report.history_warning.is_none());
        assert_eq!(repo.history_len(), 1);
    }

    #[tokio::test]
    async fn percentage_product_scenario() {
        let (repo, service) = service_with(MemoryRepository::with_products(sample_products()));

        let report = service
            .calculate_duties(
                &inputs("0201.10.10.00", dec!(20000), dec!(1000), dec!(300)),
                None,
            )
            .await
            .unwrap();

        let summary = &report.outcome.summary;
        assert_eq!(summary.cif_value.to_string(), "21300.00");
        assert_eq!(summary.total_duty.to_string(), "5623.20");
        assert_eq!(summary.landed_cost.to_string(), "26923.20");
        assert!((summary.effective_duty_rate - 26.4).abs() < 1e-9);
        assert!(!report.outcome.duty_results.special.is_applicable);
        assert_eq!(repo.history_len(), 0);
    }

    #[tokio::test]
    async fn specific_rates_pick_cheapest_column() {
        let (_repo, service) = service_with(MemoryRepository::with_products(sample_products()));

        let report = service
            .calculate_duties(&inputs("0102.29.40.00", dec!(3000), dec!(0), dec!(0)), None)
            .await
            .unwrap();

        // 4.5¢/kg × 500kg = 22.50, $2/unit × 5 = 10.00, 5.5¢/kg × 500kg = 27.50
        let results = &report.outcome.duty_results;
        assert_eq!(results.general.total_amount, dec!(22.50));
        assert_eq!(results.special.total_amount, dec!(10.00));
        assert_eq!(results.column2.total_amount, dec!(27.50));
        assert_eq!(results.applicable, results.special);
        assert_eq!(report.outcome.summary.landed_cost, dec!(3010.00));
    }

    #[tokio::test]
    async fn unknown_hts_number_is_not_found() {
        let (_repo, service) = service_with(MemoryRepository::with_products(sample_products()));

        let err = service
            .calculate_duties(&inputs("9999.99.99.99", dec!(1), dec!(0), dec!(0)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg.contains("9999.99.99.99")));
    }

    #[tokio::test]
    async fn cif_past_decimal_range_is_bad_request() {
        let (repo, service) = service_with(MemoryRepository::with_products(sample_products()));

        let err = service
            .calculate_duties(
                &inputs("0101.30.00.00", Decimal::MAX, dec!(1), dec!(0)),
                Some("session-1"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("CIF value")));
        assert_eq!(repo.history_len(), 0);
    }

    #[tokio::test]
    async fn failed_history_write_is_only_a_warning() {
        let repo = MemoryRepository {
            fail_history: true,
            ..MemoryRepository::with_products(sample_products())
        };
        let (_repo, service) = service_with(repo);

        let report = service
            .calculate_duties(
                &inputs("0101.30.00.00", dec!(10000), dec!(500), dec!(100)),
                Some("session-1"),
            )
            .await
            .unwrap();

        assert_eq!(report.outcome.summary.landed_cost, dec!(10600.00));
        let warning = report.history_warning.unwrap();
        assert!(warning.contains("disk full"));
    }

    #[tokio::test]
    async fn slow_history_write_is_time_bounded() {
        let repo = MemoryRepository {
            history_delay: Some(Duration::from_secs(5)),
            ..MemoryRepository::with_products(sample_products())
        };
        let (repo, service) = service_with(repo);

        let started = std::time::Instant::now();
        let report = service
            .calculate_duties(
                &inputs("0101.30.00.00", dec!(10000), dec!(500), dec!(100)),
                Some("session-1"),
            )
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(report.history_warning.unwrap().contains("timed out"));
        assert_eq!(repo.history_len(), 0);
    }

    #[tokio::test]
    async fn statistics_and_health_report_counts() {
        let (_repo, service) = service_with(MemoryRepository::with_products(sample_products()));
        service
            .calculate_duties(
                &inputs("0101.30.00.00", dec!(100), dec!(0), dec!(0)),
                Some("s"),
            )
            .await
            .unwrap();

        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.total_hts_products, 3);
        assert_eq!(stats.total_countries, 15);
        assert_eq!(stats.total_calculations, 1);
        assert_eq!(stats.recent_calculations, 1);

        let health = service.health().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.total_hts_products, Some(3));
    }

    #[tokio::test]
    async fn import_of_missing_file_is_not_found() {
        let (_repo, service) = service_with(MemoryRepository::default());
        let err = service
            .import_csv_file(Path::new("/nonexistent/hts.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
