//! Tariff schedule storage, duty orchestration and bulk import.

pub mod countries;
pub mod import;
pub mod repository;
pub mod service;
pub mod sqlite;
pub mod validation;

pub use import::{import_products, ImportSummary};
pub use repository::{
    CalculationHistoryRecord, Country, HtsProduct, NewHistoryRecord, ProductUpsert,
    TariffRepository, UpsertOutcome,
};
pub use service::{
    select_applicable, CalculationInputs, CalculationOutcome, CalculationReport, TariffService,
};
pub use sqlite::SqliteTariffStore;
