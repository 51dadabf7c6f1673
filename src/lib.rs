//! HTS tariff backend: duty-rate evaluation, landed-cost calculation and a
//! document-grounded assistant over the Harmonized Tariff Schedule.

pub mod core;
pub mod duty;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tariff;
