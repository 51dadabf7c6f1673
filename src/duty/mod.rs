//! Duty-rate interpretation and customs valuation arithmetic.

pub mod matchers;
pub mod money;
pub mod parser;
pub mod types;

pub use money::{compute_cif, compute_landed_cost, round2};
pub use parser::parse_duty_rate;
pub use types::{ComponentKind, DutyBasis, DutyCalculation, DutyComponent, DutyKind};
