use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of a whole rate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyKind {
    Free,
    Percentage,
    SpecificWeight,
    SpecificUnit,
    Compound,
    Complex,
    Unparseable,
}

/// Classification of one atomic term inside a rate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Free,
    Percentage,
    SpecificWeight,
    SpecificUnit,
}

impl From<ComponentKind> for DutyKind {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Free => DutyKind::Free,
            ComponentKind::Percentage => DutyKind::Percentage,
            ComponentKind::SpecificWeight => DutyKind::SpecificWeight,
            ComponentKind::SpecificUnit => DutyKind::SpecificUnit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyComponent {
    pub kind: ComponentKind,
    /// Percent, cents per kilogram or dollars per unit depending on `kind`.
    pub numeric_rate: Decimal,
    pub unit_label: String,
    pub description: String,
    pub computed_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyCalculation {
    pub kind: DutyKind,
    pub original_text: String,
    pub components: Vec<DutyComponent>,
    pub total_amount: Decimal,
    pub effective_rate_percent: f64,
    pub is_applicable: bool,
    pub notes: Vec<String>,
}

/// Commercial quantities a rate string is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyBasis {
    pub cif_value: Decimal,
    pub weight_kg: Option<Decimal>,
    pub quantity: Option<u32>,
}

impl DutyBasis {
    pub fn new(cif_value: Decimal, weight_kg: Option<Decimal>, quantity: Option<u32>) -> Self {
        Self {
            cif_value,
            weight_kg,
            quantity,
        }
    }
}
