use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::matchers::{
    compound_marker, compound_splitter, program_indicators, term_matchers, whitespace_run,
    DutyTerm,
};
use super::money::{
    cents_per_kg_amount, display_dollars, effective_rate_percent, per_unit_amount, percent_of,
};
use super::types::{ComponentKind, DutyBasis, DutyCalculation, DutyComponent, DutyKind};

const FREE_NOTE: &str = "Product qualifies for duty-free entry";
const COMPLEX_NOTE: &str = "Complex duty structure - manual verification recommended";
const UNPARSEABLE_NOTE: &str = "Error: Unable to parse duty structure";

/// Why a recognized term produced no amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    WeightRequired,
    QuantityRequired,
    OutOfRange,
}

impl Skip {
    fn message(self) -> &'static str {
        match self {
            Skip::WeightRequired => "Weight required for weight-based duty",
            Skip::QuantityRequired => "Quantity required for unit-based duty",
            Skip::OutOfRange => "Duty amount out of range",
        }
    }
}

struct NormalizedRate {
    text: String,
    indicators: Vec<String>,
}

/// Evaluates one duty-rate column against the given basis.
///
/// Total for every input: malformed or unsupported text comes back as a
/// calculation with `is_applicable == false` and explanatory notes.
pub fn parse_duty_rate(rate_text: Option<&str>, basis: &DutyBasis) -> DutyCalculation {
    let original_text = rate_text.map(str::trim).unwrap_or_default().to_string();
    let normalized = normalize(&original_text);

    let mut calculation = classify(&normalized.text, basis);
    calculation.original_text = original_text;
    if !normalized.indicators.is_empty() {
        calculation.notes.push(format!(
            "Special program indicators: {}",
            normalized.indicators.join(", ")
        ));
    }

    tracing::debug!(
        rate = %calculation.original_text,
        kind = ?calculation.kind,
        applicable = calculation.is_applicable,
        total = %calculation.total_amount,
        "Classified duty rate"
    );
    calculation
}

fn normalize(text: &str) -> NormalizedRate {
    let lower = text.to_lowercase();
    let indicators = program_indicators()
        .captures_iter(&lower)
        .filter_map(|caps| caps.get(1))
        .flat_map(|codes| codes.as_str().split(','))
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect();
    let stripped = program_indicators().replace_all(&lower, " ");
    let text = whitespace_run()
        .replace_all(stripped.trim(), " ")
        .into_owned();

    NormalizedRate { text, indicators }
}

fn is_free(text: &str) -> bool {
    matches!(text, "" | "free" | "0" | "0%")
}

fn classify(text: &str, basis: &DutyBasis) -> DutyCalculation {
    if is_free(text) {
        return free_calculation();
    }
    if compound_marker().is_match(text) {
        return compound_calculation(text, basis);
    }
    if let Some(term) = term_matchers().iter().find_map(|m| m.match_whole(text)) {
        return single_calculation(term, basis);
    }
    complex_calculation(text, basis)
}

fn free_calculation() -> DutyCalculation {
    DutyCalculation {
        kind: DutyKind::Free,
        original_text: String::new(),
        components: vec![DutyComponent {
            kind: ComponentKind::Free,
            numeric_rate: Decimal::ZERO,
            unit_label: String::new(),
            description: "Free".to_string(),
            computed_amount: Decimal::new(0, 2),
        }],
        total_amount: Decimal::new(0, 2),
        effective_rate_percent: 0.0,
        is_applicable: true,
        notes: vec![FREE_NOTE.to_string()],
    }
}

fn single_calculation(term: DutyTerm, basis: &DutyBasis) -> DutyCalculation {
    let kind = DutyKind::from(term.kind());
    match evaluate(term, basis) {
        Ok(component) => {
            let total_amount = component.computed_amount;
            // a lone percentage reports its nominal rate, not amount / cif
            let effective_rate = match term {
                DutyTerm::Percentage { rate_percent } => decimal_to_f64(rate_percent),
                _ => effective_rate_percent(total_amount, basis.cif_value),
            };
            DutyCalculation {
                kind,
                original_text: String::new(),
                components: vec![component],
                total_amount,
                effective_rate_percent: effective_rate,
                is_applicable: true,
                notes: Vec::new(),
            }
        }
        Err(skip) => not_applicable(kind, vec![format!("Error: {}", skip.message())]),
    }
}

fn compound_calculation(text: &str, basis: &DutyBasis) -> DutyCalculation {
    let mut components = Vec::new();
    let mut skipped = Vec::new();
    let mut recognized = 0usize;

    for part in compound_splitter().split(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some(term) = term_matchers().iter().find_map(|m| m.find_first(part)) else {
            tracing::debug!(part, "Dropping unrecognized compound duty part");
            continue;
        };
        recognized += 1;
        match evaluate(term, basis) {
            Ok(component) => components.push(component),
            Err(skip) => skipped.push(format!("Skipped '{}': {}", part, skip.message())),
        }
    }

    if components.is_empty() {
        let mut notes = skipped;
        if recognized == 0 {
            notes.push(UNPARSEABLE_NOTE.to_string());
        }
        return not_applicable(DutyKind::Compound, notes);
    }

    let mut notes = vec![format!("Compound duty with {} components", components.len())];
    notes.extend(skipped);
    aggregate(DutyKind::Compound, components, basis, notes)
}

fn complex_calculation(text: &str, basis: &DutyBasis) -> DutyCalculation {
    let terms: Vec<DutyTerm> = term_matchers()
        .iter()
        .flat_map(|m| m.find_all(text))
        .collect();
    if terms.is_empty() {
        return not_applicable(DutyKind::Unparseable, vec![UNPARSEABLE_NOTE.to_string()]);
    }

    let mut components = Vec::new();
    let mut notes = vec![COMPLEX_NOTE.to_string()];
    for term in terms {
        match evaluate(term, basis) {
            Ok(mut component) => {
                component.description.push_str(" (estimated)");
                components.push(component);
            }
            Err(skip) => notes.push(format!("Skipped component: {}", skip.message())),
        }
    }

    if components.is_empty() {
        return not_applicable(DutyKind::Complex, notes);
    }
    aggregate(DutyKind::Complex, components, basis, notes)
}

fn aggregate(
    kind: DutyKind,
    components: Vec<DutyComponent>,
    basis: &DutyBasis,
    notes: Vec<String>,
) -> DutyCalculation {
    let total = components
        .iter()
        .try_fold(Decimal::new(0, 2), |sum, component| {
            sum.checked_add(component.computed_amount)
        });
    let Some(total_amount) = total else {
        let mut notes = notes;
        notes.push(format!("Error: {}", Skip::OutOfRange.message()));
        return not_applicable(kind, notes);
    };
    DutyCalculation {
        kind,
        original_text: String::new(),
        components,
        total_amount,
        effective_rate_percent: effective_rate_percent(total_amount, basis.cif_value),
        is_applicable: true,
        notes,
    }
}

fn not_applicable(kind: DutyKind, notes: Vec<String>) -> DutyCalculation {
    DutyCalculation {
        kind,
        original_text: String::new(),
        components: Vec::new(),
        total_amount: Decimal::new(0, 2),
        effective_rate_percent: 0.0,
        is_applicable: false,
        notes,
    }
}

fn evaluate(term: DutyTerm, basis: &DutyBasis) -> Result<DutyComponent, Skip> {
    match term {
        DutyTerm::Percentage { rate_percent } => {
            let amount = percent_of(basis.cif_value, rate_percent).ok_or(Skip::OutOfRange)?;
            Ok(DutyComponent {
                kind: ComponentKind::Percentage,
                numeric_rate: rate_percent,
                unit_label: "%".to_string(),
                description: format!("{}% of CIF value", rate_percent.normalize()),
                computed_amount: amount,
            })
        }
        DutyTerm::SpecificWeight { cents_per_kg } => {
            let weight_kg = basis.weight_kg.ok_or(Skip::WeightRequired)?;
            let amount = cents_per_kg_amount(cents_per_kg, weight_kg).ok_or(Skip::OutOfRange)?;
            Ok(DutyComponent {
                kind: ComponentKind::SpecificWeight,
                numeric_rate: cents_per_kg,
                unit_label: "¢/kg".to_string(),
                description: format!(
                    "{}¢/kg × {}kg",
                    cents_per_kg.normalize(),
                    weight_kg.normalize()
                ),
                computed_amount: amount,
            })
        }
        DutyTerm::SpecificUnit { dollars_per_unit } => {
            let quantity = basis.quantity.ok_or(Skip::QuantityRequired)?;
            let amount = per_unit_amount(dollars_per_unit, quantity).ok_or(Skip::OutOfRange)?;
            let noun = if quantity == 1 { "unit" } else { "units" };
            Ok(DutyComponent {
                kind: ComponentKind::SpecificUnit,
                numeric_rate: dollars_per_unit,
                unit_label: "$/unit".to_string(),
                description: format!(
                    "${}/unit × {} {}",
                    display_dollars(dollars_per_unit),
                    quantity,
                    noun
                ),
                computed_amount: amount,
            })
        }
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
