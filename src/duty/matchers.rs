//! Term recognizers for rate strings.
//!
//! Each matcher pairs a whole-string pattern (used when the entire rate is a
//! single term) with a search pattern (used inside compound parts and for
//! complex scans). Patterns assume already normalized, lowercased text.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::types::ComponentKind;

const NUMBER: &str = r"(\d+(?:\.\d+)?)";
const PERCENT_TAIL: &str = r"\s*%";
const WEIGHT_TAIL: &str = r"\s*(?:¢|cents?)\s*(?:/|per)\s*kg\b";
const UNIT_HEAD: &str = r"\$?\s*";
const UNIT_TAIL: &str = r"\s*(?:dollars?\s*)?(?:/\s*|per\s+)units?\b";

/// One atomic, computable duty term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyTerm {
    Percentage { rate_percent: Decimal },
    SpecificWeight { cents_per_kg: Decimal },
    SpecificUnit { dollars_per_unit: Decimal },
}

impl DutyTerm {
    pub fn kind(&self) -> ComponentKind {
        match self {
            DutyTerm::Percentage { .. } => ComponentKind::Percentage,
            DutyTerm::SpecificWeight { .. } => ComponentKind::SpecificWeight,
            DutyTerm::SpecificUnit { .. } => ComponentKind::SpecificUnit,
        }
    }
}

pub struct TermMatcher {
    whole: Regex,
    search: Regex,
    build: fn(Decimal) -> DutyTerm,
}

impl TermMatcher {
    fn new(head: &str, tail: &str, build: fn(Decimal) -> DutyTerm) -> Self {
        Self {
            whole: Regex::new(&format!(r"^{head}{NUMBER}{tail}$"))
                .expect("whole-term regex compiles"),
            search: Regex::new(&format!(r"{head}{NUMBER}{tail}"))
                .expect("term search regex compiles"),
            build,
        }
    }

    /// The term when `text` consists of exactly this term.
    pub fn match_whole(&self, text: &str) -> Option<DutyTerm> {
        let caps = self.whole.captures(text)?;
        parse_number(caps.get(1)?.as_str()).map(self.build)
    }

    pub fn find_first(&self, text: &str) -> Option<DutyTerm> {
        self.find_all(text).into_iter().next()
    }

    pub fn find_all(&self, text: &str) -> Vec<DutyTerm> {
        self.search
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| parse_number(m.as_str()))
            .map(self.build)
            .collect()
    }
}

/// Matchers in classification priority: percentage, weight, unit.
pub fn term_matchers() -> &'static [TermMatcher; 3] {
    static MATCHERS: OnceLock<[TermMatcher; 3]> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        [
            TermMatcher::new("", PERCENT_TAIL, |rate_percent| DutyTerm::Percentage {
                rate_percent,
            }),
            TermMatcher::new("", WEIGHT_TAIL, |cents_per_kg| DutyTerm::SpecificWeight {
                cents_per_kg,
            }),
            TermMatcher::new(UNIT_HEAD, UNIT_TAIL, |dollars_per_unit| {
                DutyTerm::SpecificUnit { dollars_per_unit }
            }),
        ]
    })
}

pub fn compound_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+|&|\bplus\b").expect("compound marker regex compiles"))
}

pub fn compound_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*[+&]\s*|\s*,\s*|\s+plus\s+").expect("compound splitter regex compiles")
    })
}

/// Parenthetical lists of trade program codes, e.g. `(a+,au,ca)`.
pub fn program_indicators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(\s*([a-z]{1,2}[+*]?(?:\s*,\s*[a-z]{1,2}[+*]?)*)\s*\)")
            .expect("program indicator regex compiles")
    })
}

pub fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex compiles"))
}

fn parse_number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw).ok()
}
