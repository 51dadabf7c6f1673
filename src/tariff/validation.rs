//! Request payloads for the tariff HTTP surface and their validation.
//!
//! Every check here happens before the service is called; the service and
//! the duty engine assume inputs that already passed.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::repository::ProductUpsert;
use super::service::CalculationInputs;
use crate::core::errors::ApiError;

pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 100;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Upper bound (one trillion) for every money and weight field of a calculation.
pub const MAX_INPUT_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    pub hts_number: String,
    pub product_cost: Decimal,
    #[serde(default)]
    pub freight: Decimal,
    #[serde(default)]
    pub insurance: Decimal,
    pub quantity: i64,
    pub weight_kg: Decimal,
    #[serde(default = "default_country")]
    pub country_code: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl CalculateRequest {
    /// Checked inputs plus the caller's session id, if any.
    pub fn validate(self) -> Result<(CalculationInputs, Option<String>), ApiError> {
        let hts_number = validate_hts_number(&self.hts_number)?;
        let country_code = validate_country_code(&self.country_code)?;

        if self.product_cost <= Decimal::ZERO {
            return Err(field_error("product_cost", "must be greater than 0"));
        }
        if self.freight < Decimal::ZERO {
            return Err(field_error("freight", "must not be negative"));
        }
        if self.insurance < Decimal::ZERO {
            return Err(field_error("insurance", "must not be negative"));
        }
        if self.weight_kg <= Decimal::ZERO {
            return Err(field_error("weight_kg", "must be greater than 0"));
        }
        for (field, value) in [
            ("product_cost", self.product_cost),
            ("freight", self.freight),
            ("insurance", self.insurance),
            ("weight_kg", self.weight_kg),
        ] {
            if value > MAX_INPUT_AMOUNT {
                return Err(field_error(
                    field,
                    &format!("must not exceed {}", MAX_INPUT_AMOUNT),
                ));
            }
        }
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| field_error("quantity", "must be a positive whole number"))?;

        let session_id = self
            .session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok((
            CalculationInputs {
                hts_number,
                product_cost: self.product_cost,
                freight: self.freight,
                insurance: self.insurance,
                quantity,
                weight_kg: self.weight_kg,
                country_code,
            },
            session_id,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl SearchRequest {
    pub fn validate(self) -> Result<(String, usize), ApiError> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(field_error("query", "cannot be empty"));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.limit) {
            return Err(field_error(
                "limit",
                &format!("must be between 1 and {}", MAX_SEARCH_LIMIT),
            ));
        }
        Ok((query, self.limit))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
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
    pub additional_info: Option<serde_json::Value>,
}

impl ProductRequest {
    pub fn validate(self) -> Result<ProductUpsert, ApiError> {
        let hts_number = validate_hts_number(&self.hts_number)?;
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(field_error("description", "cannot be empty"));
        }
        if let Some(info) = &self.additional_info {
            if !info.is_object() {
                return Err(field_error("additional_info", "must be a JSON object"));
            }
        }
        Ok(ProductUpsert {
            hts_number,
            description,
            unit_of_measure: optional_text(self.unit_of_measure),
            general_duty_rate: optional_text(self.general_duty_rate),
            special_duty_rate: optional_text(self.special_duty_rate),
            column2_duty_rate: optional_text(self.column2_duty_rate),
            additional_info: self.additional_info,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub csv_file_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 1000)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 1000)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Trims and checks an HTS number: digits and dots, at least 8 digits.
pub fn validate_hts_number(raw: &str) -> Result<String, ApiError> {
    let hts_number = raw.trim();
    if hts_number.is_empty() {
        return Err(field_error("hts_number", "cannot be empty"));
    }
    if !hts_number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(field_error("hts_number", "may only contain digits and dots"));
    }
    if hts_number.chars().filter(char::is_ascii_digit).count() < 8 {
        return Err(field_error("hts_number", "appears to be too short"));
    }
    Ok(hts_number.to_string())
}

pub fn validate_country_code(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_ascii_uppercase();
    if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(field_error("country_code", "should be 2-3 letters"));
    }
    Ok(code)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn field_error(field: &str, message: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid '{}': {}", field, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request(overrides: serde_json::Value) -> CalculateRequest {
        let mut body = json!({
            "hts_number": " 0101.30.00.00 ",
            "product_cost": 10000,
            "quantity": 5,
            "weight_kg": 500.0,
            "country_code": "au"
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_request_is_normalized() {
        let (inputs, session_id) = request(json!({})).validate().unwrap();
        assert_eq!(inputs.hts_number, "0101.30.00.00");
        assert_eq!(inputs.country_code, "AU");
        assert_eq!(inputs.freight, dec!(0));
        assert_eq!(inputs.insurance, dec!(0));
        assert_eq!(inputs.quantity, 5);
        assert!(session_id.is_none());
    }

    #[test]
    fn country_defaults_to_us() {
        let body = json!({
            "hts_number": "0101.30.00.00",
            "product_cost": 1,
            "quantity": 1,
            "weight_kg": 1
        });
        let req: CalculateRequest = serde_json::from_value(body).unwrap();
        let (inputs, _) = req.validate().unwrap();
        assert_eq!(inputs.country_code, "US");
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        for (field, value) in [
            ("product_cost", json!(0)),
            ("freight", json!(-1)),
            ("insurance", json!(-0.01)),
            ("quantity", json!(0)),
            ("quantity", json!(-3)),
            ("weight_kg", json!(0)),
        ] {
            let mut overrides = serde_json::Map::new();
            overrides.insert(field.to_string(), value);
            let err = request(serde_json::Value::Object(overrides))
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains(field), "{} -> {}", field, err);
        }
    }

    #[test]
    fn rejects_amounts_above_the_ceiling() {
        for field in ["product_cost", "freight", "insurance", "weight_kg"] {
            let mut overrides = serde_json::Map::new();
            overrides.insert(field.to_string(), json!("79228162514264337593543950335"));
            let err = request(serde_json::Value::Object(overrides))
                .validate()
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
            assert!(err.to_string().contains(field), "{} -> {}", field, err);
        }

        let (inputs, _) = request(json!({ "product_cost": "1000000000000" }))
            .validate()
            .unwrap();
        assert_eq!(inputs.product_cost, MAX_INPUT_AMOUNT);
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(validate_hts_number("   ").is_err());
        assert!(validate_hts_number("0101.30").is_err());
        assert!(validate_hts_number("0101.3O.00.00").is_err());
        assert_eq!(validate_hts_number("01013000").unwrap(), "01013000");

        assert!(validate_country_code("A").is_err());
        assert!(validate_country_code("ABCD").is_err());
        assert!(validate_country_code("A1").is_err());
        assert_eq!(validate_country_code(" gb ").unwrap(), "GB");
    }

    #[test]
    fn search_limits_are_bounded() {
        let ok = SearchRequest { query: " beef ".into(), limit: 20 }.validate().unwrap();
        assert_eq!(ok, ("beef".to_string(), 20));
        assert!(SearchRequest { query: "  ".into(), limit: 20 }.validate().is_err());
        assert!(SearchRequest { query: "x".into(), limit: 0 }.validate().is_err());
        assert!(SearchRequest { query: "x".into(), limit: 101 }.validate().is_err());
    }

    #[test]
    fn product_request_blank_rates_become_none() {
        let product = ProductRequest {
            hts_number: "0101.30.00.00".into(),
            description: "Asses".into(),
            unit_of_measure: Some("No.".into()),
            general_duty_rate: Some("  ".into()),
            special_duty_rate: None,
            column2_duty_rate: Some("20%".into()),
            additional_info: None,
        }
        .validate()
        .unwrap();
        assert_eq!(product.general_duty_rate, None);
        assert_eq!(product.column2_duty_rate.as_deref(), Some("20%"));
    }
}
