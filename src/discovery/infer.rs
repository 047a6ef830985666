//! Column type inference over sampled cell values

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Type assigned to a sampled column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InferredType {
    Integer,
    Double,
    Varchar,
}

impl InferredType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String form of a cell value (strings unquoted)
#[must_use]
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Classify a column from its non-null sample values
///
/// Numeric only when every value is an optional leading `-` followed by ASCII digits with at
/// most one `.`. Exponents, separators and currency symbols all fall back to `VARCHAR`.
#[must_use]
pub fn infer(values: &[Value]) -> InferredType {
    if values.is_empty() {
        return InferredType::Varchar;
    }

    let forms: Vec<String> = values.iter().map(string_form).collect();
    if !forms.iter().all(|s| is_simple_number(s)) {
        return InferredType::Varchar;
    }

    if forms.iter().any(|s| s.contains('.')) {
        InferredType::Double
    } else {
        InferredType::Integer
    }
}

fn is_simple_number(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);

    let mut digits = 0usize;
    let mut points = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }

    digits > 0 && points <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| json!(v)).collect()
    }

    #[test]
    fn test_empty_is_varchar() {
        assert_eq!(infer(&[]), InferredType::Varchar);
    }

    #[test]
    fn test_all_digits_is_integer() {
        assert_eq!(infer(&strings(&["1", "2", "3"])), InferredType::Integer);
        assert_eq!(infer(&strings(&["-7", "0", "0042"])), InferredType::Integer);
    }

    #[test]
    fn test_any_decimal_point_is_double() {
        assert_eq!(infer(&strings(&["1.5", "2"])), InferredType::Double);
        assert_eq!(infer(&strings(&["-0.25", ".5", "3."])), InferredType::Double);
    }

    #[test]
    fn test_any_text_is_varchar() {
        assert_eq!(infer(&strings(&["1", "x"])), InferredType::Varchar);
    }

    #[test]
    fn test_rejected_numeric_notations() {
        for text in ["1e5", "1,000", "$5", "1.2.3", "--1", "1-", "-", ".", "", " 1", "+1"] {
            assert_eq!(infer(&strings(&[text])), InferredType::Varchar, "{text:?}");
        }
    }

    #[test]
    fn test_non_string_values_use_their_string_form() {
        assert_eq!(infer(&[json!(1), json!(2)]), InferredType::Integer);
        assert_eq!(infer(&[json!(1), json!(2.5)]), InferredType::Double);
        assert_eq!(infer(&[json!(true)]), InferredType::Varchar);
    }

    #[test]
    fn test_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&InferredType::Double).unwrap(), r#""DOUBLE""#);
        assert_eq!(InferredType::Integer.to_string(), "INTEGER");
    }
}
