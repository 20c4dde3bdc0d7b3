//! Reusable field validators.
//!
//! Each validator takes the loosely typed inbound value (and usually the field
//! name used in messages) and either returns the validated, possibly coerced,
//! value or a [`ValidationFailure`]. Callers must use the returned value:
//! numeric validators coerce well-formed numeric strings before checking them.
//!
//! Absent fields are passed as [`Value::Null`], e.g.
//! `body.get("email").unwrap_or(&Value::Null)`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::error::ShieldError;
use crate::validation::failure::{type_name, FieldResult, ValidationFailure};

/// Upper bound accepted by [`validate_price`].
pub const MAX_PRICE: f64 = 999_999.99;

/// Minimum password length accepted by [`validate_password`].
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Single-line `local@domain.tld`: no whitespace and exactly one `@`.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_REGEX: invalid regex pattern")
});

// Optional country code followed by a ten digit national number.
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+58|0058|58)?[0-9]{10}$").expect("PHONE_REGEX: invalid regex pattern")
});

// Character set only; the letter and digit requirements are checked separately.
static PASSWORD_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9@$!%*#?&]+$").expect("PASSWORD_CHARSET_REGEX: invalid regex pattern")
});

static DECIMAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("DECIMAL_REGEX: invalid regex pattern")
});

const PHONE_EXAMPLES: [&str; 3] = ["4141234567", "584141234567", "+584141234567"];

/// Coerce a loosely typed value to a number the way JavaScript's `Number()`
/// does for scalars. Returns `None` where that conversion yields `NaN`.
///
/// Blank strings and `null` coerce to `0`, booleans to `0`/`1`, and strings
/// accept decimal, exponent, `0x`/`0o`/`0b` and `Infinity` forms. Arrays and
/// objects never coerce.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => coerce_str(s),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).ok().map(|n| n as f64);
    }
    if DECIMAL_REGEX.is_match(s) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

/// Render a coerced number back into JSON, keeping integral values integral.
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        if n >= 0.0 {
            return json!(n as u64);
        }
        return json!(n as i64);
    }
    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// JavaScript falsiness, used by the optional validators to decide absence.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0 || f.is_nan()).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn type_failure(value: &Value, field: &str, kind: &str) -> ValidationFailure {
    ValidationFailure::new(field, format!("{field} must be a {kind}"), json!(type_name(value)))
        .with_rule(format!("{kind} required"))
}

/// Fails on `null`, a blank string or an empty array.
pub fn validate_required(value: &Value, field: &str) -> FieldResult<()> {
    match value {
        Value::Null => Err(ValidationFailure::new(field, format!("{field} is required"), Value::Null)
            .with_rule("required")),
        Value::String(s) if s.trim().is_empty() => Err(ValidationFailure::new(
            field,
            format!("{field} cannot be empty"),
            value.clone(),
        )
        .with_rule("non-empty string")),
        Value::Array(items) if items.is_empty() => Err(ValidationFailure::new(
            field,
            format!("{field} cannot be empty"),
            value.clone(),
        )
        .with_rule("non-empty array")),
        _ => Ok(()),
    }
}

/// Validate a positive numeric identifier and return it coerced.
pub fn validate_id(value: &Value, field: &str) -> FieldResult<f64> {
    if value.is_null() {
        return Err(ValidationFailure::new(field, format!("{field} is required"), Value::Null)
            .with_rule("required"));
    }

    let id = match coerce_number(value) {
        Some(n) if n.is_finite() => n,
        _ => {
            return Err(ValidationFailure::new(
                field,
                format!("{field} must be a number"),
                value.clone(),
            )
            .with_rule("numeric value required"))
        }
    };

    if id <= 0.0 {
        return Err(ValidationFailure::new(field, format!("{field} must be positive"), number_value(id))
            .with_rule("positive number required"));
    }

    Ok(id)
}

pub fn validate_email(value: &Value, field: &str) -> FieldResult<()> {
    if is_falsy(value) {
        return Err(ValidationFailure::new(field, format!("{field} is required"), value.clone())
            .with_rule("required"));
    }

    let email = value.as_str().ok_or_else(|| type_failure(value, field, "string"))?;

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationFailure::new(field, format!("{field} format is invalid"), value.clone())
            .with_rule("valid email format required")
            .with_context("example", "user@example.com"));
    }

    Ok(())
}

pub fn validate_min_length(value: &Value, min_length: usize, field: &str) -> FieldResult<()> {
    let s = value.as_str().ok_or_else(|| type_failure(value, field, "string"))?;
    let length = s.chars().count();

    if length < min_length {
        return Err(ValidationFailure::new(
            field,
            format!("{field} must be at least {min_length} characters"),
            json!(length),
        )
        .with_rule(format!("minimum length {min_length}"))
        .with_context("minimum", min_length)
        .with_context("current", s));
    }

    Ok(())
}

pub fn validate_max_length(value: &Value, max_length: usize, field: &str) -> FieldResult<()> {
    let s = value.as_str().ok_or_else(|| type_failure(value, field, "string"))?;
    let length = s.chars().count();

    if length > max_length {
        return Err(ValidationFailure::new(
            field,
            format!("{field} must be at most {max_length} characters"),
            json!(length),
        )
        .with_rule(format!("maximum length {max_length}"))
        .with_context("maximum", max_length)
        .with_context("current", s));
    }

    Ok(())
}

/// Strict boolean check: `"true"` is rejected.
pub fn validate_boolean(value: &Value, field: &str) -> FieldResult<bool> {
    value.as_bool().ok_or_else(|| type_failure(value, field, "boolean"))
}

/// Optional phone number; internal whitespace is ignored.
pub fn validate_phone(value: &Value) -> FieldResult<()> {
    if is_falsy(value) {
        return Ok(());
    }

    let phone = value.as_str().ok_or_else(|| type_failure(value, "phone", "string"))?;
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();

    if !PHONE_REGEX.is_match(&compact) {
        return Err(ValidationFailure::new("phone", "Invalid phone number format", value.clone())
            .with_rule("valid format required")
            .with_context("examples", json!(PHONE_EXAMPLES)));
    }

    Ok(())
}

/// The password itself is never echoed back in the failure.
pub fn validate_password(value: &Value) -> FieldResult<()> {
    if is_falsy(value) {
        return Err(ValidationFailure::new("password", "Password is required", Value::Null)
            .with_rule("required"));
    }

    let password = value
        .as_str()
        .ok_or_else(|| type_failure(value, "password", "string"))?;

    let strong = password.chars().count() >= MIN_PASSWORD_LENGTH
        && PASSWORD_CHARSET_REGEX.is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit());

    if !strong {
        return Err(ValidationFailure::new(
            "password",
            "Password must be at least 8 characters with at least 1 letter and 1 number",
            json!("string"),
        )
        .with_rule("minimum 8 characters, 1 letter, 1 number required"));
    }

    Ok(())
}

/// Optional price. Returns the coerced amount when present.
pub fn validate_price(value: &Value) -> FieldResult<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }

    let price = match coerce_number(value) {
        Some(n) if n.is_finite() => n,
        _ => {
            return Err(ValidationFailure::new("price", "Price must be a number", value.clone())
                .with_rule("numeric value required"))
        }
    };

    if price < 0.0 {
        return Err(ValidationFailure::new("price", "Price cannot be negative", number_value(price))
            .with_rule("non-negative value required"));
    }

    if price > MAX_PRICE {
        return Err(ValidationFailure::new("price", "Price is too high", number_value(price))
            .with_rule(format!("maximum value: {MAX_PRICE}"))
            .with_context("maximum", MAX_PRICE));
    }

    Ok(Some(price))
}

/// Membership check. An empty `valid_values` list is a caller bug and is
/// reported as [`ShieldError::Misuse`], not as a field failure.
pub fn validate_enum<V>(value: &Value, valid_values: &[V], field: &str) -> Result<(), ShieldError>
where
    V: PartialEq<Value> + Serialize + fmt::Display,
{
    if valid_values.is_empty() {
        return Err(ShieldError::Misuse(format!(
            "valid values list is required to validate {field}"
        )));
    }

    if valid_values.iter().any(|candidate| candidate == value) {
        return Ok(());
    }

    let listed = valid_values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let failure = ValidationFailure::new(field, format!("{field} must be one of: {listed}"), value.clone())
        .with_rule("enumerated value required")
        .with_context("valid_values", serde_json::to_value(valid_values).unwrap_or(Value::Null));

    Err(failure.into())
}

/// Report every missing (or `null`) key in a single failure.
pub fn validate_required_properties(obj: &Value, required: &[&str], object_name: &str) -> FieldResult<()> {
    validate_required(obj, object_name)?;

    let map = obj.as_object();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| map.and_then(|m| m.get(*key)).map_or(true, Value::is_null))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let received: Vec<&String> = map.map(|m| m.keys().collect()).unwrap_or_default();
    Err(ValidationFailure::new(
        object_name,
        format!("{object_name} is missing required properties: {}", missing.join(", ")),
        json!(received),
    )
    .with_rule("required properties")
    .with_context("object", object_name)
    .with_context("missing", json!(missing)))
}

pub fn validate_array_not_empty(value: &Value, field: &str) -> FieldResult<()> {
    let items = value.as_array().ok_or_else(|| type_failure(value, field, "array"))?;

    if items.is_empty() {
        return Err(ValidationFailure::new(field, format!("{field} cannot be empty"), json!([]))
            .with_rule("non-empty array required"));
    }

    Ok(())
}

/// Optional absolute URL. Returns the parsed URL when present.
pub fn validate_url(value: &Value) -> FieldResult<Option<Url>> {
    if is_falsy(value) {
        return Ok(None);
    }

    value
        .as_str()
        .and_then(|s| Url::parse(s).ok())
        .map(Some)
        .ok_or_else(|| {
            ValidationFailure::new("url", "Invalid URL format", value.clone())
                .with_rule("valid URL format required")
                .with_context("example", "https://example.com")
        })
}

/// Optional calendar instant. Returns the parsed instant when present.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD`, local `YYYY-MM-DDTHH:MM[:SS]`
/// (read as UTC) and millisecond epoch numbers.
pub fn validate_date(value: &Value, field: &str) -> FieldResult<Option<DateTime<Utc>>> {
    if is_falsy(value) {
        return Ok(None);
    }

    let parsed = match value {
        Value::String(s) => parse_instant(s.trim()),
        Value::Number(n) => n
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        ValidationFailure::new(field, format!("{field} must be a valid date"), value.clone())
            .with_rule("valid date required")
    })
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Remove `< > ' "` and trim. Non-strings are returned unchanged.
pub fn sanitize_string(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_markup(&s)),
        other => other,
    }
}

/// Characters are removed before trimming so a second pass is a no-op.
pub fn strip_markup(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(validate_required(&json!("x"), "name").is_ok());
        assert!(validate_required(&json!(0), "count").is_ok());
        assert!(validate_required(&json!(false), "flag").is_ok());

        let err = validate_required(&Value::Null, "name").unwrap_err();
        assert_eq!(err.rule(), Some("required"));
        let err = validate_required(&json!("   "), "name").unwrap_err();
        assert_eq!(err.rule(), Some("non-empty string"));
        let err = validate_required(&json!([]), "items").unwrap_err();
        assert_eq!(err.rule(), Some("non-empty array"));
    }

    #[test]
    fn test_id_coerces_strings() {
        assert_eq!(validate_id(&json!("42"), "id").unwrap(), 42.0);
        assert_eq!(validate_id(&json!(7), "id").unwrap(), 7.0);
        assert_eq!(validate_id(&json!(" 3 "), "id").unwrap(), 3.0);
        assert_eq!(validate_id(&json!("0x10"), "id").unwrap(), 16.0);
    }

    #[test]
    fn test_id_failures() {
        let err = validate_id(&Value::Null, "product_id").unwrap_err();
        assert_eq!(err.field(), "product_id");
        assert_eq!(err.rule(), Some("required"));

        let err = validate_id(&json!("abc"), "id").unwrap_err();
        assert_eq!(err.message(), "id must be a number");
        assert_eq!(err.received(), &json!("abc"));

        let err = validate_id(&json!("Infinity"), "id").unwrap_err();
        assert_eq!(err.rule(), Some("numeric value required"));

        for bad in [json!(0), json!("-5"), json!(""), json!(false)] {
            let err = validate_id(&bad, "id").unwrap_err();
            assert_eq!(err.rule(), Some("positive number required"), "input {bad}");
        }

        assert!(validate_id(&json!([1]), "id").is_err());
        assert!(validate_id(&json!("1e400"), "id").is_err());
        assert!(validate_id(&json!("nan"), "id").is_err());
    }

    #[test]
    fn test_id_positive_iff_finite_positive() {
        let inputs = [
            json!(1), json!(0.5), json!("12.5"), json!(-1), json!("x"), json!(true),
            json!("1e3"), json!(".5"), json!("5."), json!("+7"), json!("  "), json!({}),
        ];
        for input in inputs {
            let expected = coerce_number(&input).filter(|n| n.is_finite() && *n > 0.0);
            match validate_id(&input, "id") {
                Ok(id) => {
                    assert!(id > 0.0);
                    assert_eq!(Some(id), expected, "input {input}");
                }
                Err(_) => assert!(expected.is_none(), "input {input}"),
            }
        }
    }

    #[test]
    fn test_email() {
        assert!(validate_email(&json!("user@example.com"), "email").is_ok());

        let err = validate_email(&json!("not-an-email"), "email").unwrap_err();
        assert_eq!(err.field(), "email");
        assert_eq!(err.rule(), Some("valid email format required"));
        assert_eq!(err.context("example"), Some(&json!("user@example.com")));

        assert!(validate_email(&json!("a@b@c.com"), "email").is_err());
        assert!(validate_email(&json!("a b@c.com"), "email").is_err());
        assert!(validate_email(&json!("user@example.com\nx@y.z"), "email").is_err());

        let err = validate_email(&Value::Null, "email").unwrap_err();
        assert_eq!(err.rule(), Some("required"));
        let err = validate_email(&json!(12), "email").unwrap_err();
        assert_eq!(err.rule(), Some("string required"));
        assert_eq!(err.received(), &json!("number"));
    }

    #[test]
    fn test_length_bounds() {
        assert!(validate_min_length(&json!("abc"), 3, "name").is_ok());
        let err = validate_min_length(&json!("ab"), 3, "name").unwrap_err();
        assert_eq!(err.message(), "name must be at least 3 characters");
        assert_eq!(err.received(), &json!(2));
        assert_eq!(err.context("minimum"), Some(&json!(3)));

        assert!(validate_max_length(&json!("abc"), 3, "name").is_ok());
        let err = validate_max_length(&json!("abcd"), 3, "name").unwrap_err();
        assert_eq!(err.message(), "name must be at most 3 characters");
        assert_eq!(err.received(), &json!(4));
        assert_eq!(err.context("maximum"), Some(&json!(3)));

        let err = validate_max_length(&json!(5), 3, "name").unwrap_err();
        assert_eq!(err.rule(), Some("string required"));
    }

    #[test]
    fn test_boolean_is_strict() {
        assert_eq!(validate_boolean(&json!(true), "active").unwrap(), true);
        assert_eq!(validate_boolean(&json!(false), "active").unwrap(), false);
        let err = validate_boolean(&json!("true"), "active").unwrap_err();
        assert_eq!(err.rule(), Some("boolean required"));
        assert!(validate_boolean(&json!(1), "active").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone(&Value::Null).is_ok());
        assert!(validate_phone(&json!("")).is_ok());
        assert!(validate_phone(&json!("4141234567")).is_ok());
        assert!(validate_phone(&json!("584141234567")).is_ok());
        assert!(validate_phone(&json!("+58 414 123 4567")).is_ok());
        assert!(validate_phone(&json!("0058 4141234567")).is_ok());

        let err = validate_phone(&json!("12-34")).unwrap_err();
        assert_eq!(err.field(), "phone");
        assert!(err.context("examples").is_some());
        assert!(validate_phone(&json!(4141234567u64)).is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password(&json!("abcdefg1")).is_ok());
        assert!(validate_password(&json!("P@ssw0rd!")).is_ok());
        assert!(validate_password(&json!("abcdefgh")).is_err());
        assert!(validate_password(&json!("12345678")).is_err());
        assert!(validate_password(&json!("abc12")).is_err());
        assert!(validate_password(&json!("abcd 1234")).is_err());

        let err = validate_password(&json!("short1")).unwrap_err();
        assert_ne!(err.received(), &json!("short1"));
        let err = validate_password(&Value::Null).unwrap_err();
        assert_eq!(err.rule(), Some("required"));
    }

    #[test]
    fn test_price() {
        assert_eq!(validate_price(&Value::Null).unwrap(), None);
        assert_eq!(validate_price(&json!("19.99")).unwrap(), Some(19.99));
        assert_eq!(validate_price(&json!(0)).unwrap(), Some(0.0));
        assert_eq!(validate_price(&json!(999999.99)).unwrap(), Some(MAX_PRICE));

        assert_eq!(
            validate_price(&json!(-1)).unwrap_err().rule(),
            Some("non-negative value required")
        );
        assert_eq!(
            validate_price(&json!(1_000_000)).unwrap_err().rule(),
            Some("maximum value: 999999.99")
        );
        assert_eq!(
            validate_price(&json!("ten")).unwrap_err().rule(),
            Some("numeric value required")
        );
    }

    #[test]
    fn test_enum() {
        let statuses = ["pending", "paid", "cancelled"];
        assert!(validate_enum(&json!("paid"), &statuses, "status").is_ok());

        match validate_enum(&json!("lost"), &statuses, "status") {
            Err(ShieldError::Validation(failure)) => {
                assert_eq!(failure.message(), "status must be one of: pending, paid, cancelled");
                assert_eq!(failure.context("valid_values"), Some(&json!(statuses)));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let empty: [&str; 0] = [];
        assert!(matches!(
            validate_enum(&json!("paid"), &empty, "status"),
            Err(ShieldError::Misuse(_))
        ));
    }

    #[test]
    fn test_required_properties_lists_all_missing() {
        let obj = json!({ "name": "Rose", "price": null });
        let err = validate_required_properties(&obj, &["name", "price", "stock"], "product").unwrap_err();
        assert_eq!(err.context("missing"), Some(&json!(["price", "stock"])));
        assert_eq!(err.message(), "product is missing required properties: price, stock");
        assert_eq!(err.received(), &json!(["name", "price"]));

        assert!(validate_required_properties(&obj, &["name"], "product").is_ok());
        let err = validate_required_properties(&Value::Null, &["name"], "product").unwrap_err();
        assert_eq!(err.rule(), Some("required"));
    }

    #[test]
    fn test_array_not_empty() {
        assert!(validate_array_not_empty(&json!([1]), "items").is_ok());
        assert_eq!(
            validate_array_not_empty(&json!({}), "items").unwrap_err().rule(),
            Some("array required")
        );
        assert_eq!(
            validate_array_not_empty(&json!([]), "items").unwrap_err().rule(),
            Some("non-empty array required")
        );
    }

    #[test]
    fn test_url() {
        assert!(validate_url(&Value::Null).unwrap().is_none());
        let url = validate_url(&json!("https://example.com/a?b=1")).unwrap().unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert!(validate_url(&json!("example.com")).is_err());
        assert!(validate_url(&json!("/relative/path")).is_err());
    }

    #[test]
    fn test_date() {
        assert!(validate_date(&Value::Null, "delivery_date").unwrap().is_none());
        assert!(validate_date(&json!("2025-02-28"), "delivery_date").unwrap().is_some());
        assert!(validate_date(&json!("2025-02-28T10:30:00Z"), "d").unwrap().is_some());
        assert!(validate_date(&json!("2025-02-28T10:30"), "d").unwrap().is_some());
        assert!(validate_date(&json!(1_700_000_000_000i64), "d").unwrap().is_some());

        let err = validate_date(&json!("2025-02-30"), "delivery_date").unwrap_err();
        assert_eq!(err.message(), "delivery_date must be a valid date");
        assert!(validate_date(&json!("tomorrow"), "d").is_err());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string(json!("  <b>hi</b> ")), json!("bhi/b"));
        assert_eq!(sanitize_string(json!("it's \"quoted\"")), json!("its quoted"));
        assert_eq!(sanitize_string(json!(42)), json!(42));
        assert_eq!(sanitize_string(Value::Null), Value::Null);
    }

    #[test]
    fn test_sanitize_string_is_idempotent() {
        for s in ["a <", " <a> ", "\"' x '\"", "plain", "  ", "<<>>", "x\t>"] {
            let once = sanitize_string(json!(s));
            let twice = sanitize_string(once.clone());
            assert_eq!(once, twice, "input {s:?}");
            let text = once.as_str().unwrap();
            assert!(!text.contains(['<', '>', '\'', '"']));
        }
    }

    #[test]
    fn test_number_value_keeps_integers() {
        assert_eq!(number_value(0.0), json!(0));
        assert_eq!(number_value(25.0), json!(25));
        assert_eq!(number_value(-3.0), json!(-3));
        assert_eq!(number_value(2.5), json!(2.5));
    }
}
