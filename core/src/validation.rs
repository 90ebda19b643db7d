//! Declarative input rules checked before a request is sent.
//!
//! A ruleset is a static list of `(field, rules)` pairs. Every field is
//! checked and every rule of a present field runs, so one `ValidationError`
//! reports all problems at once.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::error::ValidationError;
use crate::http::Params;

pub const PRODUCTS: &[i64] = &[0, 12, 15, 16, 17];

/// Add-on flags accepted for an order. Each is a single bit of the add-on
/// bitmask, plus 0 for none.
pub const ADD_ONS: &[i64] = &[
    0, 4, 8, 16, 32, 128, 256, 4096, 8192, 131072, 4194304, 8388608,
];

pub const SIGNATURE_TYPES: &[&str] = &["QES", "ADV", "BAS"];

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+\d{1,14}$").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// One constraint on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present, not null, not an empty string or array.
    Required,
    String,
    Email,
    /// Absolute http(s) URL with a host.
    Url,
    /// Minimum length: characters for strings, elements for arrays.
    Min(usize),
    /// Maximum length: characters for strings, elements for arrays.
    Max(usize),
    /// Integer product code from [`PRODUCTS`].
    Product,
    /// Integer add-on flag from [`ADD_ONS`].
    Add,
    /// `+` followed by 1 to 14 digits.
    Phone,
    /// Signature level from [`SIGNATURE_TYPES`].
    Signature,
}

pub type Ruleset = &'static [(&'static str, &'static [Rule])];

impl Rule {
    /// `None` when `value` satisfies the rule, otherwise the message.
    fn check(self, field: &str, value: &Value) -> Option<String> {
        let ok = match self {
            Rule::Required => !is_blank(value),
            Rule::String => value.is_string(),
            Rule::Email => value.as_str().is_some_and(|s| EMAIL.is_match(s)),
            Rule::Url => value.as_str().is_some_and(is_web_url),
            Rule::Min(n) => length(value).is_some_and(|len| len >= n),
            Rule::Max(n) => length(value).is_some_and(|len| len <= n),
            Rule::Product => value.as_i64().is_some_and(|v| PRODUCTS.contains(&v)),
            Rule::Add => value.as_i64().is_some_and(|v| ADD_ONS.contains(&v)),
            Rule::Phone => value.as_str().is_some_and(|s| PHONE.is_match(s)),
            Rule::Signature => value.as_str().is_some_and(|s| SIGNATURE_TYPES.contains(&s)),
        };
        if ok {
            return None;
        }
        Some(match self {
            Rule::Required => format!("The {field} field is required."),
            Rule::String => format!("The {field} must be a string."),
            Rule::Email => format!("The {field} must be a valid email address."),
            Rule::Url => format!("The {field} format is invalid."),
            Rule::Min(n) => format!("The {field} must be at least {n} characters."),
            Rule::Max(n) => format!("The {field} may not be greater than {n} characters."),
            Rule::Product => format!("The {field} is not a supported product."),
            Rule::Add => format!("The {field} is not a supported add-on."),
            Rule::Phone => format!("The {field} must be an international phone number."),
            Rule::Signature => format!("The {field} must be one of QES, ADV, BAS."),
        })
    }
}

/// Check `params` against `rules`, collecting every failure.
///
/// A field that is absent, null or empty only reports `Required`; its other
/// rules are skipped. Fields not named in `rules` pass through unchecked.
pub fn validate(params: &Params, rules: Ruleset) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    for (field, field_rules) in rules {
        match params.get(*field).filter(|value| !is_blank(value)) {
            None => {
                if field_rules.contains(&Rule::Required) {
                    errors.add(field, format!("The {field} field is required."));
                }
            }
            Some(value) => {
                for rule in *field_rules {
                    if let Some(message) = rule.check(field, value) {
                        errors.add(field, message);
                    }
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn is_web_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}
