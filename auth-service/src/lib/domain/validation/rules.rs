use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use super::checks;
use super::ValidationErrors;

lazy_static! {
    static ref NUMERIC: Regex = Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("static pattern");
}

/// A field value as seen by the validator.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
}

impl<'a> FieldValue<'a> {
    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    fn len(&self) -> usize {
        match self {
            FieldValue::Text(text) => text.chars().count(),
            FieldValue::List(items) => items.len(),
        }
    }

    fn text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::List(_) => None,
        }
    }
}

/// Anything the validator can read fields from, by JSON field name.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    Numeric,
    Email,
    Url,
    EqualsField(&'static str),
    OneOf(&'static [&'static str]),
    /// Region code is read from the named sibling field.
    Phone { region_field: &'static str },
    Year,
    Password,
    Interests,
    Role,
}

impl Rule {
    fn check(&self, value: FieldValue<'_>, source: &dyn FieldSource) -> Result<(), String> {
        let fail = |message: &str| -> Result<(), String> { Err(message.to_string()) };
        match self {
            Rule::Required => Ok(()),
            Rule::MinLen(min) if value.len() < *min => fail("Value is too short"),
            Rule::MaxLen(max) if value.len() > *max => fail("Value is too long"),
            Rule::MinLen(_) | Rule::MaxLen(_) => Ok(()),
            Rule::Numeric => match value.text() {
                Some(text) if NUMERIC.is_match(text) => Ok(()),
                _ => fail("Invalid value"),
            },
            Rule::Email => match value.text() {
                Some(text) if email_address::EmailAddress::from_str(text).is_ok() => Ok(()),
                _ => fail("Please provide a valid email address"),
            },
            Rule::Url => match value.text().map(url::Url::parse) {
                Some(Ok(parsed)) if parsed.has_host() => Ok(()),
                _ => fail("Please provide a valid URL"),
            },
            Rule::EqualsField(other) => {
                let other = source.field(other).and_then(|v| v.text()).unwrap_or("");
                match value.text() {
                    Some(text) if text == other => Ok(()),
                    _ => fail("Fields do not match"),
                }
            }
            Rule::OneOf(allowed) => match value.text() {
                Some(text) if allowed.iter().any(|a| *a == text) => Ok(()),
                _ => fail("Invalid value"),
            },
            Rule::Phone { region_field } => {
                let region = source
                    .field(region_field)
                    .and_then(|v| v.text())
                    .unwrap_or("");
                checks::check_phone(value.text().unwrap_or(""), region)
            }
            Rule::Year => checks::check_year(value.text().unwrap_or("")),
            Rule::Password => checks::check_password_complexity(value.text().unwrap_or("")),
            Rule::Interests => match value {
                FieldValue::List(items) => checks::check_interests(items),
                FieldValue::Text(_) => fail("Invalid value"),
            },
            Rule::Role => checks::check_role(value.text().unwrap_or("")).map(|_| ()),
        }
    }
}

/// Declarative per-field rule set.
///
/// Empty fields are skipped unless `Required` is among their rules. Within
/// a field the first failing rule wins; every field is evaluated so one call
/// reports all failures.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    fields: Vec<(&'static str, Vec<Rule>)>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((name, rules.into_iter().collect()));
        self
    }

    pub fn validate(&self, source: &dyn FieldSource) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (name, rules) in &self.fields {
            let value = source.field(name).unwrap_or(FieldValue::Text(""));

            if value.is_empty() {
                if rules.contains(&Rule::Required) {
                    errors.insert(name, "This field is required");
                }
                continue;
            }

            if let Some(message) = rules
                .iter()
                .find_map(|rule| rule.check(value, source).err())
            {
                errors.insert(name, message);
            }
        }

        errors.into_result()
    }
}
