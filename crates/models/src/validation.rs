//! Customer field rules.
//!
//! Every rule is evaluated on every call; a candidate gets the complete list of
//! violations, `name` rules first, then `email` rules. Length and pattern rules
//! only apply to a value that is present, so an absent field reports the
//! non-empty rule alone while `""` reports every rule it breaks.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";

pub const NAME_NOT_EMPTY: &str = "Name cannot be null or empty.";
pub const NAME_INVALID_SIZE: &str = "Name must be between 2 and 20 characters.";
pub const NAME_INVALID_PATTERN: &str = "Name should only contain alphabetic characters.";
pub const EMAIL_NOT_EMPTY: &str = "Email cannot be null or empty.";
pub const EMAIL_INVALID_SIZE: &str = "Email cannot exceed 30 characters.";
pub const EMAIL_INVALID_PATTERN: &str = "Email should be a valid email address";

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 20;
pub const EMAIL_MAX_LEN: usize = 30;

const NAME_PATTERN: &str = r"^[a-zA-Z]+$";
const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*@[^-][A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*(\.[A-Za-z]{2,3})$";

/// Offsets at which the `@` must appear, counted in characters.
const EMAIL_AT_MIN: usize = 2;
const EMAIL_AT_MAX: usize = 30;

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: &str, message: &str) -> Self {
        Self { field: field.to_string(), message: message.to_string() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered list of violations for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> { self.0.iter() }

    /// Distinct field names in first-seen order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in &self.0 {
            if !out.contains(&v.field.as_str()) {
                out.push(&v.field);
            }
        }
        out
    }

    fn push(&mut self, field: &str, message: &str) {
        self.0.push(Violation::new(field, message));
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(v: Vec<Violation>) -> Self { Self(v) }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Compiled customer rules. Build once and share.
#[derive(Debug, Clone)]
pub struct CustomerValidator {
    name_re: Regex,
    email_re: Regex,
}

impl CustomerValidator {
    pub fn new() -> Result<Self, ModelError> {
        Ok(Self {
            name_re: Regex::new(NAME_PATTERN)?,
            email_re: Regex::new(EMAIL_PATTERN)?,
        })
    }

    /// Collect every violation for the given candidate values.
    pub fn validate(&self, name: Option<&str>, email: Option<&str>) -> Violations {
        let mut out = Violations::default();
        self.check_name(name, &mut out);
        self.check_email(email, &mut out);
        out
    }

    fn check_name(&self, name: Option<&str>, out: &mut Violations) {
        if name.map_or(true, str::is_empty) {
            out.push(FIELD_NAME, NAME_NOT_EMPTY);
        }
        let Some(name) = name else { return };
        let len = name.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            out.push(FIELD_NAME, NAME_INVALID_SIZE);
        }
        if !self.name_re.is_match(name) {
            out.push(FIELD_NAME, NAME_INVALID_PATTERN);
        }
    }

    fn check_email(&self, email: Option<&str>, out: &mut Violations) {
        if email.map_or(true, str::is_empty) {
            out.push(FIELD_EMAIL, EMAIL_NOT_EMPTY);
        }
        let Some(email) = email else { return };
        if email.chars().count() > EMAIL_MAX_LEN {
            out.push(FIELD_EMAIL, EMAIL_INVALID_SIZE);
        }
        if !(at_within_bounds(email) && self.email_re.is_match(email)) {
            out.push(FIELD_EMAIL, EMAIL_INVALID_PATTERN);
        }
    }
}

/// Equivalent of the look-ahead `^(?=.{2,30}@)`: some `@` sits at a character
/// offset in `2..=30` and no line break precedes it.
fn at_within_bounds(email: &str) -> bool {
    for (i, c) in email.chars().enumerate().take(EMAIL_AT_MAX + 1) {
        match c {
            '\n' | '\r' => return false,
            '@' if i >= EMAIL_AT_MIN => return true,
            _ => {}
        }
    }
    false
}
