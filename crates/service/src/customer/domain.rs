use serde::{Deserialize, Serialize};

pub type CustomerId = i32;

/// Stored customer (business view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

impl From<models::customer::Model> for Customer {
    fn from(m: models::customer::Model) -> Self {
        Self { id: m.id, name: m.name, email: m.email }
    }
}

/// Candidate fields for create and update. An absent field keeps the stored
/// value on update and is reported as empty on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CustomerInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: Some(name.into()), email: Some(email.into()) }
    }

    /// Overlay the present fields onto `existing`; the id never changes.
    pub fn apply_to(self, existing: &Customer) -> Customer {
        Customer {
            id: existing.id,
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            email: self.email.unwrap_or_else(|| existing.email.clone()),
        }
    }
}
