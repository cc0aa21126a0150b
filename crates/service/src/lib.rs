//! Service layer providing the customer CRUD contract on top of models.
//! - Separates business rules (validation, not-found policy) from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Transport adapters depend only on [`customer::CustomerOperations`].

pub mod errors;
pub mod customer;
#[cfg(test)]
pub mod test_support;
