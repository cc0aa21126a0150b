//! Persistence-facing models: the `customer` entity, database connection
//! helpers and the customer validation rules.

pub mod errors;
pub mod db;
pub mod customer;
pub mod validation;
