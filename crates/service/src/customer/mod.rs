//! Customer module: three-layer architecture (domain, repository, service).

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{Customer, CustomerId, CustomerInput};
pub use repository::CustomerRepository;
pub use service::{CustomerOperations, CustomerService};
