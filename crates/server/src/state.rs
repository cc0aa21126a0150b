use std::sync::Arc;

use service::customer::CustomerOperations;

use crate::graphql::{self, CustomerSchema};

/// Shared handle every adapter calls into.
pub type Customers = Arc<dyn CustomerOperations>;

#[derive(Clone)]
pub struct AppState {
    pub customers: Customers,
    pub schema: CustomerSchema,
}

impl AppState {
    pub fn new(customers: Customers) -> Self {
        let schema = graphql::build_schema(Arc::clone(&customers));
        Self { customers, schema }
    }
}
