use async_trait::async_trait;

use super::domain::{Customer, CustomerId};
use crate::errors::ServiceError;

/// Repository abstraction for customer persistence.
///
/// Reads return empty collections or `None`; turning those into not-found errors
/// is the service's business.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All customers, ascending by id.
    async fn find_all(&self) -> Result<Vec<Customer>, ServiceError>;
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError>;
    /// Case-insensitive substring match on the name, ascending by id.
    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Customer>, ServiceError>;
    /// Insert with a store-assigned id.
    async fn insert(&self, name: &str, email: &str) -> Result<Customer, ServiceError>;
    /// Replace name and email of `customer.id`; `None` when the row is gone.
    async fn update(&self, customer: &Customer) -> Result<Option<Customer>, ServiceError>;
    /// Returns true if a row was deleted.
    async fn delete(&self, id: CustomerId) -> Result<bool, ServiceError>;
}

/// Simple in-memory repositories for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    struct Rows {
        by_id: BTreeMap<CustomerId, Customer>,
        last_id: CustomerId,
    }

    #[derive(Default)]
    pub struct InMemoryCustomerRepository {
        rows: Mutex<Rows>,
    }

    impl InMemoryCustomerRepository {
        /// Repository pre-filled with `(name, email)` pairs, ids assigned from 1.
        pub fn with_customers<'a>(records: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            let mut rows = Rows::default();
            for (name, email) in records {
                rows.last_id += 1;
                let id = rows.last_id;
                let customer = Customer { id, name: name.to_string(), email: email.to_string() };
                rows.by_id.insert(id, customer);
            }
            Self { rows: Mutex::new(rows) }
        }

        fn lock(&self) -> Result<MutexGuard<'_, Rows>, ServiceError> {
            self.rows.lock().map_err(|e| ServiceError::Internal(e.to_string()))
        }
    }

    #[async_trait]
    impl CustomerRepository for InMemoryCustomerRepository {
        async fn find_all(&self) -> Result<Vec<Customer>, ServiceError> {
            Ok(self.lock()?.by_id.values().cloned().collect())
        }

        async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError> {
            Ok(self.lock()?.by_id.get(&id).cloned())
        }

        async fn find_by_name_contains(
            &self,
            fragment: &str,
        ) -> Result<Vec<Customer>, ServiceError> {
            let needle = fragment.to_lowercase();
            let rows = self.lock()?;
            let found = rows.by_id.values().filter(|c| c.name.to_lowercase().contains(&needle));
            Ok(found.cloned().collect())
        }

        async fn insert(&self, name: &str, email: &str) -> Result<Customer, ServiceError> {
            let mut rows = self.lock()?;
            rows.last_id += 1;
            let id = rows.last_id;
            let customer = Customer { id, name: name.to_string(), email: email.to_string() };
            rows.by_id.insert(customer.id, customer.clone());
            Ok(customer)
        }

        async fn update(&self, customer: &Customer) -> Result<Option<Customer>, ServiceError> {
            let mut rows = self.lock()?;
            match rows.by_id.get_mut(&customer.id) {
                Some(slot) => {
                    *slot = customer.clone();
                    Ok(Some(customer.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, id: CustomerId) -> Result<bool, ServiceError> {
            Ok(self.lock()?.by_id.remove(&id).is_some())
        }
    }

    /// Repository whose every call fails like an unreachable database.
    #[derive(Default)]
    pub struct UnavailableCustomerRepository;

    impl UnavailableCustomerRepository {
        fn fail<T>() -> Result<T, ServiceError> {
            Err(ServiceError::Db("connection refused (os error 111)".into()))
        }
    }

    #[async_trait]
    impl CustomerRepository for UnavailableCustomerRepository {
        async fn find_all(&self) -> Result<Vec<Customer>, ServiceError> {
            Self::fail()
        }

        async fn find_by_id(&self, _id: CustomerId) -> Result<Option<Customer>, ServiceError> {
            Self::fail()
        }

        async fn find_by_name_contains(&self, _: &str) -> Result<Vec<Customer>, ServiceError> {
            Self::fail()
        }

        async fn insert(&self, _name: &str, _email: &str) -> Result<Customer, ServiceError> {
            Self::fail()
        }

        async fn update(&self, _: &Customer) -> Result<Option<Customer>, ServiceError> {
            Self::fail()
        }

        async fn delete(&self, _id: CustomerId) -> Result<bool, ServiceError> {
            Self::fail()
        }
    }
}
