use std::sync::Arc;

use async_trait::async_trait;
use models::validation::CustomerValidator;
use tracing::{info, instrument, warn};

use super::domain::{Customer, CustomerId, CustomerInput};
use super::repository::CustomerRepository;
use crate::errors::ServiceError;

/// Customer operations shared by every transport adapter.
#[async_trait]
pub trait CustomerOperations: Send + Sync {
    async fn list(&self) -> Result<Vec<Customer>, ServiceError>;
    async fn get_by_id(&self, id: CustomerId) -> Result<Customer, ServiceError>;
    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Customer>, ServiceError>;
    async fn create(&self, input: CustomerInput) -> Result<Customer, ServiceError>;
    async fn update(&self, id: CustomerId, input: CustomerInput) -> Result<Customer, ServiceError>;
    async fn delete(&self, id: CustomerId) -> Result<(), ServiceError>;
}

/// Customer business service independent of web framework
pub struct CustomerService<R: CustomerRepository> {
    repo: Arc<R>,
    validator: Arc<CustomerValidator>,
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: Arc<R>, validator: Arc<CustomerValidator>) -> Self { Self { repo, validator } }

    /// Create the given customers when the store is empty. Returns how many
    /// were created.
    ///
    /// # Examples
    /// ```
    /// use service::customer::{CustomerInput, CustomerOperations, CustomerService};
    /// use service::customer::repository::mock::InMemoryCustomerRepository;
    /// use models::validation::CustomerValidator;
    /// use std::sync::Arc;
    /// let svc = CustomerService::new(
    ///     Arc::new(InMemoryCustomerRepository::default()),
    ///     Arc::new(CustomerValidator::new().unwrap()),
    /// );
    /// let seed = vec![
    ///     CustomerInput::new("momo", "momo@gmail.com"),
    ///     CustomerInput::new("moha", "moha@gmail.com"),
    /// ];
    /// assert_eq!(tokio_test::block_on(svc.seed(seed.clone())).unwrap(), 2);
    /// assert_eq!(tokio_test::block_on(svc.seed(seed)).unwrap(), 0);
    /// assert_eq!(tokio_test::block_on(svc.list()).unwrap().len(), 2);
    /// ```
    #[instrument(skip(self, records))]
    pub async fn seed(
        &self,
        records: impl IntoIterator<Item = CustomerInput> + Send,
    ) -> Result<usize, ServiceError> {
        if !self.repo.find_all().await?.is_empty() {
            info!("seed_skipped_store_not_empty");
            return Ok(0);
        }
        let mut count = 0;
        for input in records {
            self.create(input).await?;
            count += 1;
        }
        info!(count, "customers_seeded");
        Ok(count)
    }

    /// Validated `(name, email)` pair, or every violation of the candidate.
    fn validated<'a>(
        &self,
        name: Option<&'a str>,
        email: Option<&'a str>,
    ) -> Result<(&'a str, &'a str), ServiceError> {
        let violations = self.validator.validate(name, email);
        match (name, email) {
            (Some(n), Some(e)) if violations.is_empty() => Ok((n, e)),
            _ => {
                warn!(violated = ?violations.fields(), "customer_validation_failed");
                Err(ServiceError::Validation(violations))
            }
        }
    }
}

#[async_trait]
impl<R: CustomerRepository> CustomerOperations for CustomerService<R> {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Customer>, ServiceError> {
        info!("list_customers");
        let customers = self.repo.find_all().await?;
        if customers.is_empty() {
            warn!("no_customers");
            return Err(ServiceError::no_customers());
        }
        info!(count = customers.len(), "customers_listed");
        Ok(customers)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: CustomerId) -> Result<Customer, ServiceError> {
        info!(id, "get_customer");
        match self.repo.find_by_id(id).await? {
            Some(customer) => {
                info!(id, "customer_found");
                Ok(customer)
            }
            None => {
                warn!(id, "customer_not_found");
                Err(ServiceError::customer_not_found(id))
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Customer>, ServiceError> {
        info!(fragment, "search_customers");
        let customers = self.repo.find_by_name_contains(fragment).await?;
        if customers.is_empty() {
            warn!(fragment, "no_customers_named");
            return Err(ServiceError::no_customers_named(fragment));
        }
        info!(fragment, count = customers.len(), "customers_matched");
        Ok(customers)
    }

    /// Validate and store a new customer; the id is assigned by the store.
    ///
    /// # Examples
    /// ```
    /// use service::customer::{CustomerInput, CustomerOperations, CustomerService};
    /// use service::customer::repository::mock::InMemoryCustomerRepository;
    /// use models::validation::CustomerValidator;
    /// use std::sync::Arc;
    /// let svc = CustomerService::new(
    ///     Arc::new(InMemoryCustomerRepository::default()),
    ///     Arc::new(CustomerValidator::new().unwrap()),
    /// );
    /// let input = CustomerInput::new("Titi", "titi@gmail.com");
    /// let titi = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(titi.name, "Titi");
    /// assert!(tokio_test::block_on(svc.create(CustomerInput::new("x", "bad-email"))).is_err());
    /// ```
    #[instrument(skip(self, input))]
    async fn create(&self, input: CustomerInput) -> Result<Customer, ServiceError> {
        info!(name = ?input.name, "create_customer");
        let (name, email) = self.validated(input.name.as_deref(), input.email.as_deref())?;
        let customer = self.repo.insert(name, email).await?;
        info!(id = customer.id, "customer_created");
        Ok(customer)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: CustomerId, input: CustomerInput) -> Result<Customer, ServiceError> {
        info!(id, "update_customer");
        let existing = self.get_by_id(id).await?;
        let merged = input.apply_to(&existing);
        self.validated(Some(merged.name.as_str()), Some(merged.email.as_str()))?;
        match self.repo.update(&merged).await? {
            Some(customer) => {
                info!(id, "customer_updated");
                Ok(customer)
            }
            // removed between read and write
            None => {
                warn!(id, "customer_not_found");
                Err(ServiceError::customer_not_found(id))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CustomerId) -> Result<(), ServiceError> {
        info!(id, "delete_customer");
        if !self.repo.delete(id).await? {
            warn!(id, "customer_not_found");
            return Err(ServiceError::customer_not_found(id));
        }
        info!(id, "customer_deleted");
        Ok(())
    }
}
