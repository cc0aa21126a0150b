use sea_orm::DatabaseConnection;

use crate::customer::domain::{Customer, CustomerId};
use crate::customer::repository::CustomerRepository;
use crate::errors::ServiceError;

/// SeaORM-backed repository implementation.
pub struct SeaOrmCustomerRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl CustomerRepository for SeaOrmCustomerRepository {
    async fn find_all(&self) -> Result<Vec<Customer>, ServiceError> {
        let rows = models::customer::list(&self.db).await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError> {
        Ok(models::customer::find(&self.db, id).await?.map(Customer::from))
    }

    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Customer>, ServiceError> {
        let rows = models::customer::find_name_contains(&self.db, fragment).await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn insert(&self, name: &str, email: &str) -> Result<Customer, ServiceError> {
        Ok(models::customer::create(&self.db, name, email).await?.into())
    }

    async fn update(&self, customer: &Customer) -> Result<Option<Customer>, ServiceError> {
        let updated =
            models::customer::update(&self.db, customer.id, &customer.name, &customer.email)
                .await?;
        Ok(updated.map(Customer::from))
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, ServiceError> {
        Ok(models::customer::delete(&self.db, id).await?)
    }
}
