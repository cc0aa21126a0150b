//! GraphQL adapter on `/graphql`.
//!
//! Failures are GraphQL errors tagged with `extensions.classification`
//! (`NOT_FOUND`, `BAD_REQUEST`, `INTERNAL_ERROR`); validation failures also
//! carry `extensions.violations`.

use async_graphql::http::GraphiQLSource;
use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Schema, SimpleObject,
};
use axum::{extract::State, response::Html, Json};
use service::customer::{Customer, CustomerId, CustomerInput};
use service::errors::{ErrorKind, ServiceError};
use tracing::error;

use crate::state::{AppState, Customers};

pub type CustomerSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(customers: Customers) -> CustomerSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).data(customers).finish()
}

#[derive(SimpleObject)]
#[graphql(name = "Customer")]
pub struct CustomerObject {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

impl From<Customer> for CustomerObject {
    fn from(c: Customer) -> Self {
        Self { id: c.id, name: c.name, email: c.email }
    }
}

#[derive(InputObject)]
#[graphql(name = "CustomerInput")]
pub struct CustomerInputObject {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<CustomerInputObject> for CustomerInput {
    fn from(i: CustomerInputObject) -> Self {
        Self { name: i.name, email: i.email }
    }
}

fn classification(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "NOT_FOUND",
        ErrorKind::ValidationFailed => "BAD_REQUEST",
        ErrorKind::Internal => "INTERNAL_ERROR",
    }
}

fn to_graphql_error(e: ServiceError) -> async_graphql::Error {
    if e.kind() == ErrorKind::Internal {
        error!(error = %e, "graphql request failed");
    }
    async_graphql::Error::new(e.public_message()).extend_with(|_, ext| {
        ext.set("classification", classification(e.kind()));
        if let Some(violations) = e.violations() {
            if let Ok(value) = async_graphql::to_value(violations) {
                ext.set("violations", value);
            }
        }
    })
}

fn customers<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Customers> {
    ctx.data::<Customers>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn all_customer(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CustomerObject>> {
        let list = customers(ctx)?.list().await.map_err(to_graphql_error)?;
        Ok(list.into_iter().map(CustomerObject::from).collect())
    }

    async fn customer_by_id(
        &self,
        ctx: &Context<'_>,
        id: CustomerId,
    ) -> async_graphql::Result<CustomerObject> {
        let customer = customers(ctx)?.get_by_id(id).await.map_err(to_graphql_error)?;
        Ok(customer.into())
    }

    async fn customer_by_name(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> async_graphql::Result<Vec<CustomerObject>> {
        let list =
            customers(ctx)?.find_by_name_contains(&name).await.map_err(to_graphql_error)?;
        Ok(list.into_iter().map(CustomerObject::from).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn save_customer(
        &self,
        ctx: &Context<'_>,
        customer: CustomerInputObject,
    ) -> async_graphql::Result<CustomerObject> {
        let created = customers(ctx)?.create(customer.into()).await.map_err(to_graphql_error)?;
        Ok(created.into())
    }

    async fn update_customer(
        &self,
        ctx: &Context<'_>,
        id: CustomerId,
        customer: CustomerInputObject,
    ) -> async_graphql::Result<CustomerObject> {
        let updated = customers(ctx)?.update(id, customer.into()).await.map_err(to_graphql_error)?;
        Ok(updated.into())
    }

    async fn delete_customer(
        &self,
        ctx: &Context<'_>,
        id: CustomerId,
    ) -> async_graphql::Result<bool> {
        customers(ctx)?.delete(id).await.map_err(to_graphql_error)?;
        Ok(true)
    }
}

pub async fn graphql_handler(
    State(state): State<AppState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(state.schema.execute(request).await)
}

pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use models::validation::CustomerValidator;
    use service::customer::repository::mock::{
        InMemoryCustomerRepository, UnavailableCustomerRepository,
    };
    use service::customer::{CustomerRepository, CustomerService};

    fn schema_over<R: CustomerRepository + 'static>(repo: R) -> CustomerSchema {
        let validator = Arc::new(CustomerValidator::new().unwrap());
        build_schema(Arc::new(CustomerService::new(Arc::new(repo), validator)))
    }

    fn seeded() -> CustomerSchema {
        schema_over(InMemoryCustomerRepository::with_customers([
            ("momo", "momo@gmail.com"),
            ("moha", "moha@gmail.com"),
            ("zakia", "zakia@gmail.com"),
        ]))
    }

    async fn run(schema: &CustomerSchema, query: &str) -> serde_json::Value {
        let response = schema.execute(query).await;
        serde_json::to_value(&response).unwrap()
    }

    #[tokio::test]
    async fn queries_return_customers() {
        let schema = seeded();
        let query = r#"{ allCustomer { id name } customerByName(name: "MO") { email } }"#;
        let body = run(&schema, query).await;
        assert_eq!(body["data"]["allCustomer"][2]["name"], "zakia");
        assert_eq!(body["data"]["customerByName"].as_array().unwrap().len(), 2);

        let body = run(&schema, "{ customerById(id: 2) { id name email } }").await;
        assert_eq!(body["data"]["customerById"]["email"], "moha@gmail.com");
    }

    #[tokio::test]
    async fn mutations_round_trip() {
        let schema = seeded();
        let save = r#"mutation {
            saveCustomer(customer: {name: "Titi", email: "titi@gmail.com"}) { id }
        }"#;
        let body = run(&schema, save).await;
        assert_eq!(body["data"]["saveCustomer"]["id"], 4);

        let update = r#"mutation {
            updateCustomer(id: 3, customer: {name: "Zakia"}) { name email }
        }"#;
        let body = run(&schema, update).await;
        assert_eq!(body["data"]["updateCustomer"]["name"], "Zakia");
        assert_eq!(body["data"]["updateCustomer"]["email"], "zakia@gmail.com");

        let body = run(&schema, "mutation { deleteCustomer(id: 1) }").await;
        assert_eq!(body["data"]["deleteCustomer"], true);
    }

    #[tokio::test]
    async fn errors_are_classified() {
        let schema = seeded();
        let body = run(&schema, "{ customerById(id: 42) { id } }").await;
        assert_eq!(body["errors"][0]["message"], "Customer not found with ID: 42");
        assert_eq!(body["errors"][0]["extensions"]["classification"], "NOT_FOUND");

        let save = r#"mutation { saveCustomer(customer: {name: "x", email: "bad-email"}) { id } }"#;
        let body = run(&schema, save).await;
        let ext = &body["errors"][0]["extensions"];
        assert_eq!(ext["classification"], "BAD_REQUEST");
        assert_eq!(ext["violations"][0]["field"], "name");
        assert_eq!(ext["violations"][1]["field"], "email");

        let schema = schema_over(UnavailableCustomerRepository);
        let body = run(&schema, "{ allCustomer { id } }").await;
        assert_eq!(body["errors"][0]["message"], "An error has occurred.");
        assert_eq!(body["errors"][0]["extensions"]["classification"], "INTERNAL_ERROR");
    }
}
