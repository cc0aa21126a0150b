use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use service::customer::{Customer, CustomerId, CustomerInput};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive name fragment.
    pub name: String,
}

#[utoipa::path(
    get, path = "/api/customers", tag = "customers",
    responses(
        (status = 200, description = "All customers", body = [crate::openapi::CustomerDoc]),
        (status = 404, description = "No customers found.", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, JsonApiError> {
    Ok(Json(state.customers.list().await?))
}

#[utoipa::path(
    get, path = "/api/customers/{id}", tag = "customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = crate::openapi::CustomerDoc),
        (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Customer not found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<Customer>, JsonApiError> {
    Ok(Json(state.customers.get_by_id(id).await?))
}

#[utoipa::path(
    get, path = "/api/customers/search", tag = "customers",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching customers", body = [crate::openapi::CustomerDoc]),
        (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc),
        (
            status = 404,
            description = "No customers found with the given name",
            body = crate::openapi::ErrorDoc
        ),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Customer>>, JsonApiError> {
    Ok(Json(state.customers.find_by_name_contains(&q.name).await?))
}

#[utoipa::path(
    post, path = "/api/customers", tag = "customers",
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::CustomerDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), JsonApiError> {
    let created = state.customers.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put, path = "/api/customers/{id}", tag = "customers",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = crate::openapi::CustomerInputDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::CustomerDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Customer not found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<Json<Customer>, JsonApiError> {
    Ok(Json(state.customers.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/api/customers/{id}", tag = "customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Customer not found", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Internal Server Error", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<StatusCode, JsonApiError> {
    state.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
