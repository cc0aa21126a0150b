use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct CustomerDoc { pub id: i32, pub name: String, pub email: String }

/// Absent fields are reported as empty on create and keep the stored value on update.
#[derive(ToSchema)]
pub struct CustomerInputDoc { pub name: Option<String>, pub email: Option<String> }

#[derive(ToSchema)]
pub struct ViolationDoc { pub field: String, pub message: String }

#[derive(ToSchema)]
pub struct ErrorDoc {
    pub status: u16,
    pub error: String,
    pub message: Option<String>,
    pub violations: Option<Vec<ViolationDoc>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::customers::list,
        crate::routes::customers::get,
        crate::routes::customers::search,
        crate::routes::customers::create,
        crate::routes::customers::update,
        crate::routes::customers::delete,
    ),
    components(
        schemas(
            HealthResponse,
            CustomerDoc,
            CustomerInputDoc,
            ViolationDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "customers")
    )
)]
pub struct ApiDoc;
