//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

/// Aggregated OpenAPI description served by Swagger UI in debug builds.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::fetch_user,
        crate::inbound::http::users::feed,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::User,
        crate::domain::Gender,
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::inbound::http::users::SignupRequest,
        crate::inbound::http::users::FetchUserRequest,
    )),
    tags(
        (name = "users", description = "User management operations"),
        (name = "health", description = "Orchestration probes"),
    )
)]
pub struct ApiDoc;
