//! Users API handlers.
//!
//! ```text
//! POST /signup
//! GET /users        (filter email arrives in the JSON body)
//! GET /feed
//! PATCH /user/{userId}
//! DELETE /user/{userId}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::ports::UserStoreError;
use crate::domain::user::first_disallowed_field;
use crate::domain::{ApiResult, Error, NewUser, SignupFields, User, UserId, UserPatch};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_validation_error, missing_field_error};

/// Signup request body for `POST /signup`.
///
/// Optional fields receive documented defaults when omitted.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub photourl: Option<String>,
    pub about: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl From<SignupRequest> for SignupFields {
    fn from(value: SignupRequest) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            password: value.password,
            age: value.age,
            gender: value.gender,
            photourl: value.photourl,
            about: value.about,
            skills: value.skills,
        }
    }
}

/// Lookup request body for `GET /users`.
///
/// The filter criterion travels in the request body, mirroring the
/// documented surface of this endpoint.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FetchUserRequest {
    pub email: Option<String>,
}

// Store faults surface as 500 with the operation's generic message and the
// cause tucked into details.
fn store_fault(message: &'static str, err: &UserStoreError) -> Error {
    error!(error = %err, "user store operation failed");
    Error::internal(message).with_details(json!({ "cause": err.to_string() }))
}

// Malformed path ids surface as 500, like any other fault below the
// allow-list gate.
fn parse_user_id(raw: &str, message: &'static str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| {
        Error::internal(message).with_details(json!({
            "cause": err.to_string(),
            "value": raw,
        }))
    })
}

/// Create a user.
///
/// Every failure of this operation is reported as a 400, duplicates and
/// store faults included.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failure or duplicate email", body = Error)
    ),
    tags = ["users"],
    operation_id = "signup"
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: Option<web::Json<SignupRequest>>,
) -> ApiResult<HttpResponse> {
    // An absent body behaves like an empty one: required-field validation
    // reports the failure.
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let draft =
        NewUser::try_from_parts(request.into()).map_err(|err| map_validation_error(&err))?;
    let user = state
        .users
        .insert(draft)
        .await
        .map_err(map_signup_store_error)?;
    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully",
        "user": user,
    })))
}

fn map_signup_store_error(err: UserStoreError) -> Error {
    match err {
        UserStoreError::DuplicateEmail { email } => {
            Error::invalid_request("email is already registered").with_details(json!({
                "field": "email",
                "value": email,
                "code": "duplicate_email",
            }))
        }
        other => {
            error!(error = %other, "signup failed against the user store");
            Error::invalid_request("unable to create user")
                .with_details(json!({ "cause": other.to_string() }))
        }
    }
}

/// Fetch a single user by email.
#[utoipa::path(
    get,
    path = "/users",
    request_body = FetchUserRequest,
    responses(
        (status = 200, description = "Matching user", body = User),
        (status = 400, description = "Email missing from the request", body = Error),
        (status = 404, description = "No user found", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "fetchUserByEmail"
)]
#[get("/users")]
pub async fn fetch_user(
    state: web::Data<HttpState>,
    payload: Option<web::Json<FetchUserRequest>>,
) -> ApiResult<web::Json<User>> {
    let email = payload
        .and_then(|body| body.into_inner().email)
        .ok_or_else(|| missing_field_error("email", "Email is required"))?;

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|err| store_fault("Error fetching user", &err))?;
    user.map(web::Json)
        .ok_or_else(|| Error::not_found("No user found"))
}

/// List every user.
#[utoipa::path(
    get,
    path = "/feed",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "feed"
)]
#[get("/feed")]
pub async fn feed(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<User>>> {
    let users = state
        .users
        .list_all()
        .await
        .map_err(|err| store_fault("Error fetching data", &err))?;
    Ok(web::Json(users))
}

/// Partially update a user.
///
/// The update is all-or-nothing over the submitted key set: one key outside
/// the allow-list rejects the request before anything is applied. Values
/// re-run the creation validators; their failures report as 500.
#[utoipa::path(
    patch,
    path = "/user/{userId}",
    params(("userId" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Disallowed update field", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Validation or store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/user/{user_id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: Option<web::Json<Map<String, Value>>>,
) -> ApiResult<HttpResponse> {
    // An absent body is an empty patch, which passes the allow-list
    // vacuously and performs a timestamp-only update.
    let fields = payload.map(web::Json::into_inner).unwrap_or_default();
    if let Some(field) = first_disallowed_field(&fields) {
        return Err(
            Error::invalid_request("Invalid update fields").with_details(json!({
                "field": field,
                "code": "disallowed_field",
            })),
        );
    }

    let user_patch = UserPatch::try_from_fields(&fields).map_err(|err| {
        Error::internal("Error updating user").with_details(json!({ "cause": err.to_string() }))
    })?;
    let id = parse_user_id(&path.into_inner(), "Error updating user")?;

    let user = state
        .users
        .update(&id, user_patch)
        .await
        .map_err(|err| store_fault("Error updating user", &err))?;
    let user = user.ok_or_else(|| Error::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully",
        "user": user,
    })))
}

/// Delete a user, returning its final snapshot.
#[utoipa::path(
    delete,
    path = "/user/{userId}",
    params(("userId" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Deleted user", body = User),
        (status = 404, description = "No user found", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/user/{user_id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner(), "Error deleting user")?;
    let user = state
        .users
        .delete(&id)
        .await
        .map_err(|err| store_fault("Error deleting user", &err))?;
    let user = user.ok_or_else(|| Error::not_found("No user found"))?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted successfully",
        "user": user,
    })))
}

#[cfg(test)]
mod tests;
