use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::validation::{validate_email, validate_password, validate_username};
use super::{
    ApiError, ApiResponse, AppState, RegisterRequest, UpdateUserRequest, UserDto,
};
use crate::auth::rbac::{Identity, Role};
use crate::db::AccountChanges;
use crate::services::auth::Registration;

/// GET /api/users — admin only.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    identity.require_role(Role::Admin)?;

    let accounts = state.store().list_accounts().await?;
    let users: Vec<UserDto> = accounts.into_iter().map(UserDto::from).collect();

    Ok(Json(ApiResponse::success(users)))
}

/// POST /api/users — admin only. The created account still gets the USER
/// role; privilege is granted afterwards through an explicit update.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_role(Role::Admin)?;

    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let record = state
        .auth()
        .register(Registration {
            email: payload.email,
            username: payload.username,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    tracing::info!(
        user_id = record.0.id,
        created_by = identity.user_id,
        "User created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(record))),
    ))
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    fetch_user(&state, identity.user_id).await
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    apply_update(&state, &identity, identity.user_id, payload).await
}

/// DELETE /api/users/me
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, ApiError> {
    state.store().delete_account(identity.user_id).await?;

    tracing::info!(user_id = identity.user_id, "User deleted own account");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{id} — the account owner or an admin.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    identity.require_self_or_admin(id)?;

    fetch_user(&state, id).await
}

/// PUT /api/users/{id} — the account owner or an admin; a role change
/// additionally requires admin.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    identity.require_self_or_admin(id)?;

    apply_update(&state, &identity, id, payload).await
}

/// DELETE /api/users/{id} — admin only.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    identity.require_role(Role::Admin)?;

    state.store().delete_account(id).await.map_err(|e| {
        if matches!(e, crate::db::StoreError::NotFound) {
            ApiError::not_found("User", id)
        } else {
            ApiError::from(e)
        }
    })?;

    tracing::info!(user_id = id, deleted_by = identity.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_user(state: &AppState, id: i32) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let record = state
        .store()
        .find_account_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(record))))
}

/// Validate and apply a partial update. Ownership has already been
/// checked; the role gate happens here because it depends on the payload,
/// not the target.
async fn apply_update(
    state: &AppState,
    identity: &Identity,
    id: i32,
    payload: UpdateUserRequest,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    if let Some(username) = &payload.username {
        validate_username(username)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }

    let role = match &payload.role {
        Some(role) => {
            // Role escalation is admin-only even on one's own account.
            identity.require_role(Role::Admin)?;
            let role: Role = role
                .parse()
                .map_err(|e: crate::auth::rbac::UnknownRole| ApiError::validation(e.to_string()))?;
            Some(role.as_str().to_string())
        }
        None => None,
    };

    let password_hash = match payload.password {
        Some(password) => Some(state.auth().hash_password(password).await?),
        None => None,
    };

    let record = state
        .store()
        .update_account(
            id,
            AccountChanges {
                email: payload.email,
                username: payload.username,
                password_hash,
                role,
                first_name: payload.first_name,
                last_name: payload.last_name,
                avatar: payload.avatar,
                bio: payload.bio,
            },
        )
        .await
        .map_err(|e| {
            if matches!(e, crate::db::StoreError::NotFound) {
                ApiError::not_found("User", id)
            } else {
                ApiError::from(e)
            }
        })?;

    tracing::info!(user_id = id, updated_by = identity.user_id, "User updated");

    Ok(Json(ApiResponse::success(UserDto::from(record))))
}
