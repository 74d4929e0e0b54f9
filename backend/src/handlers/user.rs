use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use uuid::Uuid;
use validator::Validate;

use super::ApiPath;
use crate::{
    AppState,
    auth::{
        ADMIN_COOKIE, AdminUser, AuthError, AuthUser, USER_COOKIE, cookie_name_for,
        expired_cookie, hash_password, issue_token, session_cookie, verify_password,
        verify_unknown_user,
    },
    error::{AppError, AppResult},
    models::{
        CreateUserRequest, ListParams, ListQuery, LoginRequest, LoginResponse, Role,
        UpdateUserRequest, User, UserProfile,
    },
    response::{ApiResponse, ListData},
};

/// login
///
/// [Public Route] Verifies credentials and issues a session token. The token is set as
/// an HttpOnly cookie (`admin_token` for admins, `token` otherwise) and echoed in the body.
#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        verify_unknown_user(&password);
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        return Err(AuthError::InactiveAccount.into());
    }

    let ttl_hours = state.config.jwt_ttl_hours;
    let token = issue_token(&user, &state.config.jwt_secret, ttl_hours)?;
    state.repo.record_login(user.id).await?;

    let cookie = session_cookie(
        cookie_name_for(&user.role),
        &token,
        ttl_hours * 3600,
        state.config.secure_cookies(),
    );

    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ApiResponse::ok(
            "Login successful",
            LoginResponse {
                user: user.profile(),
                token,
            },
        ),
    ))
}

/// logout
///
/// [Public Route] Expires both session cookies. Tokens are stateless, so there is
/// nothing to revoke server-side.
#[utoipa::path(
    post,
    path = "/api/v1/user/logout",
    tag = "users",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let secure = state.config.secure_cookies();
    (
        AppendHeaders([
            (SET_COOKIE, expired_cookie(ADMIN_COOKIE, secure)),
            (SET_COOKIE, expired_cookie(USER_COOKIE, secure)),
        ]),
        ApiResponse::ok("Logged out successfully", ()),
    )
}

/// get_me
///
/// [Authenticated Route] The profile behind the current session.
#[utoipa::path(
    get,
    path = "/api/v1/user/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = state
        .repo
        .get_user(auth.id)
        .await?
        .ok_or(AuthError::InactiveAccount)?;
    Ok(ApiResponse::ok("Profile fetched successfully", user.profile()))
}

/// create_user
///
/// [Admin Route] Creates a console account. Emails are unique (case-insensitive).
#[utoipa::path(
    post,
    path = "/api/v1/user/create",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let Json(payload) = payload?;
    let payload = payload.normalized();
    payload.validate()?;

    let hash = hash_password(payload.password.as_deref().unwrap_or_default())?;
    let user = state.repo.insert_user(&User::new(payload, hash)).await?;

    tracing::info!(user_id = %user.id, role = %user.role, admin_id = %admin.id, "user created");
    Ok(ApiResponse::created("User created successfully", user))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/list",
    tag = "users",
    params(ListParams),
    responses((status = 200, description = "Page of users", body = [User]))
)]
pub async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<User>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_users(&query).await?;
    Ok(ApiResponse::ok(
        "Users fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<User>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::ok("User fetched successfully", user))
}

/// update_user
///
/// [Admin Route] Partial update of name, password, role or status. An admin cannot
/// demote or deactivate their own account, so the console always keeps one way in.
#[utoipa::path(
    patch,
    path = "/api/v1/user/update/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let Json(patch) = payload?;
    let patch = patch.normalized();
    patch.validate()?;

    if id == admin.id {
        if patch.role.is_some_and(|role| role != Role::Admin) {
            return Err(AppError::field("role", "you cannot remove your own admin role"));
        }
        if patch.is_active == Some(false) {
            return Err(AppError::field("isActive", "you cannot deactivate your own account"));
        }
    }

    let mut user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let new_hash = match patch.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    user.apply(patch, new_hash);
    let saved = state
        .repo
        .update_user(&user)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!(user_id = %id, admin_id = %admin.id, "user updated");
    Ok(ApiResponse::ok("User updated successfully", saved))
}
