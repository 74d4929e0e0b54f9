use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::merge;

/// User
///
/// A console account stored in the `users` table. Content records reference it through
/// `createdBy`/`updatedBy`. The password hash is loaded for login but never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    // RBAC field: 'admin' or 'user'.
    pub role: String,
    pub is_active: bool,
    #[ts(type = "string | null")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Role
///
/// Only `Admin` may reach the content-management routes; `User` accounts can sign in
/// and read their own profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl User {
    pub fn new(req: CreateUserRequest, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: req.name.unwrap_or_default().trim().to_string(),
            email: normalize_email(req.email.as_deref().unwrap_or_default()),
            password_hash,
            role: req.role.unwrap_or_default().as_str().to_string(),
            is_active: req.is_active.unwrap_or(true),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    /// Merges an admin-issued patch. The new hash, if any, is computed by the caller.
    pub fn apply(&mut self, patch: UpdateUserRequest, new_password_hash: Option<String>) {
        merge(&mut self.name, patch.name);
        merge(&mut self.role, patch.role.map(|r| r.as_str().to_string()));
        merge(&mut self.is_active, patch.is_active);
        merge(&mut self.password_hash, new_password_hash);
        self.updated_at = Utc::now();
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Emails are compared case-insensitively; stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// CreateUserRequest
///
/// JSON body of `POST /api/v1/user/create` (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "is required"),
        length(min = 2, message = "must be at least 2 characters")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "is required"),
        email(message = "must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 8, message = "must be at least 8 characters")
    )]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateUserRequest {
    /// Trims the name and email so length and format rules see what will be stored.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| normalize_email(&e));
        self
    }
}

/// UpdateUserRequest
///
/// Partial update for `PATCH /api/v1/user/update/{id}`. Email is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self
    }
}

/// LoginRequest
///
/// Body of `POST /api/v1/user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(
        required(message = "is required"),
        email(message = "must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, message = "is required")
    )]
    pub password: Option<String>,
}

/// UserProfile
///
/// Public projection of a user, returned by `/me` and login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// LoginResponse
///
/// The token is also set as an HttpOnly cookie; it is echoed here for non-browser clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}
