use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use ts_rs::TS;

use crate::models::{ListQuery, Page};

/// ApiResponse
///
/// The success half of the `{success, message, data}` envelope. The HTTP status rides
/// along so handlers can pick 200 or 201 without wrapping the body in a tuple.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// ListData
///
/// The `data` payload of every list endpoint. `per_page` is the number of items actually
/// returned; `limit` is the effective page size after clamping.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListData<T> {
    pub total_records: i64,
    pub current_page: i64,
    pub per_page: i64,
    pub items: Vec<T>,
    pub limit: i64,
}

impl<T> ListData<T> {
    pub fn from_page(page: Page<T>, query: &ListQuery) -> Self {
        Self {
            total_records: page.total,
            current_page: query.page,
            per_page: page.items.len() as i64,
            items: page.items,
            limit: query.limit,
        }
    }
}
