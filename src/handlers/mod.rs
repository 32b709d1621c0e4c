//! Request handlers module
//!
//! Handlers only extract the caller and request data, then delegate to the
//! lifecycle manager. Every failure is an [`AppError`](crate::error::AppError).

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::routes::ApiResponse;

pub mod attendees;
pub mod events;
pub mod groups;
pub mod images;
pub mod members;
pub mod session;
pub mod venues;

pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;
pub type Created<T> = AppResult<(StatusCode, Json<ApiResponse<T>>)>;

fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

fn created<T: Serialize>(data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

fn deleted() -> ApiResult<()> {
    Ok(Json(ApiResponse::success_msg("Successfully deleted")))
}
