//! Extractors that report malformed input through the `ApiResponse` envelope.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies and
//! statuses such as 415 or 422. These wrappers route every rejection through
//! [`ApiError::ValidationError`] so clients always get a 400 envelope.

use axum::extract::{FromRequest, FromRequestParts};

use super::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
