//! Settings DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of `PUT /api/settings/bilibili/cookie`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCookieRequest {
    /// Raw `Cookie` header value; empty clears the stored cookie
    #[validate(length(max = 8192, message = "cookie must be at most 8192 characters"))]
    #[schema(example = "SESSDATA=...; bili_jct=...")]
    pub cookie: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CookieResponse {
    pub cookie: String,
}
