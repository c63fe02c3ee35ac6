/// Hub-secret auth gate and CORS preflight.
///
/// Runs as actix middleware in front of every route. `OPTIONS` requests are
/// answered directly with the CORS headers. Every other request must carry
/// the hub secret, either as a `token` query parameter or in the
/// `X-Api-Token` header; otherwise it is answered with 401 and never reaches
/// a handler.

use actix_web::{
    Error, HttpResponse,
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::Next,
    web,
};
use std::collections::HashMap;
use tracing::warn;

use crate::core::server::AppState;

/// Header carrying the hub secret when the query parameter is absent.
pub const TOKEN_HEADER: &str = "X-Api-Token";

/// Query parameter carrying the hub secret.
pub const TOKEN_QUERY_PARAM: &str = "token";

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, X-Api-Token";
pub const CORS_MAX_AGE: &str = "86400";

/// Extract the presented credential: non-empty query token first, then header.
pub fn presented_token(req: &ServiceRequest) -> Option<String> {
    let from_query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.get(TOKEN_QUERY_PARAM).cloned())
        .filter(|t| !t.is_empty());
    if from_query.is_some() {
        return from_query;
    }

    req.headers()
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Byte-for-byte comparison; an empty secret authorizes nothing.
pub fn is_authorized(presented: Option<&str>, secret: &str) -> bool {
    match presented {
        Some(token) => !secret.is_empty() && token.as_bytes() == secret.as_bytes(),
        None => false,
    }
}

pub fn preflight_response() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header(("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN))
        .insert_header(("Access-Control-Allow-Methods", CORS_ALLOW_METHODS))
        .insert_header(("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS))
        .insert_header(("Access-Control-Max-Age", CORS_MAX_AGE))
        .finish()
}

pub fn unauthorized_response() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header(("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN))
        .json(serde_json::json!({
            "success": false,
            "error": "Unauthorized"
        }))
}

/// Middleware entry point, installed with `middleware::from_fn(auth_gate)`.
pub async fn auth_gate<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    if req.method() == Method::OPTIONS {
        return Ok(req.into_response(preflight_response()).map_into_right_body());
    }

    let secret = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.config.hub_secret.clone())
        .unwrap_or_default();

    if !is_authorized(presented_token(&req).as_deref(), &secret) {
        warn!(
            method = %req.method(),
            path = req.path(),
            "rejected request without a valid hub token"
        );
        return Ok(req.into_response(unauthorized_response()).map_into_right_body());
    }

    let res = next.call(req).await?;
    Ok(res.map_into_left_body())
}
