/// Session Routes
///
/// Token refresh, logout and current identity. Login is not exposed here:
/// the host authenticates users its own way and calls
/// `RotationProtocol::login`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::IdentityClaims;
use crate::error::{AppError, ErrorContext};
use crate::rotation::{RotationProtocol, TokenPair};
use crate::transport::{CookieTransport, TokenTransport};

/// Token refresh request for clients that do not use cookies
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh response
///
/// Tokens are echoed in the body only to clients that sent them in the
/// body; cookie clients get them as `HttpOnly` cookies alone.
#[derive(Serialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn new(pair: &TokenPair, expires_in: i64, include_tokens: bool) -> Self {
        Self {
            access_token: include_tokens.then(|| pair.access_token.as_str().to_string()),
            refresh_token: include_tokens.then(|| pair.refresh_token.as_str().to_string()),
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// POST /auth/refresh
///
/// Rotate the session: takes the (possibly expired) access token and the
/// current refresh token, from cookies or from a JSON body, and returns a
/// new pair. The presented refresh token is unusable afterwards.
///
/// # Errors
/// - 401: Missing tokens, invalid access token, or invalid/expired/replayed refresh token
/// - 503: Session store unavailable (retryable)
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    protocol: web::Data<RotationProtocol>,
    transport: web::Data<CookieTransport>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let presented = transport.extract(&req);

    let (access_token, refresh_token, from_body) =
        match (presented.access_token, presented.refresh_token, body) {
            (Some(access), Some(refresh), _) => (access, refresh, false),
            (_, _, Some(body)) => {
                let body = body.into_inner();
                (body.access_token, body.refresh_token, true)
            }
            _ => {
                let err = AppError::MissingToken;
                context.log_error(&err);
                return Err(err);
            }
        };

    let pair = protocol
        .refresh(&access_token, &refresh_token)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            context.log_error(&err);
            err
        })?;

    tracing::info!(request_id = %context.request_id, "Token refreshed successfully");

    let mut response = HttpResponse::Ok();
    transport.attach(&pair, &mut response);
    Ok(response.json(AuthResponse::new(
        &pair,
        protocol.access_ttl().num_seconds(),
        from_body,
    )))
}

/// POST /api/logout
///
/// **Requires valid access token.** Clears the caller's session so the
/// outstanding refresh token stops working, and expires both cookies.
pub async fn logout(
    claims: web::ReqData<IdentityClaims>,
    protocol: web::Data<RotationProtocol>,
    transport: web::Data<CookieTransport>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("logout").with_subject_id(claims.subject_id.clone());

    protocol.logout(&claims.subject_id).await.map_err(|e| {
        let err = AppError::from(e);
        context.log_error(&err);
        err
    })?;

    let mut response = HttpResponse::NoContent();
    transport.clear(&mut response);
    Ok(response.finish())
}

/// GET /api/me
///
/// **Requires valid access token.** Returns the identity carried by it.
pub async fn current_user(claims: web::ReqData<IdentityClaims>) -> HttpResponse {
    HttpResponse::Ok().json(claims.into_inner())
}
