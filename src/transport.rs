/// Transport Binding
///
/// Moves tokens between the protocol and the wire. The cookie binding marks
/// both cookies `HttpOnly` and `SameSite=Strict`. Both live exactly as long
/// as the session: the access cookie has to outlast its token's `exp`,
/// because the refresh exchange needs the expired token back.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponseBuilder};
use chrono::{DateTime, Utc};

use crate::configuration::CookieSettings;
use crate::rotation::TokenPair;

/// Tokens found on an incoming request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PresentedTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

pub trait TokenTransport {
    type Request: ?Sized;
    type Response: ?Sized;

    fn attach(&self, tokens: &TokenPair, response: &mut Self::Response);
    fn extract(&self, request: &Self::Request) -> PresentedTokens;
    /// Tell the client to drop both tokens
    fn clear(&self, response: &mut Self::Response);
}

#[derive(Debug, Clone)]
pub struct CookieTransport {
    settings: CookieSettings,
}

impl CookieTransport {
    pub fn new(settings: CookieSettings) -> Self {
        Self { settings }
    }

    fn cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        Cookie::build(name.to_string(), value.to_string())
            .http_only(true)
            .secure(self.settings.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .finish()
    }

    fn session_cookie(&self, name: &str, value: &str, tokens: &TokenPair) -> Cookie<'static> {
        let lifetime = session_lifetime(tokens.issued_at, tokens.refresh_expires_at);
        let mut cookie = self.cookie(name, value);
        cookie.set_max_age(CookieDuration::seconds(lifetime));
        cookie
    }
}

impl TokenTransport for CookieTransport {
    type Request = HttpRequest;
    type Response = HttpResponseBuilder;

    fn attach(&self, tokens: &TokenPair, response: &mut HttpResponseBuilder) {
        response.cookie(self.session_cookie(
            &self.settings.access_cookie_name,
            tokens.access_token.as_str(),
            tokens,
        ));
        response.cookie(self.session_cookie(
            &self.settings.refresh_cookie_name,
            tokens.refresh_token.as_str(),
            tokens,
        ));
    }

    fn extract(&self, request: &HttpRequest) -> PresentedTokens {
        let access_token = request
            .cookie(&self.settings.access_cookie_name)
            .map(|c| c.value().to_string())
            .or_else(|| bearer_token(request));
        let refresh_token = request
            .cookie(&self.settings.refresh_cookie_name)
            .map(|c| c.value().to_string());

        PresentedTokens {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        }
    }

    fn clear(&self, response: &mut HttpResponseBuilder) {
        for name in [
            &self.settings.access_cookie_name,
            &self.settings.refresh_cookie_name,
        ] {
            let mut cookie = self.cookie(name, "");
            cookie.make_removal();
            response.cookie(cookie);
        }
    }
}

/// Whole seconds from mint to session expiry, measured on the protocol clock
fn session_lifetime(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> i64 {
    (expires_at - issued_at).num_seconds().max(0)
}

fn bearer_token(request: &HttpRequest) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}
