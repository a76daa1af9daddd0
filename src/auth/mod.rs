/// Authentication module
///
/// Signing key, access token codec and refresh token generation.

mod claims;
mod jwt;
mod refresh_token;
mod signing_key;

pub use claims::{Claims, IdentityClaims};
pub use jwt::{AccessToken, AccessTokenCodec, ExpiryPolicy};
pub use refresh_token::RefreshToken;
pub use signing_key::SigningKey;
pub(crate) use signing_key::MIN_SECRET_BYTES;
