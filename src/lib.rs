//! Access token issuance with rotating, server-validated refresh tokens.
//!
//! `rotation::RotationProtocol` is the entry point: it mints HS256 access
//! tokens, pairs them with opaque refresh tokens, and rotates the pair
//! against a `session::SessionStore`. The actix-web host in `startup`
//! exposes refresh, logout and identity routes over HTTP-only cookies.

pub mod auth;
pub mod clock;
pub mod configuration;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod rotation;
pub mod routes;
pub mod session;
pub mod startup;
pub mod telemetry;
pub mod transport;
