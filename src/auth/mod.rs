//! Bearer-token authentication.
//!
//! [`TokenService`] signs and verifies tokens; [`Authenticator`] turns an
//! `Authorization` header into a known [`crate::db::User`] and is wired into
//! handlers through the [`AuthenticatedUser`] extractor.

pub mod middleware;
pub mod service;

pub use middleware::{AuthenticatedUser, Authenticator};
pub use service::{TokenClaims, TokenService};
