use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use tracing::{debug, error, warn};

use crate::auth::service::TokenService;
use crate::db::{User, UserRepository};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::AppState;

/// Resolves an `Authorization` header to a known user.
#[derive(Clone)]
pub struct Authenticator {
    tokens: TokenService,
    users: UserRepository,
}

impl Authenticator {
    pub fn new(tokens: TokenService, users: UserRepository) -> Self {
        Self { tokens, users }
    }

    /// Runs the checks in a fixed order; the first failure decides the rejection.
    pub async fn authenticate(&self, authorization: Option<&HeaderValue>) -> Result<User, AuthError> {
        let value = match authorization {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingHeader),
        };

        let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = token_from_header(value)?;

        let claims = self.tokens.verify(token)?;

        match self.users.get(&claims.user).await {
            Ok(user) => Ok(user),
            Err(AppError::DatabaseError(DatabaseError::NotFound)) => Err(AuthError::UnknownUser),
            Err(e) => {
                error!("User lookup for {} failed: {}", claims.user, e);
                Err(AuthError::UnknownUser)
            }
        }
    }
}

/// Splits `<scheme> <token>` on single spaces. The scheme is not inspected.
fn token_from_header(value: &str) -> Result<&str, AuthError> {
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [_scheme, token] => Ok(*token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// The user behind a request's bearer token. Declaring it as a handler argument
/// protects that route; extraction fails with a 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let authenticator = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.authenticator.clone());
        let authorization = req.headers().get(header::AUTHORIZATION).cloned();
        let route = format!("{} {}", req.method(), req.path());

        Box::pin(async move {
            let authenticator = authenticator
                .ok_or_else(|| AppError::InternalError("application state is not registered".into()))?;

            match authenticator.authenticate(authorization.as_ref()).await {
                Ok(user) => {
                    debug!("{} authenticated as {}", route, user.name);
                    Ok(AuthenticatedUser(user))
                }
                Err(reason) => {
                    warn!("Rejected {}: {:?}", route, reason);
                    Err(reason.into())
                }
            }
        })
    }
}
