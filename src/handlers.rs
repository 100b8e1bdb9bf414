use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, DatabaseError};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub slug: String,
    pub target: String,
}

impl LinkRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.slug.is_empty() {
            return Err(AppError::ValidationError("slug must not be empty".into()));
        }
        if self.target.is_empty() {
            return Err(AppError::ValidationError("target must not be empty".into()));
        }
        Ok(())
    }
}

fn message(text: impl Into<String>) -> serde_json::Value {
    json!({ "message": text.into() })
}

pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(message("pong"))
}

/// `GET /{slug}`: 307 to the stored target.
pub async fn redirect(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let slug = path.into_inner();

    match state.links.get_by_slug(&slug).await {
        Ok(link) => HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, link.target))
            .finish(),
        Err(AppError::DatabaseError(DatabaseError::NotFound)) => {
            HttpResponse::NotFound().json(message("Not found"))
        }
        Err(e) => {
            error!("Lookup of {} failed: {}", slug, e);
            HttpResponse::NotFound().json(message("Not found"))
        }
    }
}

/// `GET /`: every link, `[]` when there are none.
pub async fn list_links(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let links = state.links.list().await.map_err(|e| {
        error!("Listing links failed: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(links))
}

/// `POST /`: create or overwrite a link, owned by the caller when new.
pub async fn upsert_link(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    req: web::Json<LinkRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    req.validate()?;

    let link = state.links.upsert(&req.slug, &req.target, user.name()).await.map_err(|e| {
        error!("Upsert of {} by {} failed: {}", req.slug, user.name(), e);
        e
    })?;

    info!("{} saved {} -> {}", user.name(), link.slug, link.target);
    Ok(HttpResponse::Ok().json(LinkRequest {
        slug: link.slug,
        target: link.target,
    }))
}

/// `DELETE /{slug}`: succeeds whether or not the slug existed.
pub async fn delete_link(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let slug = path.into_inner();

    match state.links.delete_by_slug(&slug).await {
        Ok(removed) => {
            info!("{} deleted {} ({} row(s))", user.name(), slug, removed);
            HttpResponse::Ok().json(message(format!("Deleted {}", slug)))
        }
        Err(e) => {
            error!("Delete of {} failed: {}", slug, e);
            HttpResponse::BadRequest().json(message(e.to_string()))
        }
    }
}

/// Malformed JSON bodies answer in the same `{message}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}
