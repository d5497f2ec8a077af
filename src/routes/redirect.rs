//! Redirect routes.

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse, StatusCode};

pub async fn redirect_301(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::redirect(StatusCode::MovedPermanently, "/basic"))
}

pub async fn redirect_302(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::redirect(StatusCode::Found, "/basic"))
}

/// A 308 must be followed with the same method and body, so the target only
/// accepts `POST`.
pub async fn redirect_308(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::redirect(StatusCode::PermanentRedirect, "/redirect-308-2"))
}

pub async fn redirect_308_2(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("Redirect successful"))
}
