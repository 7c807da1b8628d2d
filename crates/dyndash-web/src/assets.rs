//! Embedded single-page UI.
//!
//! The `dist/` directory is compiled into the binary; unknown paths fall
//! back to `index.html` so the dashboard works from any entry URL.

use axum::{
    body::Body,
    extract::OriginalUri,
    http::{Method, Response, StatusCode, header},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "dist"]
struct EmbeddedDist;

pub async fn frontend(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path().trim_start_matches('/');
    if path.contains("..") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let candidate = if path.is_empty() { "index.html" } else { path };
    if let Some(resp) = embedded_response(candidate, &method) {
        return resp;
    }
    if let Some(resp) = embedded_response("index.html", &method) {
        return resp;
    }

    StatusCode::NOT_FOUND.into_response()
}

fn embedded_response(path: &str, method: &Method) -> Option<Response<Body>> {
    let asset = EmbeddedDist::get(path)?;
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(asset.data.into_owned())
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(
            header::CACHE_CONTROL,
            if path == "index.html" {
                "no-cache"
            } else {
                "public, max-age=86400"
            },
        )
        .header(
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; base-uri 'self'; frame-ancestors 'none'; form-action 'self'; \
             script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; \
             connect-src 'self'; object-src 'none'",
        )
        .header(header::REFERRER_POLICY, "no-referrer")
        .body(body)
        .ok()
}
