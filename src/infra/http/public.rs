use std::{io::ErrorKind, sync::Arc};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, HOST},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::error;

use crate::{
    application::{
        error::HttpError,
        media::{MediaError, MediaService},
        public::{PublicError, PublicService},
        repos::HealthRepo,
    },
    domain::datetime::format_calendar_date,
};

use super::{RouterState, db_health_response, repo_error_to_http};

const SITEMAP_PATHS: &[&str] = &[
    "/",
    "/menu",
    "/ordering",
    "/musician",
    "/rentals",
    "/reviews",
    "/location",
];

#[derive(Clone)]
pub struct HttpState {
    pub public: Arc<PublicService>,
    pub media: MediaService,
    pub health: Arc<dyn HealthRepo>,
}

pub(super) fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(home))
        .route("/menu", get(menu))
        .route("/ordering", get(chrome_only))
        .route("/musician", get(chrome_only))
        .route("/rentals", get(chrome_only))
        .route("/reviews", get(reviews))
        .route("/location", get(location))
        .route("/healthz", get(healthz))
        .route("/_health/db", get(public_health))
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap))
        .route("/static/media/{*path}", get(serve_media))
}

async fn home(State(state): State<HttpState>) -> Response {
    Json(state.public.home().await).into_response()
}

async fn menu(State(state): State<HttpState>) -> Response {
    match state.public.menu().await {
        Ok(page) => Json(page).into_response(),
        Err(err) => public_error_response("infra::http::public::menu", err),
    }
}

/// Pages whose content is static apart from the shared site chrome.
async fn chrome_only(State(state): State<HttpState>) -> Response {
    Json(state.public.chrome().await).into_response()
}

async fn reviews(State(state): State<HttpState>) -> Response {
    match state.public.reviews().await {
        Ok(page) => Json(page).into_response(),
        Err(err) => public_error_response("infra::http::public::reviews", err),
    }
}

async fn location(State(state): State<HttpState>) -> Response {
    Json(state.public.location().await).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

async fn robots_txt() -> Response {
    plain_response("User-agent: *\nAllow: /\nSitemap: /sitemap.xml\n".to_string())
}

async fn sitemap(headers: HeaderMap) -> Response {
    let base = base_url(&headers);
    let lastmod = format_calendar_date(OffsetDateTime::now_utc().date());
    xml_response(sitemap_xml(&base, &lastmod))
}

async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";

    match state.media.local().read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(MediaError::InvalidPath) => not_found_media(SOURCE),
        Err(MediaError::Io(err)) if err.kind() == ErrorKind::NotFound => not_found_media(SOURCE),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored media"
            );
            HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read media file",
                err.to_string(),
            )
            .into_response()
        }
    }
}

fn not_found_media(source: &'static str) -> Response {
    HttpError::new(
        source,
        StatusCode::NOT_FOUND,
        "Media not found",
        "The requested media file is not available",
    )
    .into_response()
}

fn public_error_response(source: &'static str, err: PublicError) -> Response {
    match err {
        PublicError::Repo(err) => repo_error_to_http(source, err).into_response(),
    }
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|value| matches!(*value, "http" | "https"))
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn sitemap_xml(base: &str, lastmod: &str) -> String {
    let base = escape_xml(base);
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for path in SITEMAP_PATHS {
        body.push_str(&format!(
            "  <url>\n    <loc>{base}{path}</loc>\n    <lastmod>{lastmod}</lastmod>\n    \
             <changefreq>weekly</changefreq>\n    <priority>0.8</priority>\n  </url>\n"
        ));
    }
    body.push_str("</urlset>");
    body
}

fn plain_response(body: String) -> Response {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn xml_response(body: String) -> Response {
    ([(CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitemap_lists_every_public_page() {
        let xml = sitemap_xml("https://example.com", "2025-06-01");
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/location</loc>"));
        assert_eq!(xml.matches("<url>").count(), SITEMAP_PATHS.len());
        assert!(xml.contains("<lastmod>2025-06-01</lastmod>"));
    }

    #[test]
    fn base_url_honours_forwarded_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("taproom.test"));
        assert_eq!(base_url(&headers), "http://taproom.test");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(base_url(&headers), "https://taproom.test");
    }

    #[test]
    fn sitemap_escapes_the_host() {
        let xml = sitemap_xml("http://a&b\"<c>", "2025-06-01");
        assert!(xml.contains("<loc>http://a&amp;b&quot;&lt;c&gt;/menu</loc>"));
        assert!(!xml.contains("a&b"));
    }
}
