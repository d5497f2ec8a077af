//! The static asset route.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use tokio::fs;

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse, StatusCode};

/// Content-Type for a file, chosen by its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain; charset=utf-8",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// `Last-Modified` / `If-Modified-Since` date layout (IMF-fixdate).
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE).to_string()
}

/// Whether the client's cached copy, per `If-Modified-Since`, is still
/// current. Dates are compared to the second; an unparsable date never
/// matches.
fn is_not_modified(req: &HttpRequest, modified: DateTime<Utc>) -> bool {
    req.get_header("If-Modified-Since")
        .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())
        .is_some_and(|since| since.timestamp() >= modified.timestamp())
}

/// Serve `file` byte-for-byte with its `Last-Modified` date. A missing file
/// is a routing miss.
pub async fn serve_file(req: HttpRequest, file: PathBuf) -> Result<HttpResponse, Error> {
    let metadata = match fs::metadata(&file).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Static file {} is missing", file.display());
            return Err(Error::NotFound(req.method, req.path));
        }
        Err(e) => return Err(e.into()),
    };
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

    if let Some(modified) = modified {
        if is_not_modified(&req, modified) {
            return Ok(HttpResponse::new(StatusCode::NotModified)
                .with_header("Last-Modified", http_date(modified)));
        }
    }

    let content = fs::read(&file).await?;

    let mut response = HttpResponse::new(StatusCode::Ok)
        .with_content_type(content_type_for(&file))
        .with_body_bytes(content);
    if let Some(modified) = modified {
        response = response.with_header("Last-Modified", http_date(modified));
    }
    Ok(response)
}
