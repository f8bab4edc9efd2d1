// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP file server over a bucket view
//!
//! `GET`/`HEAD /path` streams the object at `path`. Directories are served
//! through their `index.html` when they have one and as an HTML listing
//! otherwise; a directory URL without a trailing slash is redirected to
//! the slash form so that relative links resolve.

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::TypedHeader;
use axum_extra::headers::{
    AcceptRanges, ContentLength, ContentRange, ContentType, ETag, HeaderMapExt, IfModifiedSince,
    IfNoneMatch, LastModified, Range as RangeHeader,
};
use bucketfs::{BucketFs, Dir, Error, File, Handle, ObjectAttrs};
use std::net::SocketAddr;
use std::ops::{Bound, Range};
use std::time::{Duration, SystemTime};
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use url::Url;

const INDEX_PAGE: &str = "index.html";

#[derive(Clone)]
struct ServeState {
    fs: BucketFs,
    timeout: Option<Duration>,
}

impl ServeState {
    /// The view for one request; the deadline starts with the request
    fn view(&self) -> BucketFs {
        match self.timeout {
            Some(timeout) => self.fs.clone().with_timeout(timeout),
            None => self.fs.clone(),
        }
    }
}

/// Routes serving `fs`, with `timeout` applied to each request
pub fn router(fs: BucketFs, timeout: Option<Duration>) -> Router {
    Router::new()
        .route("/", get(serve_root))
        .route("/{*path}", get(serve_path))
        .with_state(ServeState { fs, timeout })
}

/// Listen on `port` until Ctrl-C or SIGTERM
pub async fn serve_command<F>(
    fs: BucketFs,
    timeout: Option<Duration>,
    port: u16,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(&str),
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let bound = listener.local_addr()?.to_string();
    diagnostics::info!("Server listening on {addr}", addr: &bound);
    handler(&format!("Server listening on {bound}"));

    axum::serve(listener, router(fs, timeout))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    diagnostics::info!("Server shut down gracefully");
    Ok(())
}

/// Completes on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            let error = e.to_string();
            diagnostics::error!("Failed to install Ctrl+C handler: {error}", error: error);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                _ = signal.recv().await;
            }
            Err(e) => {
                let error = e.to_string();
                diagnostics::error!("Failed to install SIGTERM handler: {error}", error: error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    diagnostics::info!("Shutdown signal received");
}

async fn serve_root(State(state): State<ServeState>, uri: Uri, headers: HeaderMap) -> Response {
    serve(&state.view(), "", &uri, &headers).await
}

async fn serve_path(
    State(state): State<ServeState>,
    Path(path): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve(&state.view(), &path, &uri, &headers).await
}

/// `request` is the decoded URL path without its leading slash
async fn serve(fs: &BucketFs, request: &str, uri: &Uri, headers: &HeaderMap) -> Response {
    let wants_dir = request.is_empty() || request.ends_with('/');
    let trimmed = request.trim_end_matches('/');
    let path = if trimmed.is_empty() { "." } else { trimmed };

    let handle = match fs.open(path).await {
        Ok(handle) => handle,
        Err(err) => return error_response(&err),
    };

    match handle {
        Handle::File(file) => {
            if wants_dir {
                return redirect(uri.path().trim_end_matches('/'));
            }
            serve_file(fs, path, file, headers).await
        }
        Handle::Dir(dir) => {
            if !wants_dir {
                return redirect(&format!("{}/", uri.path()));
            }
            let index = bucketfs::path::join(path, INDEX_PAGE);
            match fs.open(&index).await {
                Ok(Handle::File(file)) => serve_file(fs, &index, file, headers).await,
                _ => serve_listing(dir).await,
            }
        }
    }
}

fn redirect(location: &str) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        let error = err.to_string();
        diagnostics::warn!("Request failed: {error}", error: error);
    }
    (status, format!("{status}\n")).into_response()
}

/// The part of a file selected by a `Range` header
#[derive(Debug, Clone, PartialEq, Eq)]
enum ByteRange {
    Full,
    Partial(Range<u64>),
    Unsatisfiable,
}

/// Interpret a `Range` header against `size`. Only a single range is
/// honoured; a request for several gets the full content.
fn byte_range(range: Option<&RangeHeader>, size: u64) -> ByteRange {
    let Some(range) = range else {
        return ByteRange::Full;
    };

    let bounds: Vec<(Bound<u64>, Bound<u64>)> = range.satisfiable_ranges(size).collect();
    let [(first, last)] = bounds.as_slice() else {
        return if bounds.is_empty() {
            ByteRange::Unsatisfiable
        } else {
            ByteRange::Full
        };
    };

    let (start, end) = match (*first, *last) {
        (Bound::Included(start), Bound::Included(last)) => (start, last.saturating_add(1).min(size)),
        (Bound::Included(start), Bound::Unbounded) => (start, size),
        // Suffix range: the last `n` bytes
        (Bound::Unbounded, Bound::Included(n)) => (size.saturating_sub(n), size),
        _ => return ByteRange::Full,
    };

    if start < end {
        ByteRange::Partial(start..end)
    } else {
        ByteRange::Unsatisfiable
    }
}

/// Strong entity tag from the store's e-tag, quoted when the store hands
/// it back bare
fn entity_tag(attrs: &ObjectAttrs) -> Option<ETag> {
    let tag = attrs.e_tag.as_deref()?;
    if tag.starts_with('"') || tag.starts_with("W/") {
        tag.parse().ok()
    } else {
        format!("\"{tag}\"").parse().ok()
    }
}

/// True when the client's cached copy is current. `If-None-Match` takes
/// precedence over `If-Modified-Since`.
fn not_modified(request: &HeaderMap, etag: Option<&ETag>, modified: SystemTime) -> bool {
    if let Some(if_none_match) = request.typed_get::<IfNoneMatch>() {
        return etag.is_some_and(|etag| !if_none_match.precondition_passes(etag));
    }
    request
        .typed_get::<IfModifiedSince>()
        .is_some_and(|since| !since.is_modified(modified))
}

async fn serve_file(fs: &BucketFs, path: &str, file: File, request: &HeaderMap) -> Response {
    let meta = file.stat();
    let size = meta.size();
    let modified = SystemTime::from(meta.modified());
    let etag = entity_tag(file.attrs());

    let mut headers = HeaderMap::new();
    headers.typed_insert(LastModified::from(modified));
    if let Some(etag) = &etag {
        headers.typed_insert(etag.clone());
    }

    if not_modified(request, etag.as_ref(), modified) {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.typed_insert(ContentType::from(
        mime_guess::from_path(meta.name()).first_or_octet_stream(),
    ));
    headers.typed_insert(AcceptRanges::bytes());

    match byte_range(request.typed_get::<RangeHeader>().as_ref(), size) {
        ByteRange::Full => {
            headers.typed_insert(ContentLength(size));
            (
                StatusCode::OK,
                headers,
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response()
        }
        ByteRange::Partial(range) => {
            // Fetch only the requested bytes
            drop(file);
            let Ok(content_range) = ContentRange::bytes(range.clone(), size) else {
                return unsatisfiable(size);
            };
            let length = range.end - range.start;
            let part = match fs.open_range(path, range).await {
                Ok(part) => part,
                Err(err) => return error_response(&err),
            };

            headers.typed_insert(ContentLength(length));
            headers.typed_insert(content_range);
            (
                StatusCode::PARTIAL_CONTENT,
                headers,
                Body::from_stream(ReaderStream::new(part)),
            )
                .into_response()
        }
        ByteRange::Unsatisfiable => unsatisfiable(size),
    }
}

fn unsatisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        TypedHeader(ContentRange::unsatisfied_bytes(size)),
    )
        .into_response()
}

async fn serve_listing(mut dir: Dir) -> Response {
    let entries = match dir.read_dir(None).await {
        Ok(entries) => entries,
        Err(err) => return error_response(&err),
    };

    let mut html = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
    for entry in &entries {
        let mut name = entry.name().to_string();
        if entry.is_dir() {
            name.push('/');
        }
        html.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            escape_html(&href(&name)),
            escape_html(&name)
        ));
    }
    html.push_str("</pre>\n");

    (TypedHeader(ContentType::html()), html).into_response()
}

/// Relative link to an entry, percent-encoded as one path segment
fn href(name: &str) -> String {
    let (segment, slash) = match name.strip_suffix('/') {
        Some(dir) => (dir, "/"),
        None => (name, ""),
    };
    Url::parse("http://localhost/")
        .ok()
        .and_then(|mut url| {
            _ = url.path_segments_mut().ok()?.pop_if_empty().push(segment);
            Some(format!("{}{slash}", url.path().trim_start_matches('/')))
        })
        .unwrap_or_else(|| name.to_string())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
