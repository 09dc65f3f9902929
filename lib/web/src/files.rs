use crate::error::ComposeServerError;
use crate::AppState;
use axum::extract::State;
use axum::http::{header, Method, Uri};
use axum::response::{IntoResponse, Response};
use std::path::Path;
use tracing::{debug, info};

/// The content types of the files the web app is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mime {
    Json,
    Sparql,
    Plain,
    Html,
    Js,
    Css,
}

impl Mime {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Sparql => "application/sparql-query",
            Self::Plain => "text/plain",
            Self::Html => "text/html",
            Self::Js => "application/javascript",
            Self::Css => "text/css",
        }
    }

    /// Guesses from the file extension, plain text if unknown.
    pub(crate) fn guess(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("html" | "htm") => Self::Html,
            Some("json") => Self::Json,
            Some("css") => Self::Css,
            Some("js") => Self::Js,
            Some("rq" | "sparql") => Self::Sparql,
            _ => Self::Plain,
        }
    }
}

pub(crate) fn respond(mime: Mime, body: impl Into<String>) -> Response {
    ([(header::CONTENT_TYPE, mime.as_str())], body.into()).into_response()
}

pub async fn handle_index(State(state): State<AppState>) -> Result<Response, ComposeServerError> {
    serve_file(&state, "index.html")
}

pub async fn handle_blank_config() -> Response {
    respond(Mime::Json, "{}")
}

/// Answers `GET` requests for any cached file. Other methods are not allowed.
pub async fn handle_file(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ComposeServerError> {
    if state.verbose() {
        info!("{method} {uri}");
    }
    if method != Method::GET {
        return Err(ComposeServerError::MethodNotAllowed);
    }
    serve_file(&state, uri.path().trim_start_matches('/'))
}

fn serve_file(state: &AppState, name: &str) -> Result<Response, ComposeServerError> {
    let content = state.get(name).ok_or(ComposeServerError::NotFound)?;
    debug!("Reading file {name}");
    Ok(respond(Mime::guess(name), content))
}
