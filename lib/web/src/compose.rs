use crate::error::ComposeServerError;
use crate::files::{respond, Mime};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use rdf_spatial_compose::{compose, ComposeError, QueryConfigDocument};
use tracing::info;

/// Composes the query for the configuration in the request body.
///
/// The request must be sent as `application/json` and accept `application/sparql-query`.
pub async fn handle_compose(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ComposeServerError> {
    if state.verbose() {
        info!("POST /compose");
    }
    let content_type = headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes());
    let accept = headers.get(header::ACCEPT).map(|v| v.as_bytes());
    if content_type != Some(Mime::Json.as_str().as_bytes())
        || accept != Some(Mime::Sparql.as_str().as_bytes())
    {
        return Err(ComposeServerError::BadRequest(
            "Expected HTTP headers 'Content-type: application/json' and 'Accept: application/sparql-query' not found.".to_owned(),
        ));
    }

    let document: QueryConfigDocument = serde_json::from_str(&body).map_err(ComposeError::from)?;
    if state.verbose() {
        info!("Composing from config {document:?}");
    }
    let query = compose(document, state.files())?;
    Ok(respond(Mime::Sparql, query))
}
