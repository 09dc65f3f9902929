use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rdf_spatial_compose::ComposeError;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum ComposeServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not Found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl ComposeServerError {
    /// The message sent to the client: the kind of compose errors followed by their description.
    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::NotFound | Self::MethodNotAllowed => self.to_string(),
            Self::Compose(e) => {
                let mut msg = format!("{}: {e}", e.kind());
                if matches!(e, ComposeError::MissingField(_)) {
                    msg.push_str(
                        " - please make sure to add at least one item to this mandatory field",
                    );
                }
                msg
            }
        }
    }
}

impl IntoResponse for ComposeServerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Compose(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.message();
        if status.is_server_error() {
            error!("{message}");
        }
        (status, message).into_response()
    }
}
