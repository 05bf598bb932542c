// Warp error handling and propagation
//
// Handlers return `Result<Reply, ApiError>` instead of rejecting: a rejection tells warp to try
// the next filter, while a catalog error is the final answer for the request. `into_response`
// folds both sides of the result into a response, so a route reads:
//
//   .then(my_handler_func)
//   .map(into_response)
//

use serde::Serialize;
use tracing::debug;
use warp::hyper::{Body, Response, StatusCode};
use warp::Reply;

use crate::catalog::CatalogError;

#[derive(Debug)]
pub enum ApiError {
    CatalogError(CatalogError),
}

// Lets handlers use `?` on anything that returns a `CatalogResult`
impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::CatalogError(err)
    }
}

/// Error body sent to clients.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    fn status_code_body(self: ApiError) -> (StatusCode, ErrorMessage) {
        let (status, message) = match self {
            ApiError::CatalogError(e @ CatalogError::InvalidArgument { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::CatalogError(e @ CatalogError::NotImplemented { .. }) => {
                (StatusCode::NOT_IMPLEMENTED, e.to_string())
            }
            ApiError::CatalogError(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            ApiError::CatalogError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (
            status,
            ErrorMessage {
                code: status.as_u16(),
                message,
            },
        )
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response<Body> {
        let (status, body) = self.status_code_body();
        debug!("Request failed with {status}: {}", body.message);
        warp::reply::with_status(warp::reply::json(&body), status).into_response()
    }
}

pub fn into_response<S: Reply, E: Reply>(reply_res: Result<S, E>) -> Response<Body> {
    match reply_res {
        Ok(resp) => resp.into_response(),
        Err(err) => err.into_response(),
    }
}
