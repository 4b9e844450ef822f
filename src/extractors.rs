//! Custom extractors for the callback endpoints.
//!
//! The gateway posts callbacks form-encoded, but JSON bodies show up in
//! integrations and tests, so `ClickForm` accepts both. Its rejection is a
//! protocol-level response: the gateway only inspects the body, so even an
//! undecodable request is answered with HTTP 200 and error `-8` instead of
//! a transport-level 4xx it would ignore.

use axum::{
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::protocol::{CallbackResponse, ProtocolError};

pub struct ClickForm<T>(pub T);

impl<S, T> FromRequest<S> for ClickForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CallbackRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        if is_json {
            match axum::Json::<T>::from_request(req, state).await {
                Ok(Json(value)) => Ok(ClickForm(value)),
                Err(e) => Err(CallbackRejection(e.to_string())),
            }
        } else {
            match axum::Form::<T>::from_request(req, state).await {
                Ok(axum::Form(value)) => Ok(ClickForm(value)),
                Err(e) => Err(CallbackRejection(e.to_string())),
            }
        }
    }
}

pub struct CallbackRejection(String);

impl IntoResponse for CallbackRejection {
    fn into_response(self) -> Response {
        tracing::debug!("Undecodable callback body: {}", self.0);
        (
            StatusCode::OK,
            Json(CallbackResponse::err(ProtocolError::BadRequest, None, None)),
        )
            .into_response()
    }
}
