//! Write-body extractor for product and kit writes.
//!
//! Accepts `multipart/form-data`, `application/x-www-form-urlencoded` or a
//! JSON object and flattens all of them into [`FormFields`]. File parts are
//! skipped: images are stored elsewhere and referenced by the `image` text
//! field.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use vitrine_core::FormFields;

use crate::middleware::RequestId;

use super::ApiError;

/// Extracted write body.
#[derive(Debug)]
pub(super) struct WriteForm(pub FormFields);

impl<S> FromRequest<S> for WriteForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let rid = req
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::new(&rid, "bad_request", e.body_text()))?;
            return read_multipart(&rid, multipart).await.map(WriteForm);
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::new(&rid, "bad_request", e.body_text()))?;
            let mut fields = FormFields::new();
            for (name, value) in pairs {
                fields.insert(name, value);
            }
            return Ok(WriteForm(fields));
        }

        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::new(&rid, "bad_request", e.body_text()))?;
        FormFields::from_json(value)
            .map(WriteForm)
            .map_err(|e| ApiError::new(&rid, "bad_request", e.to_string()))
    }
}

async fn read_multipart(rid: &str, mut multipart: Multipart) -> Result<FormFields, ApiError> {
    let mut fields = FormFields::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(rid, "bad_request", format!("invalid multipart request: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if let Some(file_name) = field.file_name() {
            tracing::warn!(field = %name, file_name, "ignoring file part; send an image reference instead");
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::new(rid, "bad_request", format!("multipart error: {e}")))?;
        fields.insert(name, value);
    }

    Ok(fields)
}
