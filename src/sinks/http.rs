//! HTTP sink: multipart/form-data backup upload

use crate::config::HttpUploadParams;
use crate::error::{DispatchError, Result};
use crate::result::ResultRecord;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::{debug, warn};

/// Success record of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpUploadRecord {
    pub response_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl ResultRecord for HttpUploadRecord {
    fn sentinel() -> Self {
        Self {
            response_status: 0,
            msg: None,
        }
    }

    fn on_failure(error: &DispatchError) -> Self {
        match error {
            DispatchError::Rejected { status, .. } => Self {
                response_status: *status,
                msg: None,
            },
            _ => Self::sentinel(),
        }
    }
}

/// Uploads a payload as one file field of a multipart form
pub struct HttpSink {
    client: reqwest::blocking::Client,
}

impl HttpSink {
    /// Create a sink with a fresh client
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }

    /// POST the payload. Status >= 300 is reported as [`DispatchError::Rejected`].
    pub fn upload(&self, params: &HttpUploadParams) -> Result<HttpUploadRecord> {
        let url = reqwest::Url::parse(&params.url)
            .map_err(|e| DispatchError::invalid("url", format!("{}: {}", params.url, e)))?;
        let headers = build_headers(params)?;
        let form = build_form(params)?;

        debug!(
            "POST {} ({} bytes as field '{}', file '{}')",
            url,
            params.content.len(),
            params.field,
            params.filename
        );

        let response = self
            .client
            .post(url)
            .query(&params.params)
            .headers(headers)
            .multipart(form)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;

        if status < 300 {
            debug!("Upload accepted with status {}", status);
            Ok(HttpUploadRecord {
                response_status: status,
                msg: Some(body),
            })
        } else {
            warn!("Upload rejected with status {}", status);
            let message = if body.trim().is_empty() {
                format!("upload rejected with status {}", status)
            } else {
                body
            };
            Err(DispatchError::Rejected { status, message })
        }
    }
}

fn build_headers(params: &HttpUploadParams) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &params.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DispatchError::invalid("headers", format!("{}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| DispatchError::invalid("headers", format!("{}: {}", name, e)))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Extra fields first, then the file part
fn build_form(params: &HttpUploadParams) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in &params.extra_data {
        form = form.text(key.clone(), value.clone());
    }

    let part = Part::text(params.content.clone())
        .file_name(params.filename.clone())
        .mime_str("text/plain; charset=utf-8")?;

    Ok(form.part(params.field.clone(), part))
}
