//! HTTP client for the upload endpoint

use bytes::Bytes;
use optipress_domain::uploader::Submission;
use reqwest::{header, multipart, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server explained what went wrong
    #[error("{0}")]
    Server(String),

    /// The server failed without a readable explanation
    #[error("Server error: {0}")]
    Status(StatusCode),

    /// The request never completed
    #[error("Optimization failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Server(_) => false,
            ClientError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ClientError::Transport(_) => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for `POST /upload`
#[derive(Debug, Clone)]
pub struct OptimizeClient {
    http: reqwest::Client,
    upload_url: String,
}

impl OptimizeClient {
    pub fn new(server: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!("{}/upload", server.trim_end_matches('/')),
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Send the submission and return the optimized JPEG bytes
    ///
    /// A JSON response always carries an error message and is checked before
    /// the status code, so a 4xx with a body is reported with the server's
    /// own wording.
    #[instrument(skip(self, submission), fields(file = submission.file.name(), quality = submission.quality.value()))]
    pub async fn optimize(&self, submission: &Submission) -> Result<Bytes, ClientError> {
        let part = multipart::Part::bytes(submission.file.data().to_vec())
            .file_name(submission.file.name().to_string())
            .mime_str(submission.file.mime())?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("quality", submission.quality.value().to_string());

        let response = self.http.post(&self.upload_url).multipart(form).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            return match response.json::<ErrorBody>().await {
                Ok(body) => Err(ClientError::Server(body.error)),
                Err(_) => Err(ClientError::Status(status)),
            };
        }

        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        Ok(response.bytes().await?)
    }
}
