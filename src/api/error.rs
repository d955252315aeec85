use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the pfSense API client.
///
/// Transport-level errors (connection refused, TLS, timeouts) stay as
/// `reqwest::Error` wrapped in `anyhow`; these variants cover the cases the
/// client itself detects. None of them are retried.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The response envelope carried a status code outside the set the API
    /// is documented to return.
    #[error("got an invalid status code ({code}) in the API response")]
    InvalidEnvelopeCode { code: i64 },

    /// The remote returned a non-success HTTP status.
    #[error("request to {url} failed with {status}: {body}")]
    RequestFailed {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The remote service has no endpoint for this operation.
    #[error("{operation} is not supported by the pfSense API")]
    Unsupported { operation: String },
}
