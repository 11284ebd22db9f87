//! Normalised error shape for the remote data client.

/// Errors from the REST layer.
///
/// Every failure a caller can see is one of three shapes: the request
/// never got a response, the server answered with a non-2xx status, or
/// the server answered 2xx with a body that does not match the endpoint
/// schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No response reached us (connect, DNS, TLS, timeout, reset).
    #[error("{message}")]
    Network { message: String },

    /// The server rejected the request.
    #[error("{message} (status {status})")]
    Server {
        status: u16,
        message: String,
        /// Remaining fields of the server's JSON error body, if it had one.
        fields: serde_json::Map<String, serde_json::Value>,
    },

    /// A 2xx response whose body did not decode into the expected type.
    #[error("Unexpected response from server: {message}")]
    Decode { message: String },
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message } | Self::Server { message, .. } | Self::Decode { message } => {
                message
            }
        }
    }

    /// HTTP status, only present for server rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an [`ApiError::Server`] from a status code and raw body text.
    ///
    /// A JSON object body contributes its fields; `message` or `detail`
    /// becomes the error message when present.
    pub fn from_server_body(status: u16, body: &str) -> Self {
        let default_message = format!("Request failed with status code {status}");
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(fields)) => {
                let message = ["message", "detail"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(|v| v.as_str()))
                    .map(str::to_string)
                    .unwrap_or(default_message);
                Self::Server {
                    status,
                    message,
                    fields,
                }
            }
            _ => {
                let trimmed = body.trim();
                Self::Server {
                    status,
                    message: if trimmed.is_empty() {
                        default_message
                    } else {
                        trimmed.to_string()
                    },
                    fields: serde_json::Map::new(),
                }
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}
