//! Failure kinds of the task REST client.

use thiserror::Error;

/// Errors returned by every [`TaskClient`](super::client::TaskClient) call.
///
/// Nothing here is retried automatically; callers decide what to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// Connectivity or transport failure (including timeouts)
  #[error("network error: {message}")]
  Network { message: String },

  /// Non-2xx response, body kept verbatim
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },

  /// Response body could not be decoded
  #[error("failed to decode response: {message}")]
  Decode { message: String },

  /// Page-style pagination needs cursors on page boundaries
  #[error("cursor {cursor} is not a multiple of page size {limit}")]
  MisalignedCursor { cursor: usize, limit: usize },
}

impl ApiError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::Http { status: 404, .. })
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode {
        message: e.to_string(),
      }
    } else {
      ApiError::Network {
        message: e.to_string(),
      }
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self {
    ApiError::Decode {
      message: e.to_string(),
    }
  }
}
