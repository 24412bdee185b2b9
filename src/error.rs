use std::time::Duration;

use thiserror::Error;

/// Failures the viewer reports through its event queue.
///
/// Cloneable so the same error can be logged and handed to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("no 2D drawing context available")]
    MissingContext,

    #[error("unsupported image url {url}")]
    UnsupportedUrl { url: String },

    #[error("failed to read {url}: {reason}")]
    Read { url: String, reason: String },

    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("decoding {url} did not finish within {after:?}")]
    DecodeTimeout { url: String, after: Duration },

    #[error("decoder for {url} exited without a result")]
    DecoderGone { url: String },
}

impl ViewerError {
    /// URL of the image the error belongs to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            ViewerError::MissingContext => None,
            ViewerError::UnsupportedUrl { url }
            | ViewerError::Read { url, .. }
            | ViewerError::Decode { url, .. }
            | ViewerError::DecodeTimeout { url, .. }
            | ViewerError::DecoderGone { url } => Some(url),
        }
    }
}
