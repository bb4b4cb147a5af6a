use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced while translating a request.
///
/// An unsupported action is not an error: it is a regular reply, see
/// [`crate::ec2::Reply`].
#[derive(Debug, Error)]
pub enum Error {
    /// The call to the VDC API did not complete (refused, reset, timed out).
    #[error("VDC request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The VDC API answered with a body that is not the expected JSON.
    #[error("VDC response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid VDC API base url '{0}'")]
    BaseUrl(String),

    /// A sequential batch stopped at its first failing call.
    #[error("{action} aborted after {completed} of {requested} calls (processed: [{}]): {source}", .processed.join(", "))]
    PartialBatch {
        action: &'static str,
        completed: usize,
        requested: usize,
        processed: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    #[error("malformed request parameters: {0}")]
    MalformedQuery(#[from] serde_urlencoded::de::Error),
}

impl Error {
    /// The EC2 error code reported to the client.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Transport { .. } => "Unavailable",
            Error::MalformedQuery(_) => "InvalidParameterValue",
            Error::Decode { .. } | Error::BaseUrl(_) | Error::PartialBatch { .. } => {
                "InternalError"
            }
        }
    }

    pub(crate) fn partial_batch(
        action: &'static str,
        processed: Vec<String>,
        requested: usize,
        source: Error,
    ) -> Self {
        Error::PartialBatch {
            action,
            completed: processed.len(),
            requested,
            processed,
            source: Box::new(source),
        }
    }
}
