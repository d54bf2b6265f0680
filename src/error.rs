use std::error::Error as StdError;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Everything that can go wrong while tailing a job log.
///
/// None of these are retried by the session itself; the caller decides.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The job URL could not be turned into a log endpoint.
    #[error("invalid job url {url:?}: {reason}")]
    InvalidLocator { url: String, reason: String },

    /// The server answered, but not with a 2xx status.
    #[error("bad response for {method}: {status}")]
    Access {
        method: &'static str,
        status: String,
    },

    /// Transport-level failure: DNS, connect, TLS, or a broken body read.
    #[error("network error while {op}")]
    Network {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// The server promised more data without telling us where to resume.
    /// Terminal: the session reports `Finished` afterwards.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl LogError {
    pub(crate) fn network(op: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Network {
            op,
            source: source.into(),
        }
    }

    /// True for errors that a later read may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<LogError> for std::io::Error {
    fn from(err: LogError) -> Self {
        std::io::Error::other(err)
    }
}
