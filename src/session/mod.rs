//! A Jenkins console log exposed as one ordered byte stream.
//!
//! Jenkins serves a running build's log through `logText/progressiveText`:
//! each GET returns the text from `start` onwards, the offset to resume from in
//! `X-Text-Size`, and `X-More-Data: true` while the build is still writing.
//! [`LogSession`] walks that endpoint one chunk at a time.

mod locator;
mod transport;

pub use locator::{progressive_text_url, PROGRESSIVE_TEXT_PATH};
pub use transport::{
    Chunk, Credentials, HttpTransport, SessionOptions, Transport, MORE_DATA_HEADER,
    TEXT_SIZE_HEADER,
};

use crate::error::LogError;
use reqwest::Url;
use std::io::{self, Read};
use std::time::Duration;

const INITIAL_CURSOR: &str = "0";

/// Outcome of a single [`LogSession::read_chunk`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Bytes were written to the front of the buffer.
    Data(usize),
    /// A chunk was drained and the server promised more; read again.
    Pending { chunk_len: u64 },
    /// The build is done writing its log.
    Finished,
}

/// Where to fetch from and how. Never changes after construction.
struct Endpoint<T> {
    transport: T,
    credentials: Credentials,
    base: Url,
}

impl<T: Transport> Endpoint<T> {
    fn chunk_url(&self, cursor: &str) -> Url {
        let mut url = self.base.clone();
        let kept: Vec<(String, String)> = self
            .base
            .query_pairs()
            .filter(|(k, _)| k != "start")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("start", cursor);
        url
    }

    fn fetch_at(&self, cursor: &str) -> Result<ActiveChunk, LogError> {
        let url = self.chunk_url(cursor);
        tracing::debug!(start = cursor, "fetching log chunk");
        let chunk = self.transport.get(&url, &self.credentials)?;
        Ok(ActiveChunk { chunk, read: 0 })
    }
}

struct ActiveChunk {
    chunk: Chunk,
    read: u64,
}

/// Tails the console log of one Jenkins job.
///
/// Reading is blocking and pull-driven: a request goes out only when the
/// previous chunk has been fully consumed, and the cursor only moves when a
/// chunk ends.
pub struct LogSession<T = HttpTransport> {
    endpoint: Endpoint<T>,
    cursor: String,
    active: Option<ActiveChunk>,
    finished: bool,
    poll_interval: Duration,
}

impl LogSession<HttpTransport> {
    /// Builds a session over HTTP. Does no network I/O.
    pub fn new(
        credentials: Credentials,
        job_url: &str,
        options: &SessionOptions,
    ) -> Result<Self, LogError> {
        let base = progressive_text_url(job_url)?;
        let transport = HttpTransport::build(options)?;
        Ok(Self::from_parts(transport, credentials, base)
            .with_poll_interval(options.poll_interval))
    }
}

impl<T: Transport> LogSession<T> {
    /// Builds a session over any [`Transport`]. Does no network I/O.
    pub fn with_transport(
        transport: T,
        credentials: Credentials,
        job_url: &str,
    ) -> Result<Self, LogError> {
        let base = progressive_text_url(job_url)?;
        Ok(Self::from_parts(transport, credentials, base))
    }

    fn from_parts(transport: T, credentials: Credentials, base: Url) -> Self {
        Self {
            endpoint: Endpoint {
                transport,
                credentials,
                base,
            },
            cursor: INITIAL_CURSOR.to_string(),
            active: None,
            finished: false,
            poll_interval: Duration::ZERO,
        }
    }

    /// Pause applied by the [`Read`] impl after an empty chunk that still
    /// promised more data. Zero means refetch immediately.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.endpoint.base
    }

    /// Offset the next fetch will start from.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// HEAD request against the log endpoint, to catch a wrong URL or bad
    /// credentials before streaming starts.
    pub fn check(&self) -> Result<(), LogError> {
        let status = self
            .endpoint
            .transport
            .head(&self.endpoint.base, &self.endpoint.credentials)?;
        tracing::debug!(%status, url = %self.endpoint.base, "connectivity check");

        if !status.is_success() {
            return Err(LogError::Access {
                method: "HEAD",
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Requests the log from the current cursor and makes it the active chunk.
    ///
    /// Does nothing if a chunk is already active.
    pub fn fetch_chunk(&mut self) -> Result<(), LogError> {
        if self.active.is_none() {
            self.active = Some(self.endpoint.fetch_at(&self.cursor)?);
        }
        Ok(())
    }

    /// Reads the next bytes of the log into `buf`.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadStatus, LogError> {
        if self.finished {
            return Ok(ReadStatus::Finished);
        }
        if buf.is_empty() {
            return Ok(ReadStatus::Data(0));
        }

        let active = match &mut self.active {
            Some(active) => active,
            slot @ None => slot.insert(self.endpoint.fetch_at(&self.cursor)?),
        };

        let n = active
            .chunk
            .body
            .read(buf)
            .map_err(|e| LogError::network("reading log chunk", e))?;
        if n > 0 {
            active.read += n as u64;
            return Ok(ReadStatus::Data(n));
        }

        self.finish_chunk()
    }

    fn finish_chunk(&mut self) -> Result<ReadStatus, LogError> {
        let Some(ActiveChunk { chunk, read }) = self.active.take() else {
            return Ok(ReadStatus::Pending { chunk_len: 0 });
        };
        let more = chunk.has_more_data();
        let Chunk {
            text_size, body, ..
        } = chunk;
        drop(body);

        match (text_size, more) {
            (Some(size), _) => self.cursor = size,
            (None, true) => {
                // no offset to resume from; refetching would replay the log
                self.finished = true;
                return Err(LogError::Protocol(format!(
                    "server sent {MORE_DATA_HEADER}: true without {TEXT_SIZE_HEADER} (start={})",
                    self.cursor
                )));
            }
            (None, false) => {}
        }

        tracing::trace!(cursor = %self.cursor, bytes = read, more, "log chunk drained");
        if more {
            Ok(ReadStatus::Pending { chunk_len: read })
        } else {
            self.finished = true;
            Ok(ReadStatus::Finished)
        }
    }
}

impl<T: Transport> Read for LogSession<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.read_chunk(buf)? {
                ReadStatus::Data(n) => return Ok(n),
                ReadStatus::Finished => return Ok(0),
                ReadStatus::Pending { chunk_len: 0 } if !self.poll_interval.is_zero() => {
                    std::thread::sleep(self.poll_interval);
                }
                ReadStatus::Pending { .. } => {}
            }
        }
    }
}
