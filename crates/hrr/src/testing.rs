//! Log capture for tests.
//!
//! [`CapturedLogs`] is a JSON subscriber writing into memory. Hand its
//! [`dispatch`](CapturedLogs::dispatch) to a [`LoggerTemplate`](crate::LoggerTemplate)
//! and inspect the emitted events afterwards.
//!
//! ```rust
//! use hrr::testing::CapturedLogs;
//! use hrr::LoggerTemplate;
//!
//! let logs = CapturedLogs::new();
//! let template = LoggerTemplate::new(logs.dispatch());
//!
//! template.shared().in_scope(|| tracing::warn!(url = "/", "slow"));
//!
//! let last = logs.last_event().unwrap();
//! assert_eq!(last["level"], "WARN");
//! assert_eq!(last["fields"]["url"], "/");
//! ```

use serde_json::Value;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink of JSON log lines.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Creates an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a dispatcher that writes every event at any level into this buffer.
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(self.clone())
            .finish();
        Dispatch::new(subscriber)
    }

    /// Returns the raw captured output.
    #[must_use]
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Returns every captured event, oldest first.
    ///
    /// Lines that are not valid JSON are skipped.
    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Returns the most recent event.
    #[must_use]
    pub fn last_event(&self) -> Option<Value> {
        self.events().pop()
    }
}

/// Writer handed out by [`CapturedLogs`] for each event.
#[derive(Debug)]
pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}
