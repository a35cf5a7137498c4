//! Transport bridge between the container encoder and the session send task.
//!
//! An unbounded single-writer/single-reader byte conduit. Writes never block and
//! never drop bytes. [`BridgeReader::read`] waits until at least one byte is
//! buffered or the writer has been closed; after close it drains whatever is
//! left and then reports end-of-stream.
//!
//! The bridge outlives recognition sessions: the reader is handed from one
//! send task to the next across rotations. Container bytes still buffered when
//! a session rotates belong to the retired encoder and are cleared, so every
//! session's stream starts with a fresh container header.

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::core::stt::STTError;

#[derive(Debug, Default)]
struct BridgeState {
    buf: BytesMut,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<BridgeState>,
    // notify_one stores a permit, so a write racing with a reader that has
    // just found the buffer empty is never missed.
    notify: Notify,
}

impl Shared {
    fn append(&self, data: &[u8]) -> Result<(), STTError> {
        if data.is_empty() {
            return Ok(());
        }
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(STTError::AudioProcessingError(
                    "write to closed bridge".to_string(),
                ));
            }
            state.buf.extend_from_slice(data);
        }
        self.notify.notify_one();
        Ok(())
    }
}

/// Create a connected writer/reader pair.
pub fn bridge() -> (BridgeWriter, BridgeReader) {
    let shared = Arc::new(Shared::default());
    (
        BridgeWriter {
            shared: shared.clone(),
        },
        BridgeReader { shared },
    )
}

/// The unique writing end. Closing it (explicitly or on drop) ends the stream.
#[derive(Debug)]
pub struct BridgeWriter {
    shared: Arc<Shared>,
}

impl BridgeWriter {
    pub fn write(&self, data: &[u8]) -> Result<(), STTError> {
        self.shared.append(data)
    }

    /// Mark the stream closed. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of bytes written but not yet read.
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().buf.len()
    }

    /// Discard every byte written but not yet read. Returns how many were
    /// dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.shared.state.lock();
        let dropped = state.buf.len();
        state.buf.clear();
        dropped
    }

    /// A `std::io::Write` handle for encoders. Dropping it does not close the
    /// bridge.
    pub fn sink(&self) -> BridgeSink {
        BridgeSink {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for BridgeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Byte sink handed to the container encoder of one session.
#[derive(Debug, Clone)]
pub struct BridgeSink {
    shared: Arc<Shared>,
}

impl io::Write for BridgeSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared
            .append(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The reading end, owned by the current session's send task.
#[derive(Debug)]
pub struct BridgeReader {
    shared: Arc<Shared>,
}

impl BridgeReader {
    /// Wait for buffered bytes. Returns `None` once the writer is closed and
    /// everything written before the close has been read.
    ///
    /// Cancel safe: dropping the future loses no data.
    pub async fn read(&mut self) -> Option<Bytes> {
        loop {
            {
                let mut state = self.shared.state.lock();
                if !state.buf.is_empty() {
                    return Some(state.buf.split().freeze());
                }
                if state.closed {
                    return None;
                }
            }
            self.shared.notify.notified().await;
        }
    }
}
