#![deny(missing_docs)]

//! # Scoped Body Capture
//!
//! Lets the validator consume a single-read body while the owner of the message
//! keeps an identical copy. Every byte read through the capture is also copied
//! into a buffer; when the capture is dropped the unread remainder is drained and
//! the message's body slot is replaced with a replayable body over the full
//! payload. Dropping covers every exit path: success, violations, unparsable
//! input, early return and unwinding.

use crate::http::Body;
use std::io::{self, Read};

/// A duplicating tap over the body held in `slot`.
pub struct ScopedCapture<'a> {
    slot: &'a mut Option<Body>,
    source: Option<Body>,
    captured: Vec<u8>,
}

impl<'a> ScopedCapture<'a> {
    /// Takes the body out of `slot` until the capture is dropped.
    pub fn new(slot: &'a mut Option<Body>) -> Self {
        let source = slot.take();
        let capacity = source
            .as_ref()
            .and_then(Body::buffered)
            .map_or(0, <[u8]>::len);
        Self {
            slot,
            source,
            captured: Vec::with_capacity(capacity),
        }
    }

    /// True when the message carried a body.
    pub fn is_present(&self) -> bool {
        self.source.is_some()
    }

    /// Reads the rest of the body and returns everything captured so far.
    pub fn read_all(&mut self) -> io::Result<&[u8]> {
        let mut rest = Vec::new();
        self.read_to_end(&mut rest)?;
        Ok(&self.captured)
    }
}

impl Read for ScopedCapture<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Ok(0);
        };
        let n = source.read(buf)?;
        self.captured.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

impl Drop for ScopedCapture<'_> {
    fn drop(&mut self) {
        let Some(mut source) = self.source.take() else {
            return;
        };
        // A failing stream restores what could be read; the failure itself was
        // already reported to whoever was reading.
        if let Err(e) = source.read_to_end(&mut self.captured) {
            tracing::trace!(error = %e, "body drain stopped early");
        }
        *self.slot = Some(Body::from_bytes(std::mem::take(&mut self.captured)));
    }
}
