//! Mock serial device for testing.
//!
//! Responds to written request frames through a test-supplied responder
//! closure, and instruments the exchange discipline: a request written
//! while a previous response is still unread means two logical exchanges
//! interleaved on the half-duplex line, which the link's lock must make
//! impossible.

use crate::device::SerialDevice;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

struct Inner {
    read_buffer: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    responder: Option<Responder>,
    interleaved_writes: usize,
    discarded: usize,
}

/// Mock device with scripted responses.
#[derive(Clone)]
pub struct MockDevice {
    inner: Arc<Mutex<Inner>>,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            inner: Arc::new(Mutex::new(Inner {
                read_buffer: VecDeque::new(),
                writes: Vec::new(),
                responder: None,
                interleaved_writes: 0,
                discarded: 0,
            })),
        }
    }

    /// Install a responder: called once per written request frame, its
    /// return bytes become readable. Return an empty vec to simulate a
    /// robot that never answers.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.inner.lock().unwrap().responder = Some(Box::new(responder));
    }

    /// Queue raw bytes to be read, ahead of any responder output.
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().unwrap().read_buffer.extend(data);
    }

    /// All frames written so far, one entry per write call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Number of requests written while a previous exchange's response was
    /// still unread. Non-zero means the mutual-exclusion discipline broke.
    pub fn interleaved_writes(&self) -> usize {
        self.inner.lock().unwrap().interleaved_writes
    }

    /// Total bytes dropped by receive-buffer flushes.
    pub fn discarded(&self) -> usize {
        self.inner.lock().unwrap().discarded
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialDevice for MockDevice {
    fn read_exact_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let available = inner.read_buffer.len();
        if available >= buf.len() {
            for slot in buf.iter_mut() {
                *slot = inner.read_buffer.pop_front().expect("length checked");
            }
            return Ok(());
        }
        // Model the hardware's timeout paths: a silent window versus a
        // partial arrival. Partial bytes are consumed, as a real UART read
        // would have drained them.
        let got = available;
        inner.read_buffer.clear();
        if got == 0 {
            Err(Error::Timeout)
        } else {
            Err(Error::ShortRead {
                wanted: buf.len(),
                got,
            })
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.read_buffer.is_empty() {
            inner.interleaved_writes += 1;
        }
        inner.writes.push(data.to_vec());
        let mut responder = inner.responder.take();
        if let Some(f) = responder.as_mut() {
            let response = f(data);
            inner.read_buffer.extend(response);
        }
        inner.responder = responder;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let dropped = inner.read_buffer.len();
        inner.read_buffer.clear();
        inner.discarded += dropped;
        Ok(dropped)
    }
}
