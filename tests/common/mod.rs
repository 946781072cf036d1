#![allow(dead_code)]

//! Shared test doubles
//!
//! An in-memory `ConnectionSource` serving scripted responses, plus small
//! recording helpers, so executor and connector behavior can be tested
//! without a server.

use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use hostlink::{
    CancelToken, Connection, ConnectionSource, HostlinkError, InvalidateList, InvalidationSink,
};

/// What the fake server does on one acquire/exchange
pub enum Script {
    /// Hand out a connection that serves these response bytes
    Respond(Vec<u8>),

    /// Fail the acquire itself with a transport error carrying this message
    FailAcquire(String),
}

/// In-memory connection source driven by a script, one entry per acquire
///
/// Once the script runs dry, every further exchange serves an empty response
/// (which the codec surfaces as a transport EOF).
pub struct ScriptedSource {
    script: Mutex<VecDeque<Script>>,
    fallback: Mutex<Option<Vec<u8>>>,
    acquires: AtomicUsize,
    releases: AtomicUsize,
    closed_releases: AtomicUsize,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(None),
            acquires: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            closed_releases: AtomicUsize::new(0),
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Source that serves the same response bytes on every exchange
    pub fn respond_always(response: Vec<u8>) -> Arc<Self> {
        let source = Self::new(Vec::new());
        *source.fallback.lock() = Some(response);
        source
    }

    pub fn acquire_count(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn closed_release_count(&self) -> usize {
        self.closed_releases.load(Ordering::SeqCst)
    }

    /// Raw request frames captured so far, one per completed write
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().clone()
    }
}

impl ConnectionSource for ScriptedSource {
    fn acquire(&self, cancel: &CancelToken) -> hostlink::Result<Box<dyn Connection>> {
        cancel.check()?;
        self.acquires.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().pop_front();
        let response = match step {
            Some(Script::Respond(bytes)) => bytes,
            Some(Script::FailAcquire(message)) => {
                return Err(HostlinkError::Transport(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    message,
                )));
            }
            None => self.fallback.lock().clone().unwrap_or_default(),
        };

        Ok(Box::new(ScriptedConnection {
            response: Cursor::new(response),
            written: Vec::new(),
            requests: self.requests.clone(),
            closed: false,
        }))
    }

    fn release(&self, conn: Box<dyn Connection>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if conn.is_closed() {
            self.closed_releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct ScriptedConnection {
    response: Cursor<Vec<u8>>,
    written: Vec<u8>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: bool,
}

impl Connection for ScriptedConnection {
    fn reader(&mut self) -> &mut dyn Read {
        // A completed request frame precedes every read
        if !self.written.is_empty() {
            self.requests.lock().push(std::mem::take(&mut self.written));
        }
        &mut self.response
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.written
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Invalidation sink recording every list it is handed
#[derive(Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<InvalidateList>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn applied(&self) -> Vec<InvalidateList> {
        self.applied.lock().clone()
    }
}

impl InvalidationSink for RecordingSink {
    fn apply(&self, list: &InvalidateList) -> hostlink::Result<()> {
        self.applied.lock().push(list.clone());
        Ok(())
    }
}

/// Sink that drops every list (for tests that only exercise the wire path)
pub struct NullSink;

impl InvalidationSink for NullSink {
    fn apply(&self, _list: &InvalidateList) -> hostlink::Result<()> {
        Ok(())
    }
}
