//! Scanner adapter.
//!
//! Barcode decoding happens in the browser. The decoder fires its callback for
//! every frame it can read, so the same barcode arrives many times a second and
//! partial reads of other codes arrive in between. Each browser session gets a
//! [`ScanGate`] that admits exactly one valid ISBN and ignores everything after
//! it until the session is reset.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::IsbnError;
use crate::isbn::Isbn;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanBox {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecoderProfile {
    pub fps: u32,
    pub scan_box: ScanBox,
    /// Empty means every format the decoder supports.
    pub formats: Vec<String>,
}

/// Settings the page hands to its barcode decoder.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScannerSettings {
    pub facing_mode: String,
    pub preferred: DecoderProfile,
    /// Used when the camera refuses the preferred profile.
    pub fallback: DecoderProfile,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        let scan_box = ScanBox { width: 280, height: 80 };
        ScannerSettings {
            facing_mode: "environment".to_string(),
            preferred: DecoderProfile {
                fps: 5,
                scan_box: scan_box.clone(),
                formats: vec!["EAN_13".to_string()],
            },
            fallback: DecoderProfile {
                fps: 5,
                scan_box,
                formats: vec![],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Accepted(Isbn),
    Rejected(IsbnError),
    Ignored,
}

#[derive(Debug, Clone)]
enum GateState {
    Listening { previous: Option<(Isbn, Instant)> },
    Locked { isbn: Isbn },
}

#[derive(Debug, Clone)]
pub struct ScanGate {
    state: GateState,
    debounce: Duration,
}

impl ScanGate {
    pub fn new(debounce: Duration) -> Self {
        ScanGate {
            state: GateState::Listening { previous: None },
            debounce,
        }
    }

    pub fn offer(&mut self, raw: &str, now: Instant) -> ScanOutcome {
        let previous = match &self.state {
            GateState::Locked { .. } => return ScanOutcome::Ignored,
            GateState::Listening { previous } => previous.clone(),
        };

        let isbn = match Isbn::from_scan(raw) {
            Ok(isbn) => isbn,
            Err(e) => return ScanOutcome::Rejected(e),
        };

        // Decoder frames buffered before a reset can still deliver the last book.
        if let Some((last, reset_at)) = previous {
            if last == isbn && now.duration_since(reset_at) < self.debounce {
                return ScanOutcome::Ignored;
            }
        }

        self.state = GateState::Locked { isbn: isbn.clone() };
        ScanOutcome::Accepted(isbn)
    }

    pub fn reset(&mut self, now: Instant) {
        let previous = match &self.state {
            GateState::Locked { isbn } => Some((isbn.clone(), now)),
            GateState::Listening { previous } => previous.clone(),
        };
        self.state = GateState::Listening { previous };
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, GateState::Locked { .. })
    }
}

struct Session {
    gate: ScanGate,
    last_seen: Instant,
}

/// Scan gates keyed by the page's session id.
pub struct ScanSessions {
    sessions: Mutex<HashMap<String, Session>>,
    debounce: Duration,
}

impl ScanSessions {
    pub fn new(debounce: Duration) -> Self {
        ScanSessions {
            sessions: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    fn with_session<R>(&self, id: &str, now: Instant, f: impl FnOnce(&mut ScanGate) -> R) -> R {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session = sessions.entry(id.to_string()).or_insert_with(|| Session {
            gate: ScanGate::new(self.debounce),
            last_seen: now,
        });
        session.last_seen = now;
        f(&mut session.gate)
    }

    pub fn offer(&self, id: &str, raw: &str) -> ScanOutcome {
        let now = Instant::now();
        self.with_session(id, now, |gate| gate.offer(raw, now))
    }

    pub fn reset(&self, id: &str) {
        let now = Instant::now();
        self.with_session(id, now, |gate| gate.reset(now));
    }

    /// Drops sessions untouched for `max_idle`. Returns how many were removed.
    pub fn expire_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < max_idle);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
