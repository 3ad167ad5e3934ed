//! Error trail and operator diagnostics

use parking_lot::Mutex;
use std::fmt;
use tracing::warn;

/// Append-only, ordered list of non-fatal error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTrail {
    messages: Vec<String>,
}

impl ErrorTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl fmt::Display) {
        let message = message.to_string();
        warn!("{}", message);
        self.messages.push(message);
    }

    pub fn all(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn append(&mut self, other: ErrorTrail) {
        self.messages.extend(other.messages);
    }
}

/// How long recorded errors stay visible through [`Diagnostics::errors`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailScope {
    /// Only the most recently completed call
    #[default]
    PerCall,
    /// Every call since the engine was built, never cleared
    Accumulate,
}

/// Engine-level view of recorded errors.
///
/// Each call fills its own [`ErrorTrail`] and commits it here once finished,
/// so concurrent calls never interleave messages.
#[derive(Debug, Default)]
pub struct Diagnostics {
    scope: TrailScope,
    trail: Mutex<ErrorTrail>,
}

impl Diagnostics {
    pub fn new(scope: TrailScope) -> Self {
        Self {
            scope,
            trail: Mutex::new(ErrorTrail::new()),
        }
    }

    pub fn commit(&self, call: ErrorTrail) {
        let mut trail = self.trail.lock();
        match self.scope {
            TrailScope::PerCall => *trail = call,
            TrailScope::Accumulate => trail.append(call),
        }
    }

    /// Snapshot of visible messages, oldest first
    pub fn errors(&self) -> Vec<String> {
        self.trail.lock().all().to_vec()
    }
}
