//! Progress notifications for long-running phases.
//!
//! Progress is observational only: events are pushed into an unbounded
//! channel and a closed or absent receiver is silently tolerated. Within a
//! phase, `PhaseStarted` always precedes `PhaseFinished` and `completed`
//! never decreases.

use std::fmt;
use std::path::Path;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// The phase a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Entry file validation
    Validation,
    /// Per-entry graph extraction fan-out
    Extraction,
    /// Reachability gathering
    Gathering,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Validation => write!(f, "validation"),
            Phase::Extraction => write!(f, "extraction"),
            Phase::Gathering => write!(f, "gathering"),
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    PhaseStarted {
        phase: Phase,
        total: usize,
    },
    Advanced {
        phase: Phase,
        completed: usize,
        total: usize,
        current: Option<String>,
    },
    PhaseFinished {
        phase: Phase,
        completed: usize,
        total: usize,
    },
}

impl ProgressEvent {
    /// The phase this event belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            ProgressEvent::PhaseStarted { phase, .. }
            | ProgressEvent::Advanced { phase, .. }
            | ProgressEvent::PhaseFinished { phase, .. } => *phase,
        }
    }
}

/// Sends progress events to an optional listener.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    /// A reporter that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A reporter feeding the given channel.
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Creates a reporter together with the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            // A dropped receiver only means nobody is listening anymore.
            let _ = sender.send(event);
        }
    }

    pub fn start(&self, phase: Phase, total: usize) {
        self.emit(ProgressEvent::PhaseStarted { phase, total });
    }

    pub fn advance(&self, phase: Phase, completed: usize, total: usize, current: Option<&Path>) {
        self.emit(ProgressEvent::Advanced {
            phase,
            completed,
            total,
            current: current.map(|p| p.display().to_string()),
        });
    }

    pub fn finish(&self, phase: Phase, completed: usize, total: usize) {
        self.emit(ProgressEvent::PhaseFinished {
            phase,
            completed,
            total,
        });
    }
}
