//! Lifecycle event reporting
//!
//! Every token lifecycle step is reported to the owning registry's
//! [`EventSink`]. Sinks only observe; nothing they do feeds back into
//! token state.

use std::fmt;

use parking_lot::Mutex;

use crate::FamilyKey;

/// A single token lifecycle step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Fresh token issued
    Created {
        family: FamilyKey,
        serial: u64,
        label: String,
    },
    /// Construction refused; the serial was consumed anyway
    Rejected {
        family: FamilyKey,
        serial: u64,
        existing: String,
        requested: String,
    },
    /// Serial moved to a new holder
    Transferred {
        family: FamilyKey,
        serial: u64,
        source_was_live: bool,
        /// Serial the target held before being overwritten, if it was live
        displaced: Option<u64>,
    },
    /// Transfer onto the same instance, nothing changed
    SelfTransfer { family: FamilyKey, serial: u64 },
    Dropped {
        family: FamilyKey,
        serial: u64,
        was_live: bool,
    },
    ValidationFailed { family: FamilyKey, serial: u64 },
}

impl LifecycleEvent {
    pub fn family(&self) -> FamilyKey {
        match self {
            LifecycleEvent::Created { family, .. }
            | LifecycleEvent::Rejected { family, .. }
            | LifecycleEvent::Transferred { family, .. }
            | LifecycleEvent::SelfTransfer { family, .. }
            | LifecycleEvent::Dropped { family, .. }
            | LifecycleEvent::ValidationFailed { family, .. } => *family,
        }
    }

    pub fn serial(&self) -> u64 {
        match self {
            LifecycleEvent::Created { serial, .. }
            | LifecycleEvent::Rejected { serial, .. }
            | LifecycleEvent::Transferred { serial, .. }
            | LifecycleEvent::SelfTransfer { serial, .. }
            | LifecycleEvent::Dropped { serial, .. }
            | LifecycleEvent::ValidationFailed { serial, .. } => *serial,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Created {
                family,
                serial,
                label,
            } => write!(f, "{family}: created {label}{serial}"),
            LifecycleEvent::Rejected {
                family,
                serial,
                existing,
                requested,
            } => write!(
                f,
                "{family}: rejected serial {serial}, label {requested:?} conflicts with {existing:?}"
            ),
            LifecycleEvent::Transferred {
                family,
                serial,
                source_was_live,
                displaced,
            } => {
                write!(f, "{family}: transferred serial {serial}")?;
                if !source_was_live {
                    write!(f, " from a dead source")?;
                }
                if let Some(old) = displaced {
                    write!(f, ", abandoning serial {old}")?;
                }
                Ok(())
            }
            LifecycleEvent::SelfTransfer { family, serial } => {
                write!(f, "{family}: self-transfer of serial {serial} ignored")
            }
            LifecycleEvent::Dropped {
                family,
                serial,
                was_live,
            } => {
                let state = if *was_live { "live" } else { "dead" };
                write!(f, "{family}: dropped {state} serial {serial}")
            }
            LifecycleEvent::ValidationFailed { family, serial } => {
                write!(f, "{family}: serial {serial} used after transfer")
            }
        }
    }
}

/// Receiver for lifecycle events
pub trait EventSink: Send + Sync {
    fn record(&self, event: &LifecycleEvent);
}

/// Default sink: forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &LifecycleEvent) {
        let family = event.family();
        let serial = event.serial();
        match event {
            LifecycleEvent::Rejected { .. } | LifecycleEvent::ValidationFailed { .. } => {
                tracing::warn!(%family, serial, "{}", event);
            }
            LifecycleEvent::Transferred {
                source_was_live: false,
                ..
            } => {
                tracing::warn!(%family, serial, "{}", event);
            }
            _ => {
                tracing::debug!(%family, serial, "{}", event);
            }
        }
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &LifecycleEvent) {}
}

/// Keeps the text of every event, oldest first.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Drain the recorded lines
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &LifecycleEvent) {
        self.lines.lock().push(event.to_string());
    }
}
