//! Token families and their shared state
//!
//! A family is the pair (owner type, start offset). Every family owns one
//! serial counter and one label, both created lazily the first time a token
//! of that family is issued and kept for the life of the registry.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::{EventSink, LifecycleEvent, RegistryConfig, TracingSink, UniqIdError, UniqIdResult};

/// Family identity - owner type plus start offset
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyKey {
    kind: TypeId,
    kind_name: &'static str,
    start: u64,
}

impl FamilyKey {
    #[inline]
    pub fn of<T: ?Sized + 'static, const START: u64>() -> Self {
        FamilyKey {
            kind: TypeId::of::<T>(),
            kind_name: type_name::<T>(),
            start: START,
        }
    }

    #[inline]
    pub fn kind_name(self) -> &'static str {
        self.kind_name
    }

    #[inline]
    pub fn start(self) -> u64 {
        self.start
    }
}

impl fmt::Debug for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Family({}@{})", self.kind_name, self.start)
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind_name, self.start)
    }
}

/// Point-in-time view of a family's shared state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyStats {
    /// Serials handed out so far, rejected constructions included
    pub issued: u64,
    /// `None` once the serial after `u64::MAX` would be needed
    pub next_serial: Option<u64>,
    /// Token instances currently live
    pub live_holders: u64,
    pub label: String,
}

#[derive(Debug)]
struct FamilyInner {
    /// `None` once `u64::MAX` has been issued
    next_serial: Option<u64>,
    issued: u64,
    live_holders: u64,
    /// Fixed by the first issue, never rewritten
    label: Option<String>,
}

/// Shared state of one family, referenced by every token in it
pub(crate) struct FamilyState {
    key: FamilyKey,
    config: RegistryConfig,
    sink: Arc<dyn EventSink>,
    inner: Mutex<FamilyInner>,
}

impl FamilyState {
    fn new(key: FamilyKey, config: RegistryConfig, sink: Arc<dyn EventSink>) -> Self {
        FamilyState {
            key,
            config,
            sink,
            inner: Mutex::new(FamilyInner {
                next_serial: Some(key.start),
                issued: 0,
                live_holders: 0,
                label: None,
            }),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> FamilyKey {
        self.key
    }

    #[inline]
    pub(crate) fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Issue the next serial under `label`.
    ///
    /// The serial is consumed before the label is checked, so a conflicting
    /// request still advances the counter.
    pub(crate) fn issue(&self, label: &str) -> UniqIdResult<u64> {
        let mut inner = self.inner.lock();
        let serial = self.claim(&mut inner)?;

        let existing = inner.label.get_or_insert_with(|| label.to_string());
        if !label.is_empty() && existing.as_str() != label {
            let existing = existing.clone();
            drop(inner);

            self.report(LifecycleEvent::Rejected {
                family: self.key,
                serial,
                existing: existing.clone(),
                requested: label.to_string(),
            });
            return Err(UniqIdError::LabelConflict {
                family: self.key,
                existing,
                requested: label.to_string(),
            });
        }

        let label = existing.clone();
        inner.live_holders += 1;
        drop(inner);

        self.report(LifecycleEvent::Created {
            family: self.key,
            serial,
            label,
        });
        Ok(serial)
    }

    /// Issue the next serial without proposing a label. Never conflicts,
    /// only fails once the family has run out of serials.
    pub(crate) fn issue_unlabeled(&self) -> UniqIdResult<u64> {
        let mut inner = self.inner.lock();
        let serial = self.claim(&mut inner)?;
        inner.live_holders += 1;
        let label = inner.label.get_or_insert_with(String::new).clone();
        drop(inner);

        self.report(LifecycleEvent::Created {
            family: self.key,
            serial,
            label,
        });
        Ok(serial)
    }

    /// Take the next serial off the counter. The last serial, `u64::MAX`,
    /// is issued once and then the family is exhausted for good.
    fn claim(&self, inner: &mut FamilyInner) -> UniqIdResult<u64> {
        let serial = match inner.next_serial {
            Some(serial) => serial,
            None => {
                return Err(UniqIdError::SerialsExhausted { family: self.key });
            }
        };
        inner.next_serial = serial.checked_add(1);
        inner.issued = inner.issued.saturating_add(1);
        Ok(serial)
    }

    pub(crate) fn label(&self) -> String {
        self.inner.lock().label.clone().unwrap_or_default()
    }

    /// A dead token handed its serial on; the receiver counts as a new
    /// live holder.
    pub(crate) fn revive(&self) {
        let mut inner = self.inner.lock();
        inner.live_holders = inner.live_holders.saturating_add(1);
    }

    /// A live holder went away, either dropped or overwritten.
    pub(crate) fn release(&self) {
        let mut inner = self.inner.lock();
        inner.live_holders = inner.live_holders.saturating_sub(1);
    }

    pub(crate) fn stats(&self) -> FamilyStats {
        let inner = self.inner.lock();
        FamilyStats {
            issued: inner.issued,
            next_serial: inner.next_serial,
            live_holders: inner.live_holders,
            label: inner.label.clone().unwrap_or_default(),
        }
    }

    pub(crate) fn report(&self, event: LifecycleEvent) {
        if self.config.report_lifecycle {
            self.sink.record(&event);
        }
    }
}

impl fmt::Debug for FamilyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyState")
            .field("key", &self.key)
            .field("config", &self.config)
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

/// Registry of every family seen so far.
///
/// Tokens created through [`crate::UniqueId::new`] use the process-wide
/// [`FamilyRegistry::global`]; a separate registry can be injected with
/// [`crate::UniqueId::new_in`] to get fully independent counters and labels.
pub struct FamilyRegistry {
    config: RegistryConfig,
    sink: Arc<dyn EventSink>,
    families: Mutex<HashMap<FamilyKey, Arc<FamilyState>>>,
}

impl FamilyRegistry {
    /// Create a registry reporting to [`TracingSink`]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: RegistryConfig, sink: Arc<dyn EventSink>) -> Self {
        FamilyRegistry {
            config,
            sink,
            families: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry. Lives until the process exits.
    pub fn global() -> &'static FamilyRegistry {
        static GLOBAL: OnceLock<FamilyRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FamilyRegistry::new)
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Shared state for `key`, created on first use
    pub(crate) fn family(&self, key: FamilyKey) -> Arc<FamilyState> {
        let mut families = self.families.lock();
        Arc::clone(families.entry(key).or_insert_with(|| {
            Arc::new(FamilyState::new(key, self.config, Arc::clone(&self.sink)))
        }))
    }

    /// Stats for a family, `None` if no token of it was ever issued here
    pub fn family_stats(&self, key: &FamilyKey) -> Option<FamilyStats> {
        self.families.lock().get(key).map(|family| family.stats())
    }

    pub fn stats<T: ?Sized + 'static, const START: u64>(&self) -> Option<FamilyStats> {
        self.family_stats(&FamilyKey::of::<T, START>())
    }

    pub fn family_count(&self) -> usize {
        self.families.lock().len()
    }
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyRegistry")
            .field("config", &self.config)
            .field("families", &self.family_count())
            .finish()
    }
}
