//! Unique identity tokens
//!
//! A [`UniqueId`] holds one serial number of its family. Serials are handed
//! out in increasing order starting at the family's `START` offset and are
//! never reused.
//!
//! Tokens cannot be cloned. Duplicating one with [`UniqueId::duplicate`] or
//! [`UniqueId::transfer_from`] moves the serial: the destination becomes the
//! live holder and the source is left dead, so any later checked access on
//! it fails with [`UniqIdError::InvalidToken`].
//!
//! ```rust
//! use uniqid_core::UniqueId;
//!
//! struct Widget;
//!
//! let mut a = UniqueId::<Widget, 5>::new().unwrap();
//! let b = UniqueId::duplicate(&mut a);
//!
//! assert_eq!(b.serial().unwrap(), 5);
//! assert!(b.is_live());
//! assert!(!a.is_live());
//! assert!(a.serial().is_err());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::family::FamilyState;
use crate::{FamilyKey, FamilyRegistry, LifecycleEvent, UniqIdError, UniqIdResult};

/// Whether an instance is the current holder of its serial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Liveness {
    Live,
    /// Serial was handed to another instance
    Dead,
}

impl Liveness {
    #[inline]
    pub fn is_live(self) -> bool {
        self == Liveness::Live
    }
}

/// Result of a transfer between two tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    Transferred,
    /// Source and target were the same instance; nothing changed
    SelfTransfer,
}

/// A serial read without the liveness check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Serial {
    pub value: u64,
    /// The reading instance no longer holds `value`
    pub stale: bool,
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stale {
            write!(f, "{} (stale)", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Family-scoped unique identity.
///
/// The family is `(T, START)`: tokens with the same owner type and start
/// offset share a serial counter and a label. `T` is only a tag and is
/// never stored.
pub struct UniqueId<T: ?Sized + 'static, const START: u64 = 0> {
    serial: u64,
    liveness: Liveness,
    family: Arc<FamilyState>,
    _owner: PhantomData<fn(&T)>,
}

impl<T: ?Sized + 'static, const START: u64> UniqueId<T, START> {
    /// Issue the next serial from the global registry, keeping the family
    /// label as is.
    ///
    /// Fails with [`UniqIdError::SerialsExhausted`] once `u64::MAX` has been
    /// issued in this family.
    pub fn new() -> UniqIdResult<Self> {
        Self::new_in(FamilyRegistry::global())
    }

    /// Issue the next serial from the global registry under `label`.
    ///
    /// The first token of a family fixes its label. A later non-empty label
    /// that differs fails with [`UniqIdError::LabelConflict`]; the serial is
    /// consumed either way.
    pub fn with_label(label: impl AsRef<str>) -> UniqIdResult<Self> {
        Self::create_in(FamilyRegistry::global(), label)
    }

    pub fn new_in(registry: &FamilyRegistry) -> UniqIdResult<Self> {
        let family = registry.family(FamilyKey::of::<T, START>());
        let serial = family.issue_unlabeled()?;
        Ok(Self::live(serial, family))
    }

    pub fn create_in(registry: &FamilyRegistry, label: impl AsRef<str>) -> UniqIdResult<Self> {
        let family = registry.family(FamilyKey::of::<T, START>());
        let serial = family.issue(label.as_ref())?;
        Ok(Self::live(serial, family))
    }

    fn live(serial: u64, family: Arc<FamilyState>) -> Self {
        UniqueId {
            serial,
            liveness: Liveness::Live,
            family,
            _owner: PhantomData,
        }
    }

    /// Move `source`'s serial into a new token. `source` is left dead.
    ///
    /// Does not check `source`: duplicating a dead token still yields a live
    /// token carrying the stale serial, which then has no other live holder.
    pub fn duplicate(source: &mut Self) -> Self {
        let source_was_live = source.hand_over();
        let token = Self::live(source.serial, Arc::clone(&source.family));
        token.family.report(LifecycleEvent::Transferred {
            family: token.family.key(),
            serial: token.serial,
            source_was_live,
            displaced: None,
        });
        token
    }

    /// Same as [`UniqueId::duplicate`] with `self` as the source.
    pub fn take(&mut self) -> Self {
        Self::duplicate(self)
    }

    /// Overwrite `self` with `source`'s serial, leaving `source` dead.
    ///
    /// If `self` was live its old serial is abandoned; it is never issued
    /// again.
    pub fn transfer_from(&mut self, source: &mut Self) -> TransferOutcome {
        let displaced = match self.liveness {
            Liveness::Live => {
                self.family.release();
                Some(self.serial)
            }
            Liveness::Dead => None,
        };

        let source_was_live = source.hand_over();
        self.serial = source.serial;
        self.family = Arc::clone(&source.family);
        self.liveness = Liveness::Live;

        self.family.report(LifecycleEvent::Transferred {
            family: self.family.key(),
            serial: self.serial,
            source_was_live,
            displaced,
        });
        TransferOutcome::Transferred
    }

    /// Transfer between two positions of `slots`.
    ///
    /// `target == source` is a self-transfer: reported, but neither the
    /// serial nor the liveness of the slot changes.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn transfer_within(slots: &mut [Self], target: usize, source: usize) -> TransferOutcome {
        if target == source {
            let token = &slots[target];
            token.family.report(LifecycleEvent::SelfTransfer {
                family: token.family.key(),
                serial: token.serial,
            });
            return TransferOutcome::SelfTransfer;
        }

        let (target, source) = if target < source {
            let (head, tail) = slots.split_at_mut(source);
            (&mut head[target], &mut tail[0])
        } else {
            let (head, tail) = slots.split_at_mut(target);
            (&mut tail[0], &mut head[source])
        };
        target.transfer_from(source)
    }

    /// Mark `self` dead, returning whether it was live. A dead source still
    /// gives its serial away, so the receiver is counted as a new holder.
    fn hand_over(&mut self) -> bool {
        let was_live = self.liveness.is_live();
        self.liveness = Liveness::Dead;
        if !was_live {
            self.family.revive();
        }
        was_live
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    #[inline]
    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn validate(&self) -> UniqIdResult<()> {
        if self.is_live() {
            return Ok(());
        }
        self.family.report(LifecycleEvent::ValidationFailed {
            family: self.family.key(),
            serial: self.serial,
        });
        Err(UniqIdError::InvalidToken {
            family: self.family.key(),
            serial: self.serial,
        })
    }

    /// The held serial; fails if this instance is dead
    pub fn serial(&self) -> UniqIdResult<u64> {
        self.validate()?;
        Ok(self.serial)
    }

    /// Shorthand for [`UniqueId::serial`]
    #[inline]
    pub fn id(&self) -> UniqIdResult<u64> {
        self.serial()
    }

    /// The stored serial whether or not this instance still holds it
    pub fn serial_unchecked(&self) -> Serial {
        Serial {
            value: self.serial,
            stale: !self.is_live(),
        }
    }

    pub fn serial_checked(&self, check: bool) -> UniqIdResult<Serial> {
        if check {
            self.validate()?;
        }
        Ok(self.serial_unchecked())
    }

    /// Family label followed by the serial; fails if this instance is dead
    pub fn display_name(&self) -> UniqIdResult<String> {
        self.validate()?;
        Ok(self.display_name_unchecked())
    }

    /// Like [`UniqueId::display_name`], with the configured stale marker
    /// before the serial when this instance is dead.
    pub fn display_name_unchecked(&self) -> String {
        let mut name = self.family.label();
        if !self.is_live() {
            name.push(self.family.config().stale_marker);
        }
        name.push_str(&self.serial.to_string());
        name
    }

    pub fn display_name_checked(&self, check: bool) -> UniqIdResult<String> {
        if check {
            self.validate()?;
        }
        Ok(self.display_name_unchecked())
    }

    /// The family label fixed by the first token
    pub fn label(&self) -> String {
        self.family.label()
    }

    #[inline]
    pub fn family(&self) -> FamilyKey {
        self.family.key()
    }
}

impl<T: ?Sized + 'static, const START: u64> Drop for UniqueId<T, START> {
    fn drop(&mut self) {
        let was_live = self.is_live();
        if was_live {
            self.family.release();
        }
        self.family.report(LifecycleEvent::Dropped {
            family: self.family.key(),
            serial: self.serial,
            was_live,
        });
    }
}

impl<T: ?Sized + 'static, const START: u64> fmt::Display for UniqueId<T, START> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name_unchecked())
    }
}

impl<T: ?Sized + 'static, const START: u64> fmt::Debug for UniqueId<T, START> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_live() { "live" } else { "dead" };
        write!(f, "UniqueId({}#{}, {})", self.family.key(), self.serial, state)
    }
}
