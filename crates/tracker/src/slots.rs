//! Fixed-capacity contact slot table keyed by session id.
//!
//! Slots are scanned linearly; capacity is small and bounded by
//! [`MAX_SLOT_CAPACITY`], so a hash index would buy nothing.

use std::fmt;

use contracts::{ObjectPose, Point2, SessionId, EMPTY_SLOT_SENTINEL, MAX_SLOT_CAPACITY};

use crate::TrackerError;

/// One tracked contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub session_id: SessionId,
    /// Position from the latest `set` update
    pub current: Point2,
    /// Position from the `set` update before that
    pub previous: Point2,
    /// Object variant attributes
    pub pose: Option<ObjectPose>,
}

impl Contact {
    /// Fresh contact; previous == current so its first delta is zero
    fn new(session_id: SessionId, position: Point2, pose: Option<ObjectPose>) -> Self {
        Self {
            session_id,
            current: position,
            previous: position,
            pose,
        }
    }

    /// current − previous
    #[inline]
    pub fn delta(&self) -> Point2 {
        self.current - self.previous
    }
}

/// Outcome of [`SlotTable::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New session id bound to an empty slot
    Allocated { slot: usize },
    /// Existing contact moved
    Updated { slot: usize },
}

impl Upsert {
    pub fn slot(&self) -> usize {
        match self {
            Upsert::Allocated { slot } | Upsert::Updated { slot } => *slot,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Upsert::Allocated { .. })
    }
}

/// Contact slot table
///
/// Invariants:
/// - occupied slots never exceed capacity
/// - no two occupied slots hold the same session id
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Option<Contact>>,
}

impl SlotTable {
    /// Create a table with `capacity` empty slots, clamped to `1..=MAX_SLOT_CAPACITY`
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_SLOT_CAPACITY);
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Free every occupied slot whose id is absent from `alive`.
    ///
    /// Returns the released ids in slot order. Ids in `alive` that are not
    /// tracked are ignored; they are picked up by a later `upsert`.
    pub fn reconcile(&mut self, alive: &[SessionId]) -> Vec<SessionId> {
        let mut released = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(contact) = slot {
                if !alive.contains(&contact.session_id) {
                    released.push(contact.session_id);
                    *slot = None;
                }
            }
        }
        released
    }

    /// Update the contact with `session_id`, or bind it to the first empty slot.
    ///
    /// On update the old current position becomes the previous one and each
    /// pose attribute is replaced only when `pose` reports it.
    ///
    /// # Errors
    /// [`TrackerError::CapacityExceeded`] when the id is new and no slot is free;
    /// the table is left unchanged.
    pub fn upsert(
        &mut self,
        session_id: SessionId,
        position: Point2,
        pose: Option<ObjectPose>,
    ) -> Result<Upsert, TrackerError> {
        if let Some(slot) = self.slot_of(session_id) {
            if let Some(contact) = self.slots[slot].as_mut() {
                contact.previous = contact.current;
                contact.current = position;
                if let Some(update) = pose {
                    contact.pose.get_or_insert_with(ObjectPose::default).merge(update);
                }
            }
            return Ok(Upsert::Updated { slot });
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(TrackerError::CapacityExceeded {
                session_id,
                capacity: self.capacity(),
            })?;

        self.slots[slot] = Some(Contact::new(session_id, position, pose));
        Ok(Upsert::Allocated { slot })
    }

    /// Read-only view over occupied slots, in slot order
    pub fn live(&self) -> LiveSlots<'_> {
        LiveSlots {
            inner: self.slots.iter(),
        }
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Contact> {
        self.live().find(|contact| contact.session_id == session_id)
    }

    /// Slot index holding `session_id`
    pub fn slot_of(&self, session_id: SessionId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(c) if c.session_id == session_id))
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

impl fmt::Display for SlotTable {
    /// Session id per slot, `-1` for empty ones
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match slot {
                Some(contact) => write!(f, "{}", contact.session_id)?,
                None => write!(f, "{EMPTY_SLOT_SENTINEL}")?,
            }
        }
        f.write_str("]")
    }
}

/// Iterator over occupied slots
///
/// Cloning restarts from the same position, so one snapshot can be walked
/// several times. The borrow keeps the table immutable meanwhile.
#[derive(Debug, Clone)]
pub struct LiveSlots<'a> {
    inner: std::slice::Iter<'a, Option<Contact>>,
}

impl<'a> Iterator for LiveSlots<'a> {
    type Item = &'a Contact;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(Option::as_ref)
    }
}
