//! Entity handle types
//!
//! The host references networked entities through `CBaseHandle`, a 32-bit
//! value combining an entity-list slot with a serial number. The serial is
//! bumped whenever a slot is reused, so a stale handle stops resolving.
//!
//! Layout, low bits first: 13 bits of entity-list slot, then 19 bits of
//! serial. `0xFFFFFFFF` means "no entity", which is also what the host stores
//! in an unset handle field.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::overlay::Overlay;

use super::list::EntityList;

/// Number of entry index bits
pub const NUM_ENT_ENTRY_BITS: u32 = 13;

/// Number of entity list entries
pub const NUM_ENT_ENTRIES: u32 = 1 << NUM_ENT_ENTRY_BITS;

/// Mask extracting the entry index
pub const ENT_ENTRY_MASK: u32 = NUM_ENT_ENTRIES - 1;

/// Invalid handle sentinel value
pub const INVALID_EHANDLE_INDEX: u32 = 0xFFFFFFFF;

/// A typed handle to an entity
///
/// The `T` parameter names the overlay the handle resolves to:
///
/// ```ignore
/// let owner: EntityHandle<Player> = weapon.owner()?;
/// if let Some(player) = owner.get(&entities) {
///     println!("{}", player.health()?);
/// }
/// ```
#[repr(transparent)]
pub struct EntityHandle<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityHandle<T> {
    #[inline]
    pub const fn from_raw(value: u32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn invalid() -> Self {
        Self::from_raw(INVALID_EHANDLE_INDEX)
    }

    /// Get the raw handle value
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.value
    }

    /// Get the entry index (lower 13 bits)
    #[inline]
    pub const fn index(&self) -> u32 {
        self.value & ENT_ENTRY_MASK
    }

    /// Get the serial number (upper 19 bits)
    #[inline]
    pub const fn serial(&self) -> u32 {
        self.value >> NUM_ENT_ENTRY_BITS
    }

    /// Check if this handle is not the invalid sentinel
    ///
    /// A valid handle can still fail to resolve if its slot was reused.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.value != INVALID_EHANDLE_INDEX
    }

    /// Cast this handle to a different overlay type
    #[inline]
    pub const fn cast<U>(self) -> EntityHandle<U> {
        EntityHandle::from_raw(self.value)
    }

    /// Untyped form, as passed to the host
    #[inline]
    pub const fn erase(self) -> BaseHandle {
        self.cast()
    }
}

impl<T> EntityHandle<T> {
    /// Resolve the handle through the entity list
    ///
    /// Returns `None` if the handle is invalid, the slot is empty, or the
    /// serial no longer matches.
    pub fn get<'a>(&self, entities: &EntityList<'a>) -> Option<T>
    where
        T: Overlay<'a>,
    {
        if !self.is_valid() {
            return None;
        }
        let address = entities.entity_from_handle(self.erase())?;
        // The entity list only hands out live entities for a matching serial
        unsafe { T::from_address(entities.sdk(), address) }
    }
}

impl<T> Clone for EntityHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityHandle<T> {}

impl<T> Default for EntityHandle<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T> PartialEq for EntityHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for EntityHandle<T> {}

impl<T> Hash for EntityHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for EntityHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "EntityHandle(index={}, serial={})",
                self.index(),
                self.serial()
            )
        } else {
            write!(f, "EntityHandle(invalid)")
        }
    }
}

impl<T> fmt::Display for EntityHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.index(), self.serial())
        } else {
            write!(f, "invalid")
        }
    }
}

/// Untyped entity handle (`CBaseHandle` in the host)
pub type BaseHandle = EntityHandle<()>;
