//! Player resource overlay
//!
//! `C_PlayerResource` is a client singleton that mirrors per-slot scoreboard
//! data in networked arrays. Each array is a data-table prop whose child table
//! holds one element per slot (`"000"`, `"001"`, ...), so the array's base
//! offset is the prop's own offset and elements follow contiguously.
//!
//! The `PlayerResource` signature names the global that holds the singleton
//! pointer. The global is read on every [`PlayerResource::locate`] call since
//! the host recreates the singleton on level change.

use srcsdk_macros::Overlay;
use srcsdk_sdk::Address;

use crate::context::Sdk;
use crate::error::ResolveError;
use crate::field::FieldView;

/// Slots in each per-player array (index 0 is the world)
pub const MAX_PLAYER_SLOTS: usize = 65;

/// Registry binding of the singleton pointer's global
pub const PLAYER_RESOURCE_SIGNATURE: &str = "PlayerResource";

const TABLE: &str = "DT_PlayerResource";

/// Overlay for `C_PlayerResource`
#[derive(Debug, Overlay)]
#[overlay(table = "DT_PlayerResource")]
pub struct PlayerResource<'a> {
    ptr: Address,
    sdk: &'a Sdk,
}

impl<'a> PlayerResource<'a> {
    /// Find the current singleton
    pub fn locate(sdk: &'a Sdk) -> Result<Self, ResolveError> {
        let global = sdk.signature(PLAYER_RESOURCE_SIGNATURE)?;
        // The signature resolved into the client image, where the global lives
        let resource = unsafe { global.deref() };
        unsafe { Self::new(sdk, resource) }
            .ok_or_else(|| ResolveError::NullPointer(PLAYER_RESOURCE_SIGNATURE.to_string()))
    }

    /// View of one slot of a per-player array
    pub fn slot_view<T: Copy>(&self, array: &str, slot: usize) -> Result<FieldView<T>, ResolveError> {
        if slot >= MAX_PLAYER_SLOTS {
            return Err(ResolveError::IndexOutOfRange {
                field: array.to_string(),
                index: slot,
            });
        }
        Ok(self.sdk.field::<T>(self.ptr, TABLE, array)?.element(slot))
    }

    /// Read one slot of a per-player array
    pub fn slot<T: Copy>(&self, array: &str, slot: usize) -> Result<T, ResolveError> {
        let view = self.slot_view::<T>(array, slot)?;
        Ok(unsafe { view.read() })
    }

    pub fn ping(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iPing", slot)
    }

    pub fn kills(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iKills", slot)
    }

    pub fn assists(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iAssists", slot)
    }

    pub fn deaths(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iDeaths", slot)
    }

    pub fn connected(&self, slot: usize) -> Result<bool, ResolveError> {
        self.slot::<u8>("m_bConnected", slot).map(|value| value != 0)
    }

    pub fn team(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iTeam", slot)
    }

    pub fn alive(&self, slot: usize) -> Result<bool, ResolveError> {
        self.slot::<u8>("m_bAlive", slot).map(|value| value != 0)
    }

    pub fn health(&self, slot: usize) -> Result<i32, ResolveError> {
        self.slot("m_iHealth", slot)
    }
}
