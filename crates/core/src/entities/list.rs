//! Client entity list
//!
//! `IClientEntityList` is the host's index and handle based entity lookup. Its
//! method order has been stable for as long as the interface version string
//! has, so it is called through a fixed-layout vtable struct.
//!
//! ```text
//! slot  method
//! 0     GetClientNetworkable(int)
//! 1     GetClientNetworkableFromHandle(CBaseHandle)
//! 2     GetClientUnknownFromHandle(CBaseHandle)
//! 3     GetClientEntity(int)
//! 4     GetClientEntityFromHandle(CBaseHandle)
//! 5     NumberOfEntities(bool)
//! 6     GetHighestEntityIndex()
//! 7     SetMaxEntities(int)
//! 8     GetMaxEntities()
//! ```

use std::ffi::c_void;
use std::ptr::NonNull;

use srcsdk_sdk::{versions, Address, IClientEntity, IClientEntityList};

use crate::context::Sdk;
use crate::error::ResolveError;
use crate::memory::vtable::vtable_as;
use crate::overlay::Overlay;

use super::handle::BaseHandle;
use super::player::Player;

type This = *mut IClientEntityList;

/// Virtual table layout of `IClientEntityList`
#[repr(C)]
pub struct ClientEntityListVTable {
    pub get_client_networkable: unsafe extern "C" fn(This, i32) -> *mut c_void,
    pub get_client_networkable_from_handle: unsafe extern "C" fn(This, BaseHandle) -> *mut c_void,
    pub get_client_unknown_from_handle: unsafe extern "C" fn(This, BaseHandle) -> *mut c_void,
    pub get_client_entity: unsafe extern "C" fn(This, i32) -> *mut IClientEntity,
    pub get_client_entity_from_handle: unsafe extern "C" fn(This, BaseHandle) -> *mut IClientEntity,
    pub number_of_entities: unsafe extern "C" fn(This, bool) -> i32,
    pub get_highest_entity_index: unsafe extern "C" fn(This) -> i32,
    pub set_max_entities: unsafe extern "C" fn(This, i32),
    pub get_max_entities: unsafe extern "C" fn(This) -> i32,
}

/// Typed access to the host's entity list
#[derive(Clone, Copy)]
pub struct EntityList<'a> {
    sdk: &'a Sdk,
    raw: NonNull<IClientEntityList>,
}

impl<'a> EntityList<'a> {
    /// Acquire the entity list from the client library's factory
    pub fn new(sdk: &'a Sdk) -> Result<Self, ResolveError> {
        let raw = sdk.interface::<IClientEntityList>("client", versions::CLIENT_ENTITY_LIST)?;
        Ok(Self { sdk, raw })
    }

    /// Wrap an entity list pointer obtained elsewhere
    ///
    /// # Safety
    /// `raw` must point at a live `IClientEntityList`.
    pub unsafe fn from_raw(sdk: &'a Sdk, raw: NonNull<IClientEntityList>) -> Self {
        Self { sdk, raw }
    }

    pub fn sdk(&self) -> &'a Sdk {
        self.sdk
    }

    pub fn as_ptr(&self) -> *mut IClientEntityList {
        self.raw.as_ptr()
    }

    fn vtable(&self) -> Option<&ClientEntityListVTable> {
        // The constructor established the pointer as a live entity list
        unsafe { vtable_as(Address::from_ptr(self.raw.as_ptr())) }
    }

    /// Entity in slot `index`, if occupied
    pub fn entity(&self, index: i32) -> Option<Address> {
        let vtable = self.vtable()?;
        let entity = unsafe { (vtable.get_client_entity)(self.as_ptr(), index) };
        Address::from_ptr(entity).non_null()
    }

    /// Entity a handle refers to, if its serial still matches
    pub fn entity_from_handle(&self, handle: BaseHandle) -> Option<Address> {
        if !handle.is_valid() {
            return None;
        }
        let vtable = self.vtable()?;
        let entity = unsafe { (vtable.get_client_entity_from_handle)(self.as_ptr(), handle) };
        Address::from_ptr(entity).non_null()
    }

    /// Entity in slot `index` wrapped in an overlay
    ///
    /// # Safety
    /// The entity in that slot must be of the class `T` describes.
    pub unsafe fn get<T: Overlay<'a>>(&self, index: i32) -> Option<T> {
        T::from_address(self.sdk, self.entity(index)?)
    }

    /// Highest occupied slot, or -1 when the list is empty
    pub fn highest_index(&self) -> i32 {
        self.vtable()
            .map(|vtable| unsafe { (vtable.get_highest_entity_index)(self.as_ptr()) })
            .unwrap_or(-1)
    }

    pub fn max_entities(&self) -> i32 {
        self.vtable()
            .map(|vtable| unsafe { (vtable.get_max_entities)(self.as_ptr()) })
            .unwrap_or(0)
    }

    /// Number of live entities
    pub fn count(&self, include_non_networkable: bool) -> i32 {
        self.vtable()
            .map(|vtable| unsafe { (vtable.number_of_entities)(self.as_ptr(), include_non_networkable) })
            .unwrap_or(0)
    }

    /// Occupied slots with their entity addresses
    pub fn iter(&self) -> impl Iterator<Item = (i32, Address)> + 'a {
        let list = *self;
        (0..=self.highest_index()).filter_map(move |index| Some((index, list.entity(index)?)))
    }

    /// Player entities in slots `1..=max_clients`
    pub fn players(&self, max_clients: i32) -> impl Iterator<Item = Player<'a>> + 'a {
        let list = *self;
        // Slots 1..=max_clients are reserved for players by the host
        (1..=max_clients).filter_map(move |index| unsafe { list.get::<Player<'a>>(index) })
    }
}

impl std::fmt::Debug for EntityList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityList")
            .field("raw", &self.raw)
            .finish()
    }
}
