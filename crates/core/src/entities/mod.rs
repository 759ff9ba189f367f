//! Entity overlays
//!
//! Typed views over the host's client entities:
//!
//! ```ignore
//! use srcsdk_core::entities::{EntityList, PlayerResource};
//!
//! let entities = EntityList::new(&sdk)?;
//! for player in entities.players(64) {
//!     if player.is_alive()? {
//!         println!("{} HP at {:?}", player.health()?, player.origin()?);
//!     }
//! }
//!
//! let resource = PlayerResource::locate(&sdk)?;
//! println!("slot 1 ping: {}", resource.ping(1)?);
//! ```
//!
//! # Entity Handles
//!
//! Handles stay safe to hold across frames; a handle whose slot has been
//! reused simply stops resolving:
//!
//! ```ignore
//! let handle: EntityHandle<Player> = EntityHandle::from_raw(raw);
//! if let Some(mut player) = handle.get(&entities) {
//!     player.set_health(100)?;
//! }
//! ```

pub mod handle;
pub mod list;
pub mod player;
pub mod resource;

pub use handle::{
    BaseHandle, EntityHandle, ENT_ENTRY_MASK, INVALID_EHANDLE_INDEX, NUM_ENT_ENTRIES,
    NUM_ENT_ENTRY_BITS,
};
pub use list::{ClientEntityListVTable, EntityList};
pub use player::{BaseEntity, EntityFlags, LifeState, Player};
pub use resource::{PlayerResource, MAX_PLAYER_SLOTS, PLAYER_RESOURCE_SIGNATURE};
