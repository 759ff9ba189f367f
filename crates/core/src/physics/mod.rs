//! Physics overlays
//!
//! Only the friction snapshot is exposed; it is the one physics structure
//! tooling reads directly (ground contact, surface material under an
//! object). Everything else in the physics system stays behind the host.

pub mod friction;

pub use friction::{
    physics_object, Contacts, FrictionContact, FrictionSnapshot, FrictionSnapshotVTable,
    DESTRUCTOR_SLOTS, MAX_CONTACTS,
};
