//! srcsdk SDK - Host Type Definitions
//!
//! This crate contains the plain type definitions shared by every other
//! srcsdk crate. It has no dependencies and compiles quickly, allowing
//! parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`address`] - The `Address` newtype used for every raw host address
//! - [`interfaces`] - Opaque host interface types and the factory signature
//! - [`versions`] - Interface version strings for CreateInterface
//! - [`recv`] - `#[repr(C)]` layouts of the host's networked property tables
//! - [`math`] - Payload types that appear inside host structures

pub mod address;
pub mod interfaces;
pub mod math;
pub mod recv;
pub mod versions;

pub use address::Address;
pub use interfaces::*;
pub use math::{QAngle, Vector};
pub use recv::{ClientClass, RecvProp, RecvTable, SendPropType};
pub use versions::INTERFACE_VERSIONS;
