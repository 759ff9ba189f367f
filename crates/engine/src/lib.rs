//! srcsdk Engine - Interface Factories and Binding Registry
//!
//! This crate handles:
//! - Calling host `CreateInterface` factories
//! - Caching resolved signature and interface addresses for the process lifetime
//!
//! # Architecture
//!
//! Factories are wrapped in [`InterfaceFactory`]. Every address that survives
//! a successful resolution is stored in a [`BindingRegistry`], which is owned
//! by the SDK context rather than living in a hidden static.
//!
//! # Thread Safety
//!
//! The registry tolerates concurrent first resolutions of the same name: the
//! first stored value wins and later writers get it back.

pub mod error;
pub mod loader;
pub mod registry;

pub use error::InterfaceError;
pub use loader::InterfaceFactory;
pub use registry::{export_key, interface_key, BindingRegistry};
