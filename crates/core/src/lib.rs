//! srcsdk Core - Runtime Resolution and Typed Access
//!
//! This crate locates the host's internal structures at runtime and exposes
//! typed views over them:
//!
//! - [`scanner`] - Byte-pattern and export lookup over loaded modules
//! - [`gamedata`] - The signature and offset database
//! - [`netvars`] - Walking the host's networked property tables
//! - [`field`] - Typed `(base, offset, T)` views
//! - [`Sdk`] - The context that owns all caches and ties the pieces together
//! - [`entities`], [`physics`], [`prediction`] - Overlays built on top
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and engine crates for convenience:
//! - [`sdk`] - Host type definitions and interface version strings
//! - [`engine`] - Interface factories and the binding registry
//!
//! # Example
//!
//! ```ignore
//! use srcsdk_core::{entities::EntityList, Sdk, SdkConfig};
//!
//! let sdk = Sdk::attach(SdkConfig::load()?)?;
//! let entities = EntityList::new(&sdk)?;
//! let health = sdk.netvar("DT_BasePlayer", "m_iHealth")?;
//! ```

// Allow the crate to refer to itself as `srcsdk_core` for proc macro compatibility
extern crate self as srcsdk_core;

pub use srcsdk_engine as engine;
pub use srcsdk_sdk as sdk;

pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod field;
pub mod gamedata;
pub mod hash;
pub mod memory;
pub mod netvars;
pub mod overlay;
pub mod physics;
pub mod prediction;
pub mod scanner;

pub use config::{ConfigError, SdkConfig};
pub use context::{install, sdk, try_sdk, Sdk, SdkBuilder};
pub use error::{ResolveError, SdkError};
pub use field::{FieldView, NetvarField};
pub use gamedata::{Gamedata, GamedataError, OffsetTable, Signature};
pub use memory::{InMemoryModules, LoadedModules, ModuleInfo, ModuleSource};
pub use overlay::Overlay;
pub use scanner::{Pattern, PatternError, ScanOrder, Scanner};

// Derive macro, same name as the trait it implements
pub use srcsdk_macros::Overlay;
