//! Host memory access
//!
//! This module provides:
//! - [`ModuleSource`], the seam the scanner uses to find module images and
//!   exports
//! - [`LoadedModules`], the implementation for the current process
//! - [`InMemoryModules`], synthetic images for tests and offline analysis
//! - Virtual table helpers for calling host interfaces by slot index

mod module;
pub mod vtable;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "windows")]
mod windows;

pub use module::{InMemoryModules, LoadedModules, ModuleInfo, ModuleSource, Segment};
