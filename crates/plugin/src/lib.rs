//! srcsdk Injectable Entry Points
//!
//! This crate compiles to a cdylib (.so/.dll) exposing a C ABI over
//! `srcsdk_core`: attach/detach, metadata, and a few lookups for tools that
//! are not written in Rust. Attaching builds the process-wide `Sdk` and is
//! the only place a tracing subscriber is installed.

pub mod ffi;
