//! srcsdk Proc Macros
//!
//! This crate provides `#[derive(Overlay)]`, which turns a struct describing a
//! host object into typed accessors that resolve their offsets through an
//! [`Sdk`](../srcsdk_core/struct.Sdk.html).
//!
//! # Example
//!
//! ```ignore
//! use std::marker::PhantomData;
//! use srcsdk_core::{sdk::Address, Overlay, Sdk};
//!
//! #[derive(Overlay)]
//! #[overlay(table = "DT_BasePlayer", structure = "Player")]
//! pub struct Player<'a> {
//!     ptr: Address,
//!     sdk: &'a Sdk,
//!
//!     #[overlay(netvar = "m_iHealth")]
//!     health: PhantomData<i32>,
//!
//!     #[overlay(netvar = "m_Local.m_vecPunchAngle", readonly)]
//!     punch_angle: PhantomData<QAngle>,
//!
//!     #[overlay(offset = "Team")]
//!     team: PhantomData<i32>,
//! }
//!
//! // Generated:
//! // - unsafe Player::new(sdk, address) -> Option<Player>
//! // - player.health() -> Result<i32, ResolveError>
//! // - player.set_health(100) -> Result<(), ResolveError>
//! // - player.health_view() -> Result<FieldView<i32>, ResolveError>
//! // - player.punch_angle() (no setter)
//! // - player.team(), resolved from the offset table entry Player.Team
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes
//!
//! - `#[overlay(table = "DT_Name")]` - Property table for `netvar` fields.
//! - `#[overlay(structure = "Name")]` - Offset-table structure for `offset` fields.
//!
//! ## Field Attributes
//!
//! - `#[overlay(netvar = "m_path")]` - Networked field, dotted for nested tables.
//! - `#[overlay(offset = "Field")]` - Offset-table field.
//! - `#[overlay(readonly)]` - Don't generate a setter.
//!
//! The struct must have a `ptr: Address` field, a `sdk: &'a Sdk` field and a
//! lifetime parameter. Other fields are initialised with `PhantomData` or
//! `Default::default()`.

mod overlay;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for typed overlays over host objects
///
/// # Generated Code
///
/// For each `netvar`/`offset` field, the macro generates:
///
/// - A view method (`fn health_view(&self) -> Result<FieldView<i32>, ResolveError>`)
/// - A getter (`fn health(&self) -> Result<i32, ResolveError>`)
/// - A setter (`fn set_health(&mut self, value: i32) -> Result<(), ResolveError>`) unless `readonly`
/// - A `HEALTH_FIELD` constant holding the lookup key
///
/// Plus `TABLE`/`STRUCTURE` constants, `unsafe fn new(sdk, ptr) -> Option<Self>`,
/// `fn address(&self)`, and an `Overlay` trait implementation.
///
/// Offsets are resolved on each access through the `Sdk` caches; a failed
/// lookup surfaces as an error and is retried on the next access.
#[proc_macro_derive(Overlay, attributes(overlay))]
pub fn derive_overlay(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    overlay::derive_overlay(input).into()
}
