//! Typed overlays over host objects
//!
//! An overlay is a thin struct holding an object address and the [`Sdk`] it
//! resolves through. Accessors are generated by `#[derive(Overlay)]`; this
//! trait is what generic code (handles, entity lists) needs from them.

use srcsdk_sdk::Address;

use crate::context::Sdk;

/// A typed view of one host object
pub trait Overlay<'a>: Sized {
    /// Property table `netvar` accessors resolve against
    const TABLE: Option<&'static str>;

    /// Offset-table structure `offset` accessors resolve against
    const STRUCTURE: Option<&'static str>;

    /// Wrap the object at `address`, `None` when it is null
    ///
    /// # Safety
    /// `address` must be null or point to a live host object this overlay
    /// describes, for as long as the overlay is used.
    unsafe fn from_address(sdk: &'a Sdk, address: Address) -> Option<Self>;

    fn address(&self) -> Address;

    fn sdk(&self) -> &'a Sdk;

    /// Reinterpret as another overlay on the same object
    ///
    /// # Safety
    /// See [`Overlay::from_address`].
    unsafe fn cast<U: Overlay<'a>>(&self) -> Option<U> {
        U::from_address(self.sdk(), self.address())
    }
}
