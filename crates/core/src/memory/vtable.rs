//! Virtual table access
//!
//! Host interfaces are C++ objects whose first word points at an array of
//! function pointers. Two ways of calling them are supported:
//! - a fixed-layout `#[repr(C)]` struct of function pointers, when the slot
//!   order is stable across host versions ([`vtable_as`])
//! - a raw slot read by index, when the index comes from gamedata
//!   ([`vfunc`])
//!
//! All host methods are called with the platform C convention, which matches
//! the member-function convention on 64-bit Windows and the Itanium ABI.

use srcsdk_sdk::Address;

/// Address of an object's virtual table
///
/// # Safety
/// `object` must point at a live polymorphic host object.
#[inline]
pub unsafe fn vtable(object: Address) -> Address {
    object.deref()
}

/// View an object's virtual table as a fixed-layout struct
///
/// # Safety
/// `object` must point at a live host object whose virtual table starts with
/// the slots described by `V`.
#[inline]
pub unsafe fn vtable_as<'a, V>(object: Address) -> Option<&'a V> {
    vtable(object).as_ptr::<V>().as_ref()
}

/// Function pointer stored in slot `index` of an object's virtual table
///
/// The result is null when the object or its table is null.
///
/// # Safety
/// `object` must be null or point at a live polymorphic host object with at
/// least `index + 1` slots.
#[inline]
pub unsafe fn vfunc(object: Address, index: usize) -> Address {
    if object.is_null() {
        return Address::NULL;
    }
    let table = vtable(object);
    if table.is_null() {
        return Address::NULL;
    }
    table.read_address((index * std::mem::size_of::<usize>()) as isize)
}
