//! Host interface type definitions
//!
//! These are opaque types representing C++ interfaces exposed by the host.
//! We don't need their internal structure - just pointers. Methods that the
//! SDK calls are reached through fixed-layout vtable structs next to the
//! overlay that uses them.

use std::ffi::c_void;

/// Opaque type for IBaseClientDLL
/// Client DLL root interface; owns the list of networked client classes
#[repr(C)]
pub struct IBaseClientDLL {
    _opaque: [u8; 0],
}

/// Opaque type for IClientEntityList
/// Index and handle based lookup of client entities
#[repr(C)]
pub struct IClientEntityList {
    _opaque: [u8; 0],
}

/// Opaque type for IClientEntity
#[repr(C)]
pub struct IClientEntity {
    _opaque: [u8; 0],
}

/// Opaque type for IPhysicsObject
/// A single simulated physics body
#[repr(C)]
pub struct IPhysicsObject {
    _opaque: [u8; 0],
}

/// Opaque type for IPhysicsFrictionSnapshot
/// Iterator-like view of a physics object's current contacts
#[repr(C)]
pub struct IPhysicsFrictionSnapshot {
    _opaque: [u8; 0],
}

/// CreateInterface function signature
///
/// Each host module (client, engine, vphysics) exports a CreateInterface
/// function that hands out named interface singletons.
///
/// # Arguments
/// * `name` - Interface version string (e.g., "VClient018")
/// * `return_code` - Optional pointer to receive a status code (0 = success)
///
/// # Returns
/// Pointer to the interface, or null if not found
pub type CreateInterfaceFn =
    unsafe extern "C" fn(name: *const std::ffi::c_char, return_code: *mut i32) -> *mut c_void;

/// Name of the factory export every host module carries
pub const CREATE_INTERFACE_EXPORT: &str = "CreateInterface";
