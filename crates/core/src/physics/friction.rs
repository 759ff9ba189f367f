//! Friction snapshots
//!
//! `IPhysicsFrictionSnapshot` walks the contacts of one physics object. The
//! host hands one out from `IPhysicsObject::CreateFrictionSnapshot` and takes
//! it back through `DestroyFrictionSnapshot`; both slot indices come from the
//! offset table because they move between host builds. The snapshot's own
//! method order is fixed.
//!
//! ```text
//! IPhysicsObject                    IPhysicsFrictionSnapshot
//! ├── [n] CreateFrictionSnapshot ──► ├── ~dtor
//! └── [m] DestroyFrictionSnapshot    ├── IsValid / GetObject / GetMaterial
//!                                    ├── GetContactPoint / GetSurfaceNormal
//!                                    ├── GetNormalForce / GetEnergyAbsorbed
//!                                    ├── ...
//!                                    ├── NextFrictionData
//!                                    └── GetFrictionCoefficient
//! ```

use std::ptr::NonNull;

use srcsdk_sdk::{Address, IPhysicsFrictionSnapshot, IPhysicsObject, Vector};
use tracing::warn;

use crate::context::Sdk;
use crate::error::ResolveError;
use crate::memory::vtable::{vfunc, vtable_as};

type This = *mut IPhysicsFrictionSnapshot;

/// Slots taken by the virtual destructor
#[cfg(target_os = "windows")]
pub const DESTRUCTOR_SLOTS: usize = 1;
/// Slots taken by the virtual destructor
#[cfg(not(target_os = "windows"))]
pub const DESTRUCTOR_SLOTS: usize = 2;

/// Upper bound on contacts visited by one iteration
pub const MAX_CONTACTS: usize = 1024;

/// Virtual table layout of `IPhysicsFrictionSnapshot`
#[repr(C)]
pub struct FrictionSnapshotVTable {
    pub destructor: [usize; DESTRUCTOR_SLOTS],
    pub is_valid: unsafe extern "C" fn(This) -> bool,
    pub get_object: unsafe extern "C" fn(This, i32) -> *mut IPhysicsObject,
    pub get_material: unsafe extern "C" fn(This, i32) -> i32,
    pub get_contact_point: unsafe extern "C" fn(This, *mut Vector),
    pub get_surface_normal: unsafe extern "C" fn(This, *mut Vector),
    pub get_normal_force: unsafe extern "C" fn(This) -> f32,
    pub get_energy_absorbed: unsafe extern "C" fn(This) -> f32,
    pub recompute_friction: unsafe extern "C" fn(This),
    pub clear_friction_force: unsafe extern "C" fn(This),
    pub mark_contact_for_delete: unsafe extern "C" fn(This),
    pub delete_all_marked_contacts: unsafe extern "C" fn(This, bool),
    pub next_friction_data: unsafe extern "C" fn(This),
    pub get_friction_coefficient: unsafe extern "C" fn(This) -> f32,
}

/// One contact between the snapshot's object and another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionContact {
    /// The object on the other side of the contact, if any
    pub other: Option<Address>,
    /// Surface material index of the snapshot's object
    pub material: i32,
    /// Surface material index of the other object
    pub other_material: i32,
    pub point: Vector,
    /// Surface normal, pointing away from the snapshot's object
    pub normal: Vector,
    pub normal_force: f32,
    pub energy_absorbed: f32,
    pub friction_coefficient: f32,
}

type CreateSnapshotFn = unsafe extern "C" fn(*mut IPhysicsObject) -> This;
type DestroySnapshotFn = unsafe extern "C" fn(*mut IPhysicsObject, This);

/// A live friction snapshot, destroyed on drop
pub struct FrictionSnapshot {
    object: NonNull<IPhysicsObject>,
    raw: NonNull<IPhysicsFrictionSnapshot>,
    destroy: DestroySnapshotFn,
}

impl FrictionSnapshot {
    /// Create a snapshot of the contacts of `object`
    ///
    /// # Safety
    /// `object` must point at a live `IPhysicsObject` that outlives the
    /// snapshot.
    pub unsafe fn create(sdk: &Sdk, object: NonNull<IPhysicsObject>) -> Result<Self, ResolveError> {
        let this = Address::from_ptr(object.as_ptr());
        let create = method(sdk, this, "CreateFrictionSnapshot")?;
        let destroy = method(sdk, this, "DestroyFrictionSnapshot")?;

        let create: CreateSnapshotFn = std::mem::transmute(create.value());
        let destroy: DestroySnapshotFn = std::mem::transmute(destroy.value());

        let raw = NonNull::new(create(object.as_ptr()))
            .ok_or_else(|| ResolveError::NullPointer("IPhysicsObject.CreateFrictionSnapshot".to_string()))?;

        Ok(Self {
            object,
            raw,
            destroy,
        })
    }

    pub fn as_ptr(&self) -> *mut IPhysicsFrictionSnapshot {
        self.raw.as_ptr()
    }

    fn vtable(&self) -> Option<&FrictionSnapshotVTable> {
        unsafe { vtable_as(Address::from_ptr(self.raw.as_ptr())) }
    }

    /// Whether the cursor is on a contact
    pub fn is_valid(&self) -> bool {
        self.vtable()
            .map(|vtable| unsafe { (vtable.is_valid)(self.as_ptr()) })
            .unwrap_or(false)
    }

    /// The contact under the cursor
    pub fn current(&self) -> Option<FrictionContact> {
        let vtable = self.vtable()?;
        let this = self.as_ptr();

        unsafe {
            if !(vtable.is_valid)(this) {
                return None;
            }

            let mut point = Vector::ZERO;
            let mut normal = Vector::ZERO;
            (vtable.get_contact_point)(this, &mut point);
            (vtable.get_surface_normal)(this, &mut normal);

            Some(FrictionContact {
                other: Address::from_ptr((vtable.get_object)(this, 1)).non_null(),
                material: (vtable.get_material)(this, 0),
                other_material: (vtable.get_material)(this, 1),
                point,
                normal,
                normal_force: (vtable.get_normal_force)(this),
                energy_absorbed: (vtable.get_energy_absorbed)(this),
                friction_coefficient: (vtable.get_friction_coefficient)(this),
            })
        }
    }

    /// Move the cursor to the next contact
    pub fn advance(&mut self) {
        if let Some(vtable) = self.vtable() {
            unsafe { (vtable.next_friction_data)(self.as_ptr()) }
        }
    }

    /// Mark the contact under the cursor for deletion
    pub fn mark_for_delete(&mut self) {
        if let Some(vtable) = self.vtable() {
            unsafe { (vtable.mark_contact_for_delete)(self.as_ptr()) }
        }
    }

    /// Delete every marked contact
    pub fn delete_marked(&mut self, wake_objects: bool) {
        if let Some(vtable) = self.vtable() {
            unsafe { (vtable.delete_all_marked_contacts)(self.as_ptr(), wake_objects) }
        }
    }

    /// Drain the remaining contacts
    pub fn contacts(&mut self) -> Contacts<'_> {
        Contacts {
            snapshot: self,
            visited: 0,
        }
    }
}

impl Drop for FrictionSnapshot {
    fn drop(&mut self) {
        unsafe { (self.destroy)(self.object.as_ptr(), self.raw.as_ptr()) }
    }
}

impl std::fmt::Debug for FrictionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrictionSnapshot")
            .field("object", &self.object)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Iterator over a snapshot's contacts
pub struct Contacts<'s> {
    snapshot: &'s mut FrictionSnapshot,
    visited: usize,
}

impl Iterator for Contacts<'_> {
    type Item = FrictionContact;

    fn next(&mut self) -> Option<FrictionContact> {
        if self.visited >= MAX_CONTACTS {
            warn!("friction snapshot exceeded {} contacts", MAX_CONTACTS);
            return None;
        }
        let contact = self.snapshot.current()?;
        self.snapshot.advance();
        self.visited += 1;
        Some(contact)
    }
}

fn method(sdk: &Sdk, object: Address, name: &str) -> Result<Address, ResolveError> {
    let index = sdk.vfunc_index("IPhysicsObject", name)?;
    unsafe { vfunc(object, index) }
        .non_null()
        .ok_or_else(|| ResolveError::NullPointer(format!("IPhysicsObject.{}", name)))
}

/// Physics object of an entity, through `VPhysicsGetObject`
///
/// # Safety
/// `entity` must point at a live client entity.
pub unsafe fn physics_object(sdk: &Sdk, entity: Address) -> Result<Option<NonNull<IPhysicsObject>>, ResolveError> {
    if entity.is_null() {
        return Err(ResolveError::NullPointer("CBaseEntity.VPhysicsGetObject".to_string()));
    }
    let index = sdk.vfunc_index("CBaseEntity", "VPhysicsGetObject")?;
    let slot = vfunc(entity, index)
        .non_null()
        .ok_or_else(|| ResolveError::NullPointer("CBaseEntity.VPhysicsGetObject".to_string()))?;

    let get_object: unsafe extern "C" fn(*mut std::ffi::c_void) -> *mut IPhysicsObject =
        std::mem::transmute(slot.value());
    Ok(NonNull::new(get_object(entity.as_mut_ptr())))
}
