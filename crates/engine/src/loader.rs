//! Interface acquisition via the CreateInterface pattern

use std::ffi::CStr;
use std::ptr::NonNull;

use srcsdk_sdk::{Address, CreateInterfaceFn};

use crate::error::InterfaceError;

/// Wrapper around a CreateInterface factory function
#[derive(Clone)]
pub struct InterfaceFactory {
    factory: CreateInterfaceFn,
    module: String,
}

impl InterfaceFactory {
    /// Create a new factory wrapper
    ///
    /// # Arguments
    /// * `factory` - The CreateInterface function pointer
    /// * `module` - Module the factory belongs to, used in error messages
    pub fn new(factory: CreateInterfaceFn, module: impl Into<String>) -> Self {
        Self {
            factory,
            module: module.into(),
        }
    }

    /// Wrap a resolved `CreateInterface` export
    ///
    /// # Safety
    /// `export` must be the address of a function with the
    /// [`CreateInterfaceFn`] signature.
    pub unsafe fn from_export(export: Address, module: impl Into<String>) -> Option<Self> {
        let export = export.non_null()?;
        let factory: CreateInterfaceFn = std::mem::transmute(export.value());
        Some(Self::new(factory, module))
    }

    /// Module name this factory was created for
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Get an interface by version string
    ///
    /// # Arguments
    /// * `version` - Null-terminated version string (e.g., b"VClient018\0")
    ///
    /// # Safety
    /// The factory must still be callable, and the returned pointer is only
    /// meaningful if T matches the actual interface type.
    pub unsafe fn get<T>(&self, version: &[u8]) -> Result<NonNull<T>, InterfaceError> {
        let version_str = CStr::from_bytes_with_nul(version).map_err(|_| {
            InterfaceError::InvalidVersionString(String::from_utf8_lossy(version).into_owned())
        })?;

        let mut ret_code: i32 = 0;
        let ptr = (self.factory)(version_str.as_ptr(), &mut ret_code);

        NonNull::new(ptr as *mut T).ok_or_else(|| {
            InterfaceError::NullPointer(format!(
                "{} from {} (status {})",
                version_str.to_string_lossy(),
                self.module,
                ret_code
            ))
        })
    }

    /// Try to get an interface, returning None on failure instead of error
    ///
    /// # Safety
    /// Same as `get`
    pub unsafe fn try_get<T>(&self, version: &[u8]) -> Option<NonNull<T>> {
        self.get(version).ok()
    }
}

impl std::fmt::Debug for InterfaceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceFactory")
            .field("module", &self.module)
            .field("factory", &format_args!("{:p}", self.factory as *const ()))
            .finish()
    }
}
