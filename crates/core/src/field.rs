//! Typed field access
//!
//! [`FieldView<T>`] pairs a resolved base address with a resolved offset.
//! Views can only be created inside this crate, by the resolution paths on
//! [`Sdk`], so holding one means both halves went through a successful
//! lookup and the base was not null.
//!
//! [`NetvarField<T>`] is the static form: declare it once, resolve it lazily
//! against an `Sdk`, reuse the cached offset afterwards.

use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use srcsdk_sdk::Address;

use crate::context::Sdk;
use crate::error::ResolveError;

/// A typed lens over `base + offset`
pub struct FieldView<T> {
    base: Address,
    offset: i64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Copy> FieldView<T> {
    pub(crate) fn new(base: Address, offset: i64) -> Self {
        Self {
            base,
            offset,
            _marker: PhantomData,
        }
    }

    /// Object base address
    pub fn base(&self) -> Address {
        self.base
    }

    /// Byte offset from the base
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Address of the field itself
    pub fn address(&self) -> Address {
        self.base.offset(self.offset as isize)
    }

    /// Read the field
    ///
    /// # Safety
    /// The object at `base` must still be alive and `T` must match the
    /// host's type for this field.
    #[inline]
    pub unsafe fn read(&self) -> T {
        self.base.read(self.offset as isize)
    }

    /// Write the field
    ///
    /// # Safety
    /// Same as [`FieldView::read`]; the write is not synchronized with the
    /// host's own threads.
    #[inline]
    pub unsafe fn write(&self, value: T) {
        self.base.write(value, self.offset as isize)
    }

    /// View of element `index` of an inline array starting at this field
    pub fn element(&self, index: usize) -> Self {
        Self::new(
            self.base,
            self.offset + (index * std::mem::size_of::<T>()) as i64,
        )
    }

    /// Reinterpret the field as another type
    pub fn cast<U: Copy>(&self) -> FieldView<U> {
        FieldView::new(self.base, self.offset)
    }
}

impl<T> Clone for FieldView<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldView<T> {}

impl<T> fmt::Debug for FieldView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldView")
            .field("base", &self.base)
            .field("offset", &format_args!("{:#x}", self.offset))
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// A lazily resolved netvar accessor
///
/// The offset is looked up on first use and kept in a `OnceLock`. A failed
/// lookup is not kept, so the next call retries.
///
/// ```ignore
/// static HEALTH: NetvarField<i32> = NetvarField::new("DT_BasePlayer", "m_iHealth");
///
/// let hp = unsafe { HEALTH.get(sdk, player)? };
/// ```
///
/// The cached offset belongs to the first `Sdk` that resolves it; in an
/// attached build there is exactly one.
pub struct NetvarField<T> {
    table: &'static str,
    path: &'static str,
    offset: OnceLock<i64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Copy> NetvarField<T> {
    pub const fn new(table: &'static str, path: &'static str) -> Self {
        Self {
            table,
            path,
            offset: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Resolve the offset, cached after the first success
    pub fn resolve(&self, sdk: &Sdk) -> Result<i64, ResolveError> {
        if let Some(offset) = self.offset.get() {
            return Ok(*offset);
        }
        let offset = sdk.netvar(self.table, self.path)?;
        Ok(*self.offset.get_or_init(|| offset))
    }

    /// View of this field on the object at `base`
    pub fn view(&self, sdk: &Sdk, base: Address) -> Result<FieldView<T>, ResolveError> {
        if base.is_null() {
            return Err(ResolveError::NullPointer(format!("{}.{}", self.table, self.path)));
        }
        Ok(FieldView::new(base, self.resolve(sdk)?))
    }

    /// Read the field from the object at `base`
    ///
    /// # Safety
    /// See [`FieldView::read`].
    pub unsafe fn get(&self, sdk: &Sdk, base: Address) -> Result<T, ResolveError> {
        Ok(self.view(sdk, base)?.read())
    }

    /// Write the field on the object at `base`
    ///
    /// # Safety
    /// See [`FieldView::write`].
    pub unsafe fn set(&self, sdk: &Sdk, base: Address, value: T) -> Result<(), ResolveError> {
        self.view(sdk, base)?.write(value);
        Ok(())
    }

    pub const fn table(&self) -> &'static str {
        self.table
    }

    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Check whether the offset has been resolved
    pub fn is_resolved(&self) -> bool {
        self.offset.get().is_some()
    }
}
