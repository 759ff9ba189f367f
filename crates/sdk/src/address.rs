//! Raw host address newtype
//!
//! [`Address`] wraps a machine-width integer pointing into memory owned by the
//! host process. It never owns or frees that memory. Reads and writes are
//! unchecked: callers are expected to only build addresses from a successful
//! resolution (signature scan, export lookup, interface factory, or a value
//! read out of such a structure).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A borrowed address inside the host process
///
/// Ordering and hashing follow the numeric value, so addresses can be used as
/// map keys. [`Address::NULL`] is the canonical null value.
///
/// # Example
///
/// ```
/// use srcsdk_sdk::Address;
///
/// let mut buf = [0u8; 16];
/// let base = Address::from_ptr(buf.as_mut_ptr());
///
/// unsafe {
///     base.write::<u32>(0xDEAD_BEEF, 4);
///     assert_eq!(base.read::<u32>(4), 0xDEAD_BEEF);
/// }
/// ```
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address(usize);

impl Address {
    /// The zero address
    pub const NULL: Address = Address(0);

    /// Create an address from a raw integer
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Create an address from a pointer
    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    /// Get the numeric value
    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }

    /// Check for the zero address
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `None` for the zero address, `Some(self)` otherwise
    #[inline]
    pub const fn non_null(self) -> Option<Self> {
        if self.0 == 0 {
            None
        } else {
            Some(self)
        }
    }

    /// Reinterpret as a const pointer to `T`
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Reinterpret as a mutable pointer to `T`
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    /// Displace by a signed byte count (wrapping)
    #[inline]
    pub const fn offset(self, bytes: isize) -> Self {
        Self(self.0.wrapping_add_signed(bytes))
    }

    /// Signed distance in bytes from `origin` to `self`
    #[inline]
    pub const fn distance_from(self, origin: Address) -> isize {
        self.0.wrapping_sub(origin.0) as isize
    }

    /// Read a `T` at `self + offset`
    ///
    /// # Safety
    /// `self + offset` must point to `size_of::<T>()` readable bytes holding a
    /// valid `T`. No alignment is required.
    #[inline]
    pub unsafe fn read<T: Copy>(self, offset: isize) -> T {
        self.offset(offset).as_ptr::<T>().read_unaligned()
    }

    /// Write a `T` at `self + offset`
    ///
    /// # Safety
    /// `self + offset` must point to `size_of::<T>()` writable bytes. No
    /// alignment is required.
    #[inline]
    pub unsafe fn write<T: Copy>(self, value: T, offset: isize) {
        self.offset(offset).as_mut_ptr::<T>().write_unaligned(value)
    }

    /// Read a pointer-sized value at `self + offset` as an address
    ///
    /// # Safety
    /// Same as [`Address::read`].
    #[inline]
    pub unsafe fn read_address(self, offset: isize) -> Address {
        Address(self.read::<usize>(offset))
    }

    /// Read the pointer stored at `self`
    ///
    /// # Safety
    /// Same as [`Address::read`].
    #[inline]
    pub unsafe fn deref(self) -> Address {
        self.read_address(0)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add<usize> for Address {
    type Output = Address;

    #[inline]
    fn add(self, rhs: usize) -> Address {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<usize> for Address {
    type Output = Address;

    #[inline]
    fn sub(self, rhs: usize) -> Address {
        Address(self.0.wrapping_sub(rhs))
    }
}

impl Sub<Address> for Address {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Address) -> isize {
        self.distance_from(rhs)
    }
}

impl AddAssign<usize> for Address {
    #[inline]
    fn add_assign(&mut self, rhs: usize) {
        self.0 = self.0.wrapping_add(rhs);
    }
}

impl SubAssign<usize> for Address {
    #[inline]
    fn sub_assign(&mut self, rhs: usize) {
        self.0 = self.0.wrapping_sub(rhs);
    }
}

impl<T> From<*const T> for Address {
    fn from(ptr: *const T) -> Self {
        Self::from_ptr(ptr)
    }
}

impl<T> From<*mut T> for Address {
    fn from(ptr: *mut T) -> Self {
        Self::from_ptr(ptr as *const T)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_null() {
        assert!(Address::NULL.is_null());
        assert_eq!(Address::default(), Address::NULL);
        assert_eq!(Address::new(0), Address::NULL);
        assert!(Address::NULL.non_null().is_none());
        assert_eq!(Address::new(8).non_null(), Some(Address::new(8)));
    }

    #[test]
    fn test_arithmetic() {
        let mut a = Address::new(0x1000);
        assert_eq!(a + 0x10, Address::new(0x1010));
        assert_eq!(a - 0x10, Address::new(0x0FF0));
        assert_eq!(a.offset(-4), Address::new(0x0FFC));
        assert_eq!(Address::new(0x1010) - a, 0x10);
        assert_eq!(a - Address::new(0x1010), -0x10);

        a += 1;
        assert_eq!(a, Address::new(0x1001));
        a -= 2;
        assert_eq!(a, Address::new(0x0FFF));
    }

    #[test]
    fn test_ordering_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(Address::new(30), "c");
        map.insert(Address::new(10), "a");
        map.insert(Address::new(20), "b");

        let order: Vec<_> = map.values().copied().collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(Address::new(1) > Address::NULL);
    }

    #[test]
    fn test_read_write_round_trip() {
        let mut scratch = [0u8; 64];
        let base = Address::from_ptr(scratch.as_mut_ptr());

        unsafe {
            base.write::<i32>(-1234, 0);
            base.write::<u64>(u64::MAX - 7, 4); // unaligned on purpose
            base.write::<f32>(1.5, 12);
            base.write::<bool>(true, 16);
            base.write::<i16>(-3, 17);
            base.write::<f64>(-0.25, 40);

            assert_eq!(base.read::<i32>(0), -1234);
            assert_eq!(base.read::<u64>(4), u64::MAX - 7);
            assert_eq!(base.read::<f32>(12), 1.5);
            assert!(base.read::<bool>(16));
            assert_eq!(base.read::<i16>(17), -3);
            assert_eq!(base.read::<f64>(40), -0.25);
        }
    }

    #[test]
    fn test_deref_chain() {
        let target = 0x55u8;
        let inner: usize = &target as *const u8 as usize;
        let outer: usize = &inner as *const usize as usize;

        let addr = Address::new(outer);
        unsafe {
            let resolved = addr.deref();
            assert_eq!(resolved, Address::new(inner));
            assert_eq!(resolved.read::<u8>(0), 0x55);
        }
    }

    #[test]
    fn test_formatting() {
        let a = Address::new(0xABC);
        assert_eq!(format!("{}", a), "0xabc");
        assert_eq!(format!("{:?}", a), "Address(0xabc)");
        assert_eq!(format!("{:X}", a), "ABC");
    }
}
