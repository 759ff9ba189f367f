//! Borrowed views over host property tables
//!
//! The views never copy or own host memory. Constructing one from a raw
//! address is the unsafe step; everything after that is plain reads of
//! structures the host keeps alive for the whole process.

use std::ffi::{c_char, CStr};
use std::fmt;
use std::marker::PhantomData;

use srcsdk_sdk::{Address, ClientClass, RecvProp, RecvTable, SendPropType};

/// Upper bound on class-list length; guards against a corrupt `next` cycle
pub const MAX_CLASSES: usize = 8192;

fn host_str<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

/// A receive table
#[derive(Clone, Copy)]
pub struct TableRef<'a> {
    raw: &'a RecvTable,
}

impl<'a> TableRef<'a> {
    /// View a host table
    ///
    /// # Safety
    /// `table` must be null or point at a fully built `RecvTable` that stays
    /// alive and unmodified for `'a`, as must every table reachable from it.
    pub unsafe fn from_ptr(table: *const RecvTable) -> Option<Self> {
        table.as_ref().map(|raw| Self { raw })
    }

    /// View a host table by address
    ///
    /// # Safety
    /// Same as [`TableRef::from_ptr`].
    pub unsafe fn from_address(table: Address) -> Option<Self> {
        Self::from_ptr(table.as_ptr())
    }

    /// Network name, e.g. `DT_BasePlayer`
    pub fn name(&self) -> &'a str {
        host_str(self.raw.net_table_name)
    }

    /// Number of props
    pub fn len(&self) -> usize {
        usize::try_from(self.raw.prop_count).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 || self.raw.props.is_null()
    }

    /// Props in declaration order
    pub fn props(&self) -> impl Iterator<Item = PropRef<'a>> + 'a {
        let props: &'a [RecvProp] = if self.is_empty() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.raw.props, self.len()) }
        };
        props.iter().map(|raw| PropRef { raw })
    }

    /// Prop at `index`
    pub fn prop(&self, index: usize) -> Option<PropRef<'a>> {
        self.props().nth(index)
    }

    /// Address of the host table
    pub fn address(&self) -> Address {
        Address::from_ptr(self.raw as *const RecvTable)
    }
}

impl fmt::Debug for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRef")
            .field("name", &self.name())
            .field("props", &self.len())
            .field("address", &self.address())
            .finish()
    }
}

/// A receive prop
#[derive(Clone, Copy)]
pub struct PropRef<'a> {
    raw: &'a RecvProp,
}

impl<'a> PropRef<'a> {
    /// Field name, e.g. `m_iHealth`
    pub fn name(&self) -> &'a str {
        host_str(self.raw.var_name)
    }

    /// Offset relative to the containing (sub-)object
    pub fn offset(&self) -> i32 {
        self.raw.offset
    }

    /// Decoded prop type; `None` for values this SDK does not know
    pub fn prop_type(&self) -> Option<SendPropType> {
        SendPropType::from_raw(self.raw.recv_type)
    }

    /// Child table of a data-table prop
    pub fn child(&self) -> Option<TableRef<'a>> {
        // Props are only reachable through a TableRef, whose constructor
        // vouches for every table reachable from it.
        unsafe { TableRef::from_ptr(self.raw.data_table) }
    }

    /// Element count for array props
    pub fn elements(&self) -> i32 {
        self.raw.elements
    }

    /// Byte stride between array elements
    pub fn element_stride(&self) -> i32 {
        self.raw.element_stride
    }

    /// Address of the host prop
    pub fn address(&self) -> Address {
        Address::from_ptr(self.raw as *const RecvProp)
    }
}

impl fmt::Debug for PropRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropRef")
            .field("name", &self.name())
            .field("offset", &self.offset())
            .field("type", &self.prop_type())
            .finish()
    }
}

/// An entry of the host's class list
#[derive(Clone, Copy)]
pub struct ClassRef<'a> {
    raw: &'a ClientClass,
}

impl<'a> ClassRef<'a> {
    /// Network class name, e.g. `CCSPlayer`
    pub fn name(&self) -> &'a str {
        host_str(self.raw.network_name)
    }

    /// Numeric class id
    pub fn class_id(&self) -> i32 {
        self.raw.class_id
    }

    /// Root receive table
    pub fn table(&self) -> Option<TableRef<'a>> {
        unsafe { TableRef::from_ptr(self.raw.recv_table) }
    }

    /// Address of the host class entry
    pub fn address(&self) -> Address {
        Address::from_ptr(self.raw as *const ClientClass)
    }
}

impl fmt::Debug for ClassRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRef")
            .field("name", &self.name())
            .field("class_id", &self.class_id())
            .finish()
    }
}

/// Iterator over the host's singly-linked class list
#[derive(Clone)]
pub struct ClassIter<'a> {
    current: *const ClientClass,
    visited: usize,
    _marker: PhantomData<&'a ClientClass>,
}

impl<'a> ClassIter<'a> {
    /// Walk the list starting at `head`
    ///
    /// # Safety
    /// `head` must be null or the first entry of a class list whose entries
    /// and tables stay alive and unmodified for `'a`.
    pub unsafe fn new(head: Address) -> Self {
        Self {
            current: head.as_ptr(),
            visited: 0,
            _marker: PhantomData,
        }
    }
}

impl<'a> Iterator for ClassIter<'a> {
    type Item = ClassRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.visited >= MAX_CLASSES {
            return None;
        }
        let raw: &'a ClientClass = unsafe { self.current.as_ref()? };
        self.current = raw.next;
        self.visited += 1;
        Some(ClassRef { raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netvars::fixtures::{child, leaf, table, ClassList, OwnedTable};

    #[test]
    fn test_table_view() {
        let owned = OwnedTable::build(table(
            "DT_Test",
            vec![leaf("m_a", 4), child("m_sub", 16, table("DT_Sub", vec![leaf("m_b", 8)]))],
        ));
        let view = owned.view();

        assert_eq!(view.name(), "DT_Test");
        assert_eq!(view.len(), 2);
        assert_eq!(view.address(), owned.address());

        let names: Vec<&str> = view.props().map(|p| p.name()).collect();
        assert_eq!(names, vec!["m_a", "m_sub"]);

        let a = view.prop(0).unwrap();
        assert_eq!(a.offset(), 4);
        assert_eq!(a.prop_type(), Some(SendPropType::Int));
        assert!(a.child().is_none());

        let sub = view.prop(1).unwrap();
        assert_eq!(sub.prop_type(), Some(SendPropType::DataTable));
        assert_eq!(sub.child().unwrap().name(), "DT_Sub");
        assert!(view.prop(2).is_none());
    }

    #[test]
    fn test_null_views() {
        assert!(unsafe { TableRef::from_ptr(std::ptr::null()) }.is_none());
        assert!(unsafe { TableRef::from_address(Address::NULL) }.is_none());
        assert_eq!(unsafe { ClassIter::new(Address::NULL) }.count(), 0);
    }

    #[test]
    fn test_class_iter() {
        let list = ClassList::build(vec![
            ("CBaseEntity", 1, table("DT_BaseEntity", vec![leaf("m_iTeamNum", 0x9C)])),
            ("CCSPlayer", 40, table("DT_CSPlayer", vec![leaf("m_iHealth", 0x100)])),
        ]);

        let classes: Vec<(String, i32)> = unsafe { ClassIter::new(list.head()) }
            .map(|c| (c.name().to_string(), c.class_id()))
            .collect();
        assert_eq!(
            classes,
            vec![("CBaseEntity".to_string(), 1), ("CCSPlayer".to_string(), 40)]
        );

        let player = unsafe { ClassIter::new(list.head()) }.nth(1).unwrap();
        assert_eq!(player.table().unwrap().name(), "DT_CSPlayer");
    }
}
