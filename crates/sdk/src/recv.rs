//! Networked property table layouts
//!
//! The client DLL describes every networked class with a tree of receive
//! tables. The host builds these once at startup and never frees them; the
//! SDK only ever reads them.
//!
//! ```text
//! ClientClass ──m_pNext──► ClientClass ──► ... ──► null
//!     │
//!     └─m_pRecvTable──► RecvTable "DT_BasePlayer"
//!                          ├── RecvProp "baseclass"  off 0 ──► RecvTable "DT_BaseCombatCharacter"
//!                          ├── RecvProp "m_Local"    off N ──► RecvTable "DT_Local"
//!                          │                                     └── RecvProp "m_vecPunchAngle" off M
//!                          └── RecvProp "m_iHealth"  off K
//! ```
//!
//! Offsets of props inside a child table are relative to the sub-object the
//! parent prop points at, so the absolute offset of a nested field is the sum
//! of the offsets along the path.

use std::ffi::{c_char, c_void};

/// Kind of value carried by a networked prop
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPropType {
    Int = 0,
    Float = 1,
    Vector = 2,
    VectorXY = 3,
    String = 4,
    Array = 5,
    DataTable = 6,
    Int64 = 7,
}

impl SendPropType {
    /// Convert the raw value stored in [`RecvProp::recv_type`]
    pub fn from_raw(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Int,
            1 => Self::Float,
            2 => Self::Vector,
            3 => Self::VectorXY,
            4 => Self::String,
            5 => Self::Array,
            6 => Self::DataTable,
            7 => Self::Int64,
            _ => return None,
        })
    }
}

/// A single networked field descriptor
#[repr(C)]
#[derive(Debug)]
pub struct RecvProp {
    pub var_name: *const c_char,
    /// Raw [`SendPropType`]
    pub recv_type: i32,
    pub flags: i32,
    pub string_buffer_size: i32,
    pub inside_array: bool,
    pub extra_data: *const c_void,
    pub array_prop: *mut RecvProp,
    pub array_length_proxy: *const c_void,
    pub proxy_fn: *const c_void,
    pub data_table_proxy_fn: *const c_void,
    /// Child table for `DataTable` props, null for leaves
    pub data_table: *mut RecvTable,
    /// Byte offset relative to the containing (sub-)object
    pub offset: i32,
    pub element_stride: i32,
    pub elements: i32,
    pub parent_array_prop_name: *const c_char,
}

/// An array of [`RecvProp`] with a name
#[repr(C)]
#[derive(Debug)]
pub struct RecvTable {
    pub props: *mut RecvProp,
    pub prop_count: i32,
    pub decoder: *mut c_void,
    pub net_table_name: *const c_char,
    pub initialized: bool,
    pub in_main_list: bool,
}

/// Node of the host's singly-linked list of networked classes
#[repr(C)]
#[derive(Debug)]
pub struct ClientClass {
    pub create_fn: *const c_void,
    pub create_event_fn: *const c_void,
    pub network_name: *const c_char,
    pub recv_table: *mut RecvTable,
    pub next: *mut ClientClass,
    pub class_id: i32,
}

impl RecvProp {
    /// A prop with every pointer null and every count zero
    pub const fn empty() -> Self {
        Self {
            var_name: std::ptr::null(),
            recv_type: SendPropType::Int as i32,
            flags: 0,
            string_buffer_size: 0,
            inside_array: false,
            extra_data: std::ptr::null(),
            array_prop: std::ptr::null_mut(),
            array_length_proxy: std::ptr::null(),
            proxy_fn: std::ptr::null(),
            data_table_proxy_fn: std::ptr::null(),
            data_table: std::ptr::null_mut(),
            offset: 0,
            element_stride: 0,
            elements: 0,
            parent_array_prop_name: std::ptr::null(),
        }
    }
}
