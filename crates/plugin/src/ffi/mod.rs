//! C ABI surface

pub mod exports;
