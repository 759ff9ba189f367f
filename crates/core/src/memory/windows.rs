//! Windows module enumeration through the loader and PSAPI

use std::ffi::CString;

use windows::core::PCSTR;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{GetModuleHandleA, GetProcAddress};
use windows::Win32::System::ProcessStatus::{GetModuleInformation, MODULEINFO};
use windows::Win32::System::Threading::GetCurrentProcess;

use srcsdk_sdk::Address;

use super::module::{ModuleInfo, Segment};

/// Find a module already loaded in this process
///
/// The whole image is reported as one segment; PE sections are mapped
/// readable for the lifetime of the module.
pub(super) fn find_module(name: &str) -> Option<ModuleInfo> {
    let name_c = CString::new(name).ok()?;

    unsafe {
        let handle = GetModuleHandleA(PCSTR(name_c.as_ptr() as *const u8)).ok()?;

        let mut info = MODULEINFO::default();
        GetModuleInformation(
            GetCurrentProcess(),
            handle,
            &mut info,
            std::mem::size_of::<MODULEINFO>() as u32,
        )
        .ok()?;

        let base = Address::from_ptr(info.lpBaseOfDll as *const u8);
        let size = info.SizeOfImage as usize;

        Some(ModuleInfo {
            name: name.to_string(),
            path: name.to_string(),
            base,
            size,
            segments: vec![Segment {
                start: base,
                len: size,
                executable: true,
            }],
        })
    }
}

pub(super) fn find_export(module: &ModuleInfo, symbol: &str) -> Option<Address> {
    let symbol_c = CString::new(symbol).ok()?;

    unsafe {
        let handle = HMODULE(module.base.as_mut_ptr());
        let proc = GetProcAddress(handle, PCSTR(symbol_c.as_ptr() as *const u8))?;
        Some(Address::new(proc as usize))
    }
}
