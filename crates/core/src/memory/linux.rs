//! Linux module enumeration via the dynamic loader
//!
//! `dl_iterate_phdr` reports every loaded object with its program headers, so
//! the readable `PT_LOAD` segments are known without parsing
//! `/proc/self/maps`. Exports go through `dlopen(RTLD_NOLOAD)` + `dlsym`,
//! which never loads anything new.

use std::ffi::{c_int, c_void, CStr, CString};

use srcsdk_sdk::Address;

use super::module::{file_name, ModuleInfo, Segment};

struct Search<'a> {
    name: &'a str,
    found: Option<ModuleInfo>,
}

unsafe extern "C" fn visit(
    info: *mut libc::dl_phdr_info,
    _size: libc::size_t,
    data: *mut c_void,
) -> c_int {
    let search = &mut *(data as *mut Search);
    let info = &*info;

    let path = if info.dlpi_name.is_null() {
        ""
    } else {
        CStr::from_ptr(info.dlpi_name).to_str().unwrap_or("")
    };

    if path.is_empty() || !file_name(path).eq_ignore_ascii_case(search.name) {
        return 0;
    }

    let headers = if info.dlpi_phdr.is_null() {
        &[][..]
    } else {
        std::slice::from_raw_parts(info.dlpi_phdr, info.dlpi_phnum as usize)
    };

    let bias = info.dlpi_addr as usize;
    let mut segments = Vec::new();
    for header in headers {
        if header.p_type != libc::PT_LOAD || header.p_flags & libc::PF_R == 0 {
            continue;
        }
        segments.push(Segment {
            start: Address::new(bias.wrapping_add(header.p_vaddr as usize)),
            len: header.p_memsz as usize,
            executable: header.p_flags & libc::PF_X != 0,
        });
    }

    let Some(base) = segments.iter().map(|segment| segment.start).min() else {
        return 0;
    };
    let end = segments
        .iter()
        .map(|segment| segment.end())
        .max()
        .unwrap_or(base);

    search.found = Some(ModuleInfo {
        name: file_name(path).to_string(),
        path: path.to_string(),
        base,
        size: (end - base) as usize,
        segments,
    });

    // Non-zero stops the iteration
    1
}

pub(super) fn find_module(name: &str) -> Option<ModuleInfo> {
    let mut search = Search { name, found: None };
    unsafe {
        libc::dl_iterate_phdr(Some(visit), &mut search as *mut Search as *mut c_void);
    }
    search.found
}

pub(super) fn find_export(module: &ModuleInfo, symbol: &str) -> Option<Address> {
    let path = CString::new(module.path.as_str()).ok()?;
    let symbol = CString::new(symbol).ok()?;

    unsafe {
        let handle = libc::dlopen(path.as_ptr(), libc::RTLD_NOW | libc::RTLD_NOLOAD);
        if handle.is_null() {
            return None;
        }
        let address = libc::dlsym(handle, symbol.as_ptr());
        libc::dlclose(handle);
        Address::from_ptr(address).non_null()
    }
}
