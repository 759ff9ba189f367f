//! C-compatible exports called by an injector or a non-Rust host tool

use std::ffi::{c_char, CStr};
use std::path::Path;

use tracing::instrument;
use tracing_subscriber::EnvFilter;

use srcsdk_core::{install, try_sdk, Sdk, SdkConfig};

// Library metadata - static strings with null terminators for C compatibility
static NAME: &[u8] = b"srcsdk\0";
static DESCRIPTION: &[u8] = b"Source engine runtime resolution and typed access\0";
static LICENSE: &[u8] = b"MIT\0";
static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

/// Load configuration, resolve the gamedata and install the process-wide SDK
///
/// A null `base_dir` loads `srcsdk.toml` from the default location.
///
/// # Safety
/// - `base_dir` must be a valid null-terminated C string or null
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn srcsdk_attach(base_dir: *const c_char, error: *mut c_char, maxlen: usize) -> bool {
    if try_sdk().is_some() {
        write_error(error, maxlen, "Already attached");
        return false;
    }

    let base_dir = match c_str(base_dir) {
        Some(Ok(dir)) => Some(dir),
        Some(Err(())) => {
            write_error(error, maxlen, "Base directory is not valid UTF-8");
            return false;
        }
        None => None,
    };

    match std::panic::catch_unwind(|| attach(base_dir)) {
        Ok(Ok(())) => true,
        Ok(Err(message)) => {
            write_error(error, maxlen, &message);
            false
        }
        Err(_) => {
            write_error(error, maxlen, "Panic during attach");
            false
        }
    }
}

fn attach(base_dir: Option<&str>) -> Result<(), String> {
    let config = match base_dir {
        Some(dir) => SdkConfig::load_in(Path::new(dir)),
        None => SdkConfig::load(),
    }
    .map_err(|e| format!("Config error: {}", e))?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    tracing::info!("srcsdk attaching...");

    let sdk = Sdk::attach(config).map_err(|e| {
        tracing::error!("Failed to attach: {}", e);
        format!("Attach error: {}", e)
    })?;

    let sdk = install(sdk).map_err(|e| e.to_string())?;
    tracing::info!(
        signatures = sdk.gamedata().signature_names().len(),
        "srcsdk attached"
    );
    Ok(())
}

/// Log what was resolved during the session
///
/// The installed SDK lives until the process exits; host memory it points
/// into is not owned by it, so there is nothing to release.
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn srcsdk_detach() -> bool {
    let Some(sdk) = try_sdk() else {
        return false;
    };

    let registry = sdk.registry();
    tracing::info!(
        bindings = registry.len(),
        interfaces = registry.interface_count(),
        "srcsdk detaching"
    );
    true
}

/// Resolve a named signature to an absolute address
///
/// # Safety
/// - `name` must be a valid null-terminated C string
/// - `out` must be a valid pointer to a `usize`
#[no_mangle]
pub unsafe extern "C" fn srcsdk_signature(name: *const c_char, out: *mut usize) -> bool {
    let (Some(sdk), Some(Ok(name))) = (try_sdk(), c_str(name)) else {
        return false;
    };
    if out.is_null() {
        return false;
    }

    match sdk.signature(name) {
        Ok(address) => {
            *out = address.value();
            true
        }
        Err(e) => {
            tracing::debug!("srcsdk_signature({}): {}", name, e);
            false
        }
    }
}

/// Resolve a networked field's offset within its table
///
/// # Safety
/// - `table` and `path` must be valid null-terminated C strings
/// - `out` must be a valid pointer to an `i64`
#[no_mangle]
pub unsafe extern "C" fn srcsdk_netvar(table: *const c_char, path: *const c_char, out: *mut i64) -> bool {
    let (Some(sdk), Some(Ok(table)), Some(Ok(path))) = (try_sdk(), c_str(table), c_str(path)) else {
        return false;
    };
    if out.is_null() {
        return false;
    }

    match sdk.netvar(table, path) {
        Ok(offset) => {
            *out = offset;
            true
        }
        Err(e) => {
            tracing::debug!("srcsdk_netvar({}, {}): {}", table, path, e);
            false
        }
    }
}

/// Look up a gamedata offset
///
/// # Safety
/// - `structure` and `field` must be valid null-terminated C strings
/// - `out` must be a valid pointer to an `i64`
#[no_mangle]
pub unsafe extern "C" fn srcsdk_offset(structure: *const c_char, field: *const c_char, out: *mut i64) -> bool {
    let (Some(sdk), Some(Ok(structure)), Some(Ok(field))) = (try_sdk(), c_str(structure), c_str(field)) else {
        return false;
    };
    if out.is_null() {
        return false;
    }

    match sdk.offset(structure, field) {
        Ok(offset) => {
            *out = offset;
            true
        }
        Err(_) => false,
    }
}

// Metadata exports - static strings for the host tool to display

#[no_mangle]
pub extern "C" fn srcsdk_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn srcsdk_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn srcsdk_get_license() -> *const c_char {
    LICENSE.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn srcsdk_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

/// Borrow a C string as UTF-8; `None` for null, `Err` for invalid UTF-8
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<Result<&'a str, ()>> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_str().map_err(|_| ()))
}

/// Helper to write error message to C buffer
unsafe fn write_error(error: *mut c_char, maxlen: usize, msg: &str) {
    if error.is_null() || maxlen == 0 {
        return;
    }
    let bytes = msg.as_bytes();
    let len = bytes.len().min(maxlen - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), error as *mut u8, len);
    *error.add(len) = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_truncates() {
        let mut buffer = [0x7Fu8 as c_char; 8];
        unsafe { write_error(buffer.as_mut_ptr(), buffer.len(), "module not loaded") };
        let written = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        assert_eq!(written.to_str(), Ok("module "));

        unsafe { write_error(std::ptr::null_mut(), 8, "ignored") };
    }

    #[test]
    fn test_metadata_is_terminated() {
        for ptr in [
            srcsdk_get_name(),
            srcsdk_get_description(),
            srcsdk_get_license(),
            srcsdk_get_version(),
        ] {
            let value = unsafe { CStr::from_ptr(ptr) };
            assert!(!value.to_bytes().is_empty());
        }
        let version = unsafe { CStr::from_ptr(srcsdk_get_version()) };
        assert_eq!(version.to_str(), Ok(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_lookups_without_attach() {
        let mut out = 0usize;
        let name = c"CreateMove";
        assert!(!unsafe { srcsdk_signature(name.as_ptr(), &mut out) });
        assert!(!unsafe { srcsdk_signature(std::ptr::null(), &mut out) });
        assert!(!srcsdk_detach());
    }
}
