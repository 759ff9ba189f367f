//! Module enumeration

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use srcsdk_sdk::Address;

/// A readable mapped range of a module image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// First byte of the range
    pub start: Address,
    /// Length in bytes
    pub len: usize,
    /// Whether the range is mapped executable
    pub executable: bool,
}

impl Segment {
    /// One past the last byte of the range
    pub fn end(&self) -> Address {
        self.start + self.len
    }

    /// Check whether `address` lies inside the range
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end()
    }
}

/// A loaded module image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// File name, e.g. `client.dll`
    pub name: String,
    /// Full path when the platform reports one
    pub path: String,
    /// Lowest mapped address of the image
    pub base: Address,
    /// Size of the image from `base` to the end of the last segment
    pub size: usize,
    /// Readable ranges; the scanner only walks these
    pub segments: Vec<Segment>,
}

impl ModuleInfo {
    /// Check whether `address` belongs to any readable segment
    pub fn contains(&self, address: Address) -> bool {
        self.segments.iter().any(|segment| segment.contains(address))
    }
}

/// Source of module images and exported symbols
///
/// Lookups return `None` when the module is not loaded; a miss is never an
/// error at this level.
pub trait ModuleSource: Send + Sync {
    /// Find a loaded module by file name (case-insensitive)
    fn module(&self, name: &str) -> Option<ModuleInfo>;

    /// Resolve an exported symbol of a loaded module
    fn export(&self, module: &str, symbol: &str) -> Option<Address>;
}

impl<T: ModuleSource + ?Sized> ModuleSource for Box<T> {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        (**self).module(name)
    }

    fn export(&self, module: &str, symbol: &str) -> Option<Address> {
        (**self).export(module, symbol)
    }
}

impl<T: ModuleSource + ?Sized> ModuleSource for Arc<T> {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        (**self).module(name)
    }

    fn export(&self, module: &str, symbol: &str) -> Option<Address> {
        (**self).export(module, symbol)
    }
}

/// File name component of a module path
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Modules mapped into the current process
///
/// Successful lookups are cached; a module that is not loaded yet is looked
/// up again on the next call.
#[derive(Debug, Default)]
pub struct LoadedModules {
    cache: RwLock<HashMap<String, ModuleInfo>>,
}

impl LoadedModules {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Option<ModuleInfo> {
        let key = name.to_ascii_lowercase();
        if let Some(info) = self.cache.read().get(&key) {
            trace!("module cache hit: {}", name);
            return Some(info.clone());
        }

        let info = find_module(name)?;
        debug!(
            "module {} at {} ({:#x} bytes, {} segments)",
            info.name,
            info.base,
            info.size,
            info.segments.len()
        );
        self.cache.write().insert(key, info.clone());
        Some(info)
    }
}

impl ModuleSource for LoadedModules {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        self.lookup(name)
    }

    fn export(&self, module: &str, symbol: &str) -> Option<Address> {
        let info = self.lookup(module)?;
        find_export(&info, symbol)
    }
}

#[cfg(target_os = "linux")]
use super::linux::{find_export, find_module};

#[cfg(target_os = "windows")]
use super::windows::{find_export, find_module};

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn find_module(_name: &str) -> Option<ModuleInfo> {
    None
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn find_export(_module: &ModuleInfo, _symbol: &str) -> Option<Address> {
    None
}

struct Image {
    name: String,
    bytes: Box<[u8]>,
    exports: HashMap<String, usize>,
    /// (offset, len, executable) ranges; the whole image when empty
    segments: Vec<(usize, usize, bool)>,
}

/// Synthetic module images backed by owned buffers
///
/// Each image is reported as a single executable segment starting at the
/// buffer's heap address, unless split with
/// [`InMemoryModules::with_segment`]. Scan results can be compared against
/// [`InMemoryModules::base_of`].
#[derive(Default)]
pub struct InMemoryModules {
    images: Vec<Image>,
}

impl InMemoryModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image
    ///
    /// When two images share a name the first one registered wins.
    pub fn with_image(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.images.push(Image {
            name: name.into(),
            bytes: bytes.into().into_boxed_slice(),
            exports: HashMap::new(),
            segments: Vec::new(),
        });
        self
    }

    /// Report `len` bytes at `offset` of an image as one segment
    ///
    /// Once any segment is declared only declared ranges are reported, in
    /// declaration order. Ranges past the end of the image are ignored.
    pub fn with_segment(mut self, module: &str, offset: usize, len: usize, executable: bool) -> Self {
        if let Some(image) = self.find_mut(module) {
            if offset.checked_add(len).is_some_and(|end| end <= image.bytes.len()) {
                image.segments.push((offset, len, executable));
            }
        }
        self
    }

    /// Declare an export at `offset` from the image base
    ///
    /// Ignored when no image called `module` exists.
    pub fn with_export(mut self, module: &str, symbol: impl Into<String>, offset: usize) -> Self {
        if let Some(image) = self.find_mut(module) {
            image.exports.insert(symbol.into(), offset);
        }
        self
    }

    /// Base address of an image
    pub fn base_of(&self, name: &str) -> Option<Address> {
        self.find(name).map(|image| Address::from_ptr(image.bytes.as_ptr()))
    }

    fn find(&self, name: &str) -> Option<&Image> {
        self.images
            .iter()
            .find(|image| image.name.eq_ignore_ascii_case(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Image> {
        self.images
            .iter_mut()
            .find(|image| image.name.eq_ignore_ascii_case(name))
    }
}

impl ModuleSource for InMemoryModules {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        let image = self.find(name)?;
        let base = Address::from_ptr(image.bytes.as_ptr());
        Some(ModuleInfo {
            name: image.name.clone(),
            path: image.name.clone(),
            base,
            size: image.bytes.len(),
            segments: if image.segments.is_empty() {
                vec![Segment {
                    start: base,
                    len: image.bytes.len(),
                    executable: true,
                }]
            } else {
                image
                    .segments
                    .iter()
                    .map(|&(offset, len, executable)| Segment {
                        start: base + offset,
                        len,
                        executable,
                    })
                    .collect()
            },
        })
    }

    fn export(&self, module: &str, symbol: &str) -> Option<Address> {
        let image = self.find(module)?;
        let offset = *image.exports.get(symbol)?;
        (offset < image.bytes.len()).then(|| Address::from_ptr(image.bytes.as_ptr()) + offset)
    }
}

impl std::fmt::Debug for InMemoryModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.images.iter().map(|image| (&image.name, image.bytes.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_module() {
        let modules = InMemoryModules::new().with_image("fake.dll", vec![0u8; 256]);

        let info = modules.module("FAKE.DLL").unwrap();
        assert_eq!(info.size, 256);
        assert_eq!(Some(info.base), modules.base_of("fake.dll"));
        assert_eq!(info.segments.len(), 1);
        assert!(info.contains(info.base + 255));
        assert!(!info.contains(info.base + 256));

        assert!(modules.module("missing.dll").is_none());
    }

    #[test]
    fn test_in_memory_exports() {
        let modules = InMemoryModules::new()
            .with_image("engine.dll", vec![0u8; 64])
            .with_export("engine.dll", "CreateInterface", 16)
            .with_export("engine.dll", "OutOfImage", 64)
            .with_export("absent.dll", "Ignored", 0);

        let base = modules.base_of("engine.dll").unwrap();
        assert_eq!(modules.export("engine.dll", "CreateInterface"), Some(base + 16));
        assert_eq!(modules.export("engine.dll", "OutOfImage"), None);
        assert_eq!(modules.export("engine.dll", "Missing"), None);
        assert_eq!(modules.export("absent.dll", "Ignored"), None);
    }

    #[test]
    fn test_declared_segments() {
        let modules = InMemoryModules::new()
            .with_image("client.so", vec![0u8; 256])
            .with_segment("client.so", 128, 128, true)
            .with_segment("client.so", 0, 128, false)
            .with_segment("client.so", 200, 100, false);

        let base = modules.base_of("client.so").unwrap();
        let info = modules.module("client.so").unwrap();
        assert_eq!(
            info.segments,
            vec![
                Segment { start: base + 128, len: 128, executable: true },
                Segment { start: base, len: 128, executable: false },
            ]
        );
        assert_eq!(info.size, 256);
    }

    #[test]
    fn test_boxed_source() {
        let boxed: Box<dyn ModuleSource> =
            Box::new(InMemoryModules::new().with_image("a.so", vec![1, 2, 3]));
        assert_eq!(boxed.module("a.so").map(|m| m.size), Some(3));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/usr/lib/libc.so.6"), "libc.so.6");
        assert_eq!(file_name(r"C:\game\bin\client.dll"), "client.dll");
        assert_eq!(file_name("client.so"), "client.so");
    }

    #[test]
    fn test_loaded_modules_miss_is_not_cached() {
        let modules = LoadedModules::new();
        assert!(modules.module("definitely-not-loaded-srcsdk.so").is_none());
        assert!(modules.cache.read().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_loaded_modules_finds_libc() {
        let modules = LoadedModules::new();
        let Some(libc) = modules.module("libc.so.6") else {
            // musl or static builds have no separate libc image
            return;
        };

        assert!(!libc.segments.is_empty());
        assert!(libc.segments.iter().any(|segment| segment.executable));

        let strlen = modules.export("libc.so.6", "strlen").unwrap();
        assert!(strlen >= libc.base);
    }
}
