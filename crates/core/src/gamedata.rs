//! Gamedata: signatures and offsets loaded from JSON
//!
//! Signatures and structure offsets change with every host update, so they
//! live in a gamedata.json file deployed next to the SDK instead of in code.
//!
//! ```json
//! {
//!   "signatures": {
//!     "PlayerResource": {
//!       "library": "client",
//!       "windows": "48 8B 05 ? ? ? ? 48 85 C0",
//!       "linux": "48 8B 05 ? ? ? ? 48 85 C0",
//!       "offset": 3, "relative": true, "dereference": 1
//!     },
//!     "GetAllClasses": {
//!       "library": "client",
//!       "linux": "55 48 89 E5 48 8B 05", "code_first": true
//!     }
//!   },
//!   "offsets": {
//!     "Player": { "Health": 4, "Team": { "windows": 132, "linux": 136 } }
//!   }
//! }
//! ```
//!
//! Only the current platform's pattern is kept. An entry without a value for
//! this platform is absent, the same as an entry that was never written.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use srcsdk_sdk::Address;

use crate::error::ResolveError;
use crate::scanner::{Pattern, PatternError, ScanOrder};

/// Errors that can occur when loading gamedata
#[derive(Debug, Error)]
pub enum GamedataError {
    #[error("Failed to read gamedata file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse gamedata JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid signature {name}: {source}")]
    InvalidSignature {
        name: String,
        #[source]
        source: PatternError,
    },
}

/// Signature entry as written in the file
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureEntry {
    /// Logical library to scan (e.g., "client", "engine")
    #[serde(default = "default_library")]
    pub library: String,
    /// Windows signature pattern
    pub windows: Option<String>,
    /// Linux signature pattern
    pub linux: Option<String>,
    /// Added to the match address before anything else
    #[serde(default)]
    pub offset: i64,
    /// Treat the 32-bit value at the adjusted address as a displacement
    /// relative to the end of that value
    #[serde(default)]
    pub relative: bool,
    /// Number of pointer dereferences after the relative step
    #[serde(default)]
    pub dereference: u32,
    /// Added after dereferencing
    #[serde(default)]
    pub extra: i64,
    /// Search executable segments before data segments
    #[serde(default)]
    pub code_first: bool,
}

fn default_library() -> String {
    "client".to_string()
}

impl SignatureEntry {
    /// Pattern text for the current platform
    pub fn pattern_text(&self) -> Option<&str> {
        #[cfg(target_os = "linux")]
        let sig = self.linux.as_deref();

        #[cfg(target_os = "windows")]
        let sig = self.windows.as_deref();

        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        let sig: Option<&str> = None;

        sig
    }
}

/// Offset entry: a plain number or per-platform values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OffsetValue {
    Plain(i64),
    PerPlatform {
        windows: Option<i64>,
        linux: Option<i64>,
    },
}

impl OffsetValue {
    /// Value for the current platform
    pub fn current(&self) -> Option<i64> {
        match *self {
            OffsetValue::Plain(value) => Some(value),
            OffsetValue::PerPlatform { windows, linux } => {
                if cfg!(target_os = "windows") {
                    windows
                } else if cfg!(target_os = "linux") {
                    linux
                } else {
                    None
                }
            }
        }
    }
}

/// A signature ready to scan on this platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub library: String,
    pub pattern: Pattern,
    pub offset: i64,
    pub relative: bool,
    pub dereference: u32,
    pub extra: i64,
    pub order: ScanOrder,
}

impl Signature {
    /// A signature that returns the match address unchanged
    pub fn new(library: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            library: library.into(),
            pattern,
            offset: 0,
            relative: false,
            dereference: 0,
            extra: 0,
            order: ScanOrder::Address,
        }
    }

    /// Turn a match address into the address the signature names
    ///
    /// Steps, in order: add `offset`; if `relative`, follow the 32-bit
    /// displacement stored there; dereference `dereference` times; add
    /// `extra`. A null pointer anywhere in the dereference chain is an error,
    /// never a result.
    ///
    /// # Safety
    /// `hit` must be a match inside a readable module image, and every
    /// pointer the chain reads must be readable.
    pub unsafe fn resolve(&self, name: &str, hit: Address) -> Result<Address, ResolveError> {
        let mut address = hit.offset(self.offset as isize);

        if self.relative {
            let displacement = address.read::<i32>(0);
            address = address.offset(4 + displacement as isize);
        }

        for _ in 0..self.dereference {
            address = address
                .deref()
                .non_null()
                .ok_or_else(|| ResolveError::NullPointer(name.to_string()))?;
        }

        Ok(address.offset(self.extra as isize))
    }
}

/// Query contract for structure offsets
///
/// An absent key is `None`, never zero: zero is a legitimate offset.
pub trait OffsetTable: Send + Sync {
    fn offset(&self, structure: &str, field: &str) -> Option<i64>;
}

impl OffsetTable for HashMap<(String, String), i64> {
    fn offset(&self, structure: &str, field: &str) -> Option<i64> {
        self.get(&(structure.to_string(), field.to_string())).copied()
    }
}

impl<T: OffsetTable + ?Sized> OffsetTable for Arc<T> {
    fn offset(&self, structure: &str, field: &str) -> Option<i64> {
        (**self).offset(structure, field)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawGamedata {
    #[serde(default)]
    signatures: HashMap<String, SignatureEntry>,
    #[serde(default)]
    offsets: HashMap<String, HashMap<String, OffsetValue>>,
}

/// Loaded gamedata
#[derive(Debug, Clone, Default)]
pub struct Gamedata {
    signatures: HashMap<String, Signature>,
    offsets: HashMap<String, HashMap<String, i64>>,
}

impl Gamedata {
    /// Empty gamedata; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// Load gamedata from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, GamedataError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    /// Load gamedata from a JSON string
    ///
    /// Patterns for the current platform are parsed here, so a malformed
    /// signature fails the load instead of the first scan.
    pub fn load_from_str(json: &str) -> Result<Self, GamedataError> {
        let raw: RawGamedata = serde_json::from_str(json)?;
        let mut gamedata = Gamedata::default();

        for (name, entry) in raw.signatures {
            let Some(text) = entry.pattern_text() else {
                debug!("signature {} has no pattern for this platform", name);
                continue;
            };
            let pattern = Pattern::parse(text).map_err(|source| GamedataError::InvalidSignature {
                name: name.clone(),
                source,
            })?;

            gamedata.signatures.insert(
                name,
                Signature {
                    library: entry.library,
                    pattern,
                    offset: entry.offset,
                    relative: entry.relative,
                    dereference: entry.dereference,
                    extra: entry.extra,
                    order: if entry.code_first {
                        ScanOrder::CodeFirst
                    } else {
                        ScanOrder::Address
                    },
                },
            );
        }

        for (structure, fields) in raw.offsets {
            let fields: HashMap<String, i64> = fields
                .into_iter()
                .filter_map(|(field, value)| value.current().map(|v| (field, v)))
                .collect();
            gamedata.offsets.insert(structure, fields);
        }

        info!(
            "Loaded gamedata: {} signatures, {} offsets",
            gamedata.signatures.len(),
            gamedata.offset_count()
        );

        Ok(gamedata)
    }

    /// Get a signature by name
    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    /// Get an offset by structure and field
    pub fn offset(&self, structure: &str, field: &str) -> Option<i64> {
        self.offsets.get(structure)?.get(field).copied()
    }

    /// Add or replace a signature
    pub fn insert_signature(&mut self, name: impl Into<String>, signature: Signature) {
        self.signatures.insert(name.into(), signature);
    }

    /// Add or replace an offset
    pub fn insert_offset(
        &mut self,
        structure: impl Into<String>,
        field: impl Into<String>,
        value: i64,
    ) {
        self.offsets
            .entry(structure.into())
            .or_default()
            .insert(field.into(), value);
    }

    /// Names of all signatures, sorted
    pub fn signature_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.signatures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of offsets across all structures
    pub fn offset_count(&self) -> usize {
        self.offsets.values().map(HashMap::len).sum()
    }
}

impl OffsetTable for Gamedata {
    fn offset(&self, structure: &str, field: &str) -> Option<i64> {
        Gamedata::offset(self, structure, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAMEDATA: &str = r#"{
        "signatures": {
            "PlayerResource": {
                "library": "client",
                "linux": "48 8B 05 ? ? ? ? 48 85 C0",
                "windows": "48 8B 05 ? ? ? ? 48 85 C0",
                "offset": 3,
                "relative": true,
                "dereference": 1
            },
            "LinuxOnly": { "linux": "55 48 89 E5", "code_first": true },
            "WindowsOnly": { "windows": "40 53 48 83 EC 20" }
        },
        "offsets": {
            "Player": { "Health": 4, "Team": 132, "Zero": 0 },
            "IBaseClientDLL": { "GetAllClasses": { "windows": 8, "linux": 9 } },
            "IPhysicsObject": { "WindowsOnly": { "windows": 80 } }
        }
    }"#;

    #[test]
    fn test_offsets() {
        let gd = Gamedata::load_from_str(GAMEDATA).unwrap();

        assert_eq!(gd.offset("Player", "Health"), Some(4));
        assert_eq!(gd.offset("Player", "Team"), Some(132));
        assert_eq!(gd.offset("Player", "Score"), None);
        assert_eq!(gd.offset("Weapon", "Clip"), None);

        // Present-with-zero is distinct from absent
        assert_eq!(gd.offset("Player", "Zero"), Some(0));

        #[cfg(target_os = "linux")]
        {
            assert_eq!(gd.offset("IBaseClientDLL", "GetAllClasses"), Some(9));
            assert_eq!(gd.offset("IPhysicsObject", "WindowsOnly"), None);
        }
        #[cfg(target_os = "windows")]
        assert_eq!(gd.offset("IBaseClientDLL", "GetAllClasses"), Some(8));
    }

    #[test]
    fn test_offsets_deterministic() {
        let gd = Gamedata::load_from_str(GAMEDATA).unwrap();
        let first = gd.offset("Player", "Health");
        for _ in 0..8 {
            assert_eq!(gd.offset("Player", "Health"), first);
        }
    }

    #[test]
    fn test_map_offset_table() {
        let mut table: HashMap<(String, String), i64> = HashMap::new();
        table.insert(("Player".into(), "Health".into()), 4);
        table.insert(("Player".into(), "Team".into()), 132);
        table.insert(("Weapon".into(), "Owner".into()), 0);

        let table: &dyn OffsetTable = &table;
        assert_eq!(table.offset("Player", "Health"), Some(4));
        assert_eq!(table.offset("Player", "Team"), Some(132));
        assert_eq!(table.offset("Player", "Score"), None);
        assert_eq!(table.offset("Weapon", "Owner"), Some(0));
    }

    #[test]
    fn test_signatures_for_platform() {
        let gd = Gamedata::load_from_str(GAMEDATA).unwrap();

        let sig = gd.signature("PlayerResource").unwrap();
        assert_eq!(sig.library, "client");
        assert_eq!(sig.offset, 3);
        assert!(sig.relative);
        assert_eq!(sig.dereference, 1);
        assert_eq!(sig.pattern.to_string(), "48 8B 05 ? ? ? ? 48 85 C0");
        assert_eq!(sig.order, ScanOrder::Address);

        #[cfg(target_os = "linux")]
        {
            assert_eq!(gd.signature("LinuxOnly").map(|s| s.order), Some(ScanOrder::CodeFirst));
            assert!(gd.signature("WindowsOnly").is_none());
            assert_eq!(gd.signature_names(), vec!["LinuxOnly", "PlayerResource"]);
        }
    }

    #[test]
    fn test_invalid_signature_fails_load() {
        let json = r#"{ "signatures": { "Broken": { "linux": "55 XX", "windows": "55 XX" } } }"#;
        let err = Gamedata::load_from_str(json).unwrap_err();
        assert!(matches!(err, GamedataError::InvalidSignature { ref name, .. } if name == "Broken"));
    }

    #[test]
    fn test_empty_and_malformed_documents() {
        let gd = Gamedata::load_from_str("{}").unwrap();
        assert!(gd.signature_names().is_empty());
        assert_eq!(gd.offset_count(), 0);

        assert!(matches!(
            Gamedata::load_from_str("not json"),
            Err(GamedataError::ParseError(_))
        ));
    }

    #[test]
    fn test_resolve_relative_and_deref() {
        // Layout: [0..3] opcode, [3..7] disp32, [7..15] pointer slot
        #[repr(C, align(8))]
        struct Code {
            bytes: [u8; 16],
        }

        let target: u64 = 0xDEAD;
        let mut code = Code { bytes: [0; 16] };
        code.bytes[..3].copy_from_slice(&[0x48, 0x8B, 0x05]);
        code.bytes[3..7].copy_from_slice(&1i32.to_le_bytes());
        let slot = &target as *const u64 as usize;
        code.bytes[8..16].copy_from_slice(&slot.to_le_bytes());

        let hit = Address::from_ptr(code.bytes.as_ptr());
        let sig = Signature {
            offset: 3,
            relative: true,
            dereference: 0,
            ..Signature::new("client", Pattern::parse("48 8B 05").unwrap())
        };

        // 3 + 4 + 1 lands on the pointer slot at byte 8
        let resolved = unsafe { sig.resolve("Test", hit) }.unwrap();
        assert_eq!(resolved, hit + 8);

        let sig = Signature {
            dereference: 1,
            extra: 2,
            ..sig
        };
        let resolved = unsafe { sig.resolve("Test", hit) }.unwrap();
        assert_eq!(resolved, Address::new(slot + 2));
    }

    #[test]
    fn test_resolve_null_chain_is_error() {
        let null_slot: usize = 0;
        let hit = Address::from_ptr(&null_slot as *const usize);
        let sig = Signature {
            dereference: 1,
            ..Signature::new("client", Pattern::parse("00").unwrap())
        };

        assert_eq!(
            unsafe { sig.resolve("Missing", hit) },
            Err(ResolveError::NullPointer("Missing".into()))
        );
    }
}
