//! Byte signature scanning
//!
//! A [`Pattern`] is a sequence of bytes where any position may be a wildcard.
//! [`find_pattern`] is the pure search over a byte slice; [`Scanner`] walks
//! the readable segments of a module obtained from a [`ModuleSource`].
//!
//! Scans are bounded by the module's segment sizes and report the first
//! match in address order. Callers cache the result, so the linear cost is paid once per
//! signature.

use std::fmt;
use std::str::FromStr;

use memchr::memmem::Finder;
use thiserror::Error;
use tracing::{debug, trace};

use srcsdk_sdk::Address;

use crate::memory::{ModuleInfo, ModuleSource, Segment};

/// Errors from parsing pattern text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Empty signature pattern")]
    Empty,

    #[error("Invalid hex byte: {0}")]
    InvalidByte(String),

    #[error("Pattern has no concrete bytes")]
    AllWildcards,

    #[error("Mask length {mask} does not match {bytes} pattern bytes")]
    MaskLength { bytes: usize, mask: usize },
}

/// A byte signature with wildcards
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    bytes: Vec<Option<u8>>,
}

impl Pattern {
    /// Parse IDA-style text
    ///
    /// Supports:
    /// - Hex bytes: "55 48 89 E5"
    /// - Wildcards: "55 ? 89 E5", "55 ?? 89 E5" or "55 * 89 E5"
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let bytes = text
            .split_whitespace()
            .map(|part| match part {
                "?" | "??" | "*" => Ok(None),
                _ if part.len() <= 2 => u8::from_str_radix(part, 16)
                    .map(Some)
                    .map_err(|_| PatternError::InvalidByte(part.to_string())),
                _ => Err(PatternError::InvalidByte(part.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_parts(bytes)
    }

    /// Build from code-style bytes plus mask, `x` for a fixed byte and `?`
    /// for a wildcard
    pub fn from_mask(bytes: &[u8], mask: &str) -> Result<Self, PatternError> {
        if bytes.len() != mask.len() {
            return Err(PatternError::MaskLength {
                bytes: bytes.len(),
                mask: mask.len(),
            });
        }

        let bytes = bytes
            .iter()
            .zip(mask.bytes())
            .map(|(byte, m)| (m != b'?').then_some(*byte))
            .collect();

        Self::from_parts(bytes)
    }

    /// An exact byte sequence
    pub fn exact(bytes: &[u8]) -> Result<Self, PatternError> {
        Self::from_parts(bytes.iter().copied().map(Some).collect())
    }

    fn from_parts(bytes: Vec<Option<u8>>) -> Result<Self, PatternError> {
        if bytes.is_empty() {
            return Err(PatternError::Empty);
        }
        if bytes.iter().all(Option::is_none) {
            return Err(PatternError::AllWildcards);
        }
        Ok(Self { bytes })
    }

    /// Number of positions, wildcards included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty patterns are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The positions, `None` for wildcards
    pub fn bytes(&self) -> &[Option<u8>] {
        &self.bytes
    }

    /// Number of wildcard positions
    pub fn wildcards(&self) -> usize {
        self.bytes.iter().filter(|b| b.is_none()).count()
    }

    /// Check the pattern against a window of exactly `len()` bytes
    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.bytes.len()
            && self
                .bytes
                .iter()
                .zip(window)
                .all(|(expected, actual)| expected.map_or(true, |b| b == *actual))
    }

    /// Longest run of concrete bytes, as (position, length)
    ///
    /// Earliest run wins a tie. Construction guarantees at least one
    /// concrete byte, so the length is never zero for a parsed pattern.
    fn anchor(&self) -> (usize, usize) {
        let mut best = (0, 0);
        let mut run_start = 0;
        for (i, byte) in self.bytes.iter().enumerate() {
            if byte.is_none() {
                run_start = i + 1;
                continue;
            }
            let run_len = i + 1 - run_start;
            if run_len > best.1 {
                best = (run_start, run_len);
            }
        }
        best
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match byte {
                Some(b) => write!(f, "{:02X}", b)?,
                None => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

/// Offset of the first match of `pattern` in `haystack`
pub fn find_pattern(haystack: &[u8], pattern: &Pattern) -> Option<usize> {
    Matches::new(haystack, pattern).next()
}

/// Offsets of every match of `pattern` in `haystack`, overlapping included
pub fn find_all(haystack: &[u8], pattern: &Pattern) -> Vec<usize> {
    Matches::new(haystack, pattern).collect()
}

/// Matches in ascending offset order
///
/// The longest concrete run of the pattern is located with `memmem` and the
/// full pattern is verified around each hit. Every anchor position is
/// tried, so overlapping matches are all reported.
struct Matches<'h, 'p> {
    haystack: &'h [u8],
    pattern: &'p Pattern,
    finder: Finder<'static>,
    anchor: usize,
    pos: usize,
}

impl<'h, 'p> Matches<'h, 'p> {
    fn new(haystack: &'h [u8], pattern: &'p Pattern) -> Self {
        let (anchor, run) = pattern.anchor();
        let needle: Vec<u8> = pattern.bytes[anchor..anchor + run]
            .iter()
            .flatten()
            .copied()
            .collect();

        Self {
            haystack,
            pattern,
            finder: Finder::new(&needle).into_owned(),
            anchor,
            pos: 0,
        }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let len = self.pattern.len();
        let last = self.haystack.len().checked_sub(len)?;
        let run = self.finder.needle().len();

        while self.pos <= last {
            // Anchor hits whose pattern start falls in [pos, last]
            let region = &self.haystack[self.pos + self.anchor..last + self.anchor + run];
            let candidate = self.pos + self.finder.find(region)?;
            self.pos = candidate + 1;
            if self.pattern.matches(&self.haystack[candidate..candidate + len]) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Order in which a module's segments are searched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOrder {
    /// Lowest address first; the first match in the image wins
    #[default]
    Address,
    /// Executable segments first, each group in address order
    CodeFirst,
}

/// Signature scanner over the modules of a [`ModuleSource`]
#[derive(Debug)]
pub struct Scanner<M> {
    modules: M,
}

impl<M: ModuleSource> Scanner<M> {
    pub fn new(modules: M) -> Self {
        Self { modules }
    }

    /// The module source this scanner reads from
    pub fn modules(&self) -> &M {
        &self.modules
    }

    /// First match of `pattern` in the named module
    ///
    /// `None` when the module is not loaded or the pattern does not occur.
    pub fn scan(&self, module: &str, pattern: &Pattern) -> Option<Address> {
        let info = self.modules.module(module)?;
        scan_module(&info, pattern)
    }

    /// Every match of `pattern` in the named module, in address order
    pub fn scan_all(&self, module: &str, pattern: &Pattern) -> Vec<Address> {
        let Some(info) = self.modules.module(module) else {
            return Vec::new();
        };

        let mut segments: Vec<&Segment> = info.segments.iter().collect();
        segments.sort_by_key(|segment| segment.start);

        segments
            .into_iter()
            .flat_map(|segment| {
                let bytes = unsafe { segment_bytes(segment.start, segment.len) };
                find_all(bytes, pattern)
                    .into_iter()
                    .map(move |offset| segment.start + offset)
            })
            .collect()
    }

    /// Address of an exported symbol
    pub fn resolve_export(&self, module: &str, symbol: &str) -> Option<Address> {
        let address = self.modules.export(module, symbol);
        trace!("export {}!{} = {:?}", module, symbol, address);
        address
    }
}

/// First match of `pattern` in an already-enumerated module, lowest address
/// first
pub fn scan_module(info: &ModuleInfo, pattern: &Pattern) -> Option<Address> {
    scan_module_ordered(info, pattern, ScanOrder::Address)
}

/// First match of `pattern` in an already-enumerated module, visiting
/// segments in `order`
pub fn scan_module_ordered(info: &ModuleInfo, pattern: &Pattern, order: ScanOrder) -> Option<Address> {
    let mut segments: Vec<&Segment> = info.segments.iter().collect();
    match order {
        ScanOrder::Address => segments.sort_by_key(|segment| segment.start),
        ScanOrder::CodeFirst => segments.sort_by_key(|segment| (!segment.executable, segment.start)),
    }

    for segment in segments {
        let bytes = unsafe { segment_bytes(segment.start, segment.len) };
        if let Some(offset) = find_pattern(bytes, pattern) {
            let address = segment.start + offset;
            debug!("pattern [{}] matched in {} at {}", pattern, info.name, address);
            return Some(address);
        }
    }

    trace!("pattern [{}] not found in {}", pattern, info.name);
    None
}

/// # Safety
/// The range must be mapped readable for the duration of the borrow; module
/// sources only report readable segments of loaded images.
unsafe fn segment_bytes<'a>(start: Address, len: usize) -> &'a [u8] {
    if start.is_null() || len == 0 {
        return &[];
    }
    std::slice::from_raw_parts(start.as_ptr::<u8>(), len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryModules;

    #[test]
    fn test_parse_pattern() {
        let pattern = Pattern::parse("55 48 89 E5").unwrap();
        assert_eq!(
            pattern.bytes(),
            &[Some(0x55), Some(0x48), Some(0x89), Some(0xE5)]
        );

        let pattern: Pattern = "AA BB * DD ?? ?".parse().unwrap();
        assert_eq!(
            pattern.bytes(),
            &[Some(0xAA), Some(0xBB), None, Some(0xDD), None, None]
        );
        assert_eq!(pattern.wildcards(), 3);
        assert_eq!(pattern.to_string(), "AA BB ? DD ? ?");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Pattern::parse(""), Err(PatternError::Empty));
        assert_eq!(Pattern::parse("? ?? *"), Err(PatternError::AllWildcards));
        assert_eq!(
            Pattern::parse("55 GG"),
            Err(PatternError::InvalidByte("GG".into()))
        );
        assert_eq!(
            Pattern::parse("5548"),
            Err(PatternError::InvalidByte("5548".into()))
        );
    }

    #[test]
    fn test_from_mask() {
        let pattern = Pattern::from_mask(b"\x8B\x0D\x00\x00\x00\x00\xFF", "xx????x").unwrap();
        assert_eq!(pattern.to_string(), "8B 0D ? ? ? ? FF");

        assert_eq!(
            Pattern::from_mask(b"\x8B\x0D", "x"),
            Err(PatternError::MaskLength { bytes: 2, mask: 1 })
        );
    }

    #[test]
    fn test_find_exact() {
        let data = [0x00, 0x55, 0x48, 0x89, 0xE5, 0x00];
        let pattern = Pattern::parse("55 48 89 E5").unwrap();
        assert_eq!(find_pattern(&data, &pattern), Some(1));
    }

    #[test]
    fn test_wildcards_match_any_byte() {
        let pattern = Pattern::parse("AA BB ? DD").unwrap();
        for filler in [0x00u8, 0x7F, 0xAA, 0xDD, 0xFF] {
            let mut data = vec![0x11u8; 64];
            data[40..44].copy_from_slice(&[0xAA, 0xBB, filler, 0xDD]);
            assert_eq!(find_pattern(&data, &pattern), Some(40), "filler {:#x}", filler);
        }
    }

    #[test]
    fn test_leading_wildcard() {
        let data = [0xAA, 0x01, 0xBB, 0x02, 0xBB];
        let pattern = Pattern::parse("? BB").unwrap();
        assert_eq!(find_pattern(&data, &pattern), Some(1));
        assert_eq!(find_all(&data, &pattern), vec![1, 3]);

        // The anchor byte at the very start cannot be a match without room
        // for the wildcard before it
        let pattern = Pattern::parse("? AA").unwrap();
        assert_eq!(find_pattern(&data, &pattern), None);
    }

    #[test]
    fn test_absent_pattern_is_empty() {
        let data: Vec<u8> = (0..=255u8).collect();
        let pattern = Pattern::parse("FF 00").unwrap();
        assert_eq!(find_pattern(&data, &pattern), None);

        let pattern = Pattern::parse("01 02 03").unwrap();
        assert_eq!(find_pattern(&data[..3], &pattern), None);
        assert_eq!(find_pattern(&[], &pattern), None);
    }

    #[test]
    fn test_first_match_wins() {
        let data = [0xCC, 0x90, 0xCC, 0x90, 0xCC];
        let pattern = Pattern::parse("CC 90").unwrap();
        assert_eq!(find_pattern(&data, &pattern), Some(0));
        assert_eq!(find_all(&data, &pattern), vec![0, 2]);
    }

    #[test]
    fn test_scan_synthetic_module() {
        let mut image = vec![0u8; 256];
        image[100..104].copy_from_slice(&[0xAA, 0xBB, 0x5A, 0xDD]);

        let scanner = Scanner::new(InMemoryModules::new().with_image("fake.dll", image));
        let base = scanner.modules().base_of("fake.dll").unwrap();
        let pattern = Pattern::parse("AA BB * DD").unwrap();

        assert_eq!(scanner.scan("fake.dll", &pattern), Some(base + 100));
        assert_eq!(scanner.scan_all("fake.dll", &pattern), vec![base + 100]);
        assert_eq!(scanner.scan("other.dll", &pattern), None);
        assert!(scanner.scan_all("other.dll", &pattern).is_empty());
    }

    #[test]
    fn test_overlapping_anchor_hits() {
        // The anchor run "CC CC" overlaps itself; every start is tried
        let data = [0xCC, 0xCC, 0xCC, 0x90];
        let pattern = Pattern::parse("CC CC 90").unwrap();
        assert_eq!(find_pattern(&data, &pattern), Some(1));

        let pattern = Pattern::parse("CC CC").unwrap();
        assert_eq!(find_all(&data, &pattern), vec![0, 1]);
    }

    #[test]
    fn test_longest_run_anchors_the_search() {
        let pattern = Pattern::parse("E8 ? ? ? ? 48 8B 05 ? 90").unwrap();
        assert_eq!(pattern.anchor(), (5, 3));
        assert_eq!(Pattern::parse("? AA").unwrap().anchor(), (1, 1));

        let mut data = vec![0x48u8; 64];
        data[30..40].copy_from_slice(&[0xE8, 1, 2, 3, 4, 0x48, 0x8B, 0x05, 0x77, 0x90]);
        // A decoy anchor run without the surrounding bytes
        data[10..13].copy_from_slice(&[0x48, 0x8B, 0x05]);
        assert_eq!(find_pattern(&data, &pattern), Some(30));
    }

    fn split_image() -> (Scanner<InMemoryModules>, Address) {
        // Read-only data in [0, 128), code in [128, 256)
        let mut image = vec![0u8; 256];
        image[10..14].copy_from_slice(&[0xAA, 0xBB, 0x01, 0xDD]);
        image[200..204].copy_from_slice(&[0xAA, 0xBB, 0x02, 0xDD]);

        let modules = InMemoryModules::new()
            .with_image("client.so", image)
            .with_segment("client.so", 128, 128, true)
            .with_segment("client.so", 0, 128, false);
        let base = modules.base_of("client.so").unwrap();
        (Scanner::new(modules), base)
    }

    #[test]
    fn test_segments_scanned_in_address_order() {
        let (scanner, base) = split_image();
        let pattern = Pattern::parse("AA BB ? DD").unwrap();

        assert_eq!(scanner.scan("client.so", &pattern), Some(base + 10));
        assert_eq!(
            scanner.scan_all("client.so", &pattern),
            vec![base + 10, base + 200]
        );
    }

    #[test]
    fn test_code_first_order() {
        let (scanner, base) = split_image();
        let pattern = Pattern::parse("AA BB ? DD").unwrap();
        let info = scanner.modules().module("client.so").unwrap();

        assert_eq!(
            scan_module_ordered(&info, &pattern, ScanOrder::CodeFirst),
            Some(base + 200)
        );
        assert_eq!(
            scan_module_ordered(&info, &pattern, ScanOrder::Address),
            Some(base + 10)
        );
    }

    #[test]
    fn test_resolve_export() {
        let scanner = Scanner::new(
            InMemoryModules::new()
                .with_image("client.so", vec![0u8; 32])
                .with_export("client.so", "CreateInterface", 8),
        );
        let base = scanner.modules().base_of("client.so").unwrap();

        assert_eq!(
            scanner.resolve_export("client.so", "CreateInterface"),
            Some(base + 8)
        );
        assert_eq!(scanner.resolve_export("client.so", "Missing"), None);
    }
}
