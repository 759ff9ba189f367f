//! FNV-1a hashing for netvar cache keys
//!
//! Netvar lookups are bucketed by (table, path). Hashing both names into one
//! `u64` lets lookups find their bucket without allocating; the bucket still
//! compares the full names.

/// FNV-1a 32-bit hash (compile-time capable)
pub const fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
    const FNV_PRIME: u32 = 0x01000193;

    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < data.len() {
        hash ^= data[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Table hash in the high half, path hash in the low half
pub const fn netvar_key(table: &[u8], path: &[u8]) -> u64 {
    ((fnv1a_32(table) as u64) << 32) | (fnv1a_32(path) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_netvar_key_unique() {
        let a = netvar_key(b"DT_BasePlayer", b"m_iHealth");
        let b = netvar_key(b"DT_BasePlayer", b"m_lifeState");
        let c = netvar_key(b"DT_BaseEntity", b"m_iHealth");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a >> 32, fnv1a_32(b"DT_BasePlayer") as u64);
    }

    #[test]
    fn test_const_evaluation() {
        const KEY: u64 = netvar_key(b"DT_BasePlayer", b"m_iHealth");
        assert_eq!(KEY, netvar_key(b"DT_BasePlayer", b"m_iHealth"));
    }
}
