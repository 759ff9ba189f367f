//! Interface version strings for CreateInterface
//!
//! These strings must match exactly what the host exports.

/// Client DLL root interface
pub const CLIENT_DLL: &[u8] = b"VClient018\0";

/// Client entity list
pub const CLIENT_ENTITY_LIST: &[u8] = b"VClientEntityList003\0";

/// Collected interface versions for iteration
pub const INTERFACE_VERSIONS: &[(&str, &[u8])] = &[
    ("ClientDLL", CLIENT_DLL),
    ("ClientEntityList", CLIENT_ENTITY_LIST),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_nul_terminated() {
        for (name, version) in INTERFACE_VERSIONS {
            assert_eq!(version.last(), Some(&0), "{} is not nul-terminated", name);
            assert_eq!(
                version.iter().filter(|&&b| b == 0).count(),
                1,
                "{} has interior nul",
                name
            );
        }
    }
}
