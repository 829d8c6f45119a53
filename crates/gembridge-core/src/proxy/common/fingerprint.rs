use sha2::{Digest, Sha256};

/// Short stable digest of a credential, safe for logs and cache keys.
pub fn credential_fingerprint(credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = credential_fingerprint("AIza-secret");
        assert_eq!(a.len(), 16);
        assert_eq!(a, credential_fingerprint("AIza-secret"));
        assert_ne!(a, credential_fingerprint("AIza-other"));
        assert!(!a.contains("secret"));
    }
}
