//! Client fingerprint derivation.

use sha2::{Digest, Sha256};

/// Derive the fingerprint binding a token pair to a requesting client:
/// the client IP joined with the first 16 hex chars of the user-agent hash.
pub fn client_fingerprint(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{ip}:{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_format() {
        let fp = client_fingerprint("1.2.3.4", "Mozilla/5.0");
        let (ip, hash) = fp.split_once(':').unwrap_or(("", ""));
        assert_eq!(ip, "1.2.3.4");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(
            client_fingerprint("1.2.3.4", "curl/8.0"),
            client_fingerprint("1.2.3.4", "curl/8.0")
        );
    }

    #[test]
    fn fingerprint_varies_with_client() {
        let base = client_fingerprint("1.2.3.4", "curl/8.0");
        assert_ne!(base, client_fingerprint("1.2.3.5", "curl/8.0"));
        assert_ne!(base, client_fingerprint("1.2.3.4", "curl/8.1"));
    }
}
