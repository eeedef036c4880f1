//! Shared-secret verification for the inbound Telegram webhook.

/// Compare a provided secret token against the expected one in constant
/// time.
///
/// The byte loop touches the full length even after a mismatch, so
/// response timing does not reveal how much of a guess matched. Length
/// differs means wrong secret; the configured token has a fixed length,
/// so the early return leaks nothing useful.
pub fn verify_secret(provided: &str, expected: &str) -> bool {
    constant_time_eq(provided.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_verify() {
        assert!(verify_secret("s3cret-token", "s3cret-token"));
    }

    #[test]
    fn same_length_mismatch_is_rejected() {
        assert!(!verify_secret("s3cret-tokex", "s3cret-token"));
        assert!(!verify_secret("x3cret-token", "s3cret-token"));
    }

    #[test]
    fn different_length_is_rejected() {
        assert!(!verify_secret("s3cret", "s3cret-token"));
        assert!(!verify_secret("", "s3cret-token"));
    }
}
