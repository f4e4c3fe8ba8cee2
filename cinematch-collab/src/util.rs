use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Length of the session tokens handed out to participants
pub const SESSION_LENGTH: usize = 32;

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Returns true if the token could have been issued as a session.
/// Accepts uuid-style tokens too, since clients may carry one over from elsewhere.
pub fn is_valid_session(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 128
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_is_a_valid_session() {
        let token = random_string(SESSION_LENGTH);

        assert_eq!(token.len(), SESSION_LENGTH);
        assert!(is_valid_session(&token));
    }

    #[test]
    fn test_session_validation() {
        assert!(is_valid_session("4f1c2b1e-8a9d-4c1b-9d62-0f3a6f1e7b10"));
        assert!(!is_valid_session(""));
        assert!(!is_valid_session("abc; Path=/"));
        assert!(!is_valid_session(&"a".repeat(129)));
    }
}
