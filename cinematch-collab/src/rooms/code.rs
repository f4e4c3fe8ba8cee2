use std::fmt::Display;

use rand::Rng;

use super::RoomError;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A four character room code. Always stored upper-case, so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(String);

impl RoomCode {
    pub const LENGTH: usize = 4;
    /// How many distinct codes exist
    pub const SPACE: usize = ALPHABET.len().pow(Self::LENGTH as u32);

    /// Normalizes and validates a code supplied by a client.
    ///
    /// An empty code is invalid input. Anything else that isn't a well-formed code
    /// can never name a room, so it is reported as not found.
    pub fn parse(input: &str) -> Result<Self, RoomError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(RoomError::InvalidInput("room code is empty".to_string()));
        }

        let is_well_formed =
            trimmed.len() == Self::LENGTH && trimmed.chars().all(|c| c.is_ascii_alphanumeric());

        if !is_well_formed {
            return Err(RoomError::not_found("room", trimmed));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let code = (0..Self::LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower = RoomCode::parse("ab12").unwrap();
        let upper = RoomCode::parse(" AB12 ").unwrap();

        assert_eq!(lower, upper);
        assert_eq!(lower.as_str(), "AB12");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        assert!(matches!(
            RoomCode::parse("   "),
            Err(RoomError::InvalidInput(_))
        ));
        assert!(matches!(
            RoomCode::parse("AB123"),
            Err(RoomError::NotFound { .. })
        ));
        assert!(matches!(
            RoomCode::parse("A-12"),
            Err(RoomError::NotFound { .. })
        ));
    }

    #[test]
    fn test_random_codes_parse() {
        let mut rng = thread_rng();

        for _ in 0..100 {
            let code = RoomCode::random(&mut rng);
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_code_space() {
        assert_eq!(RoomCode::SPACE, 1_679_616);
    }
}
