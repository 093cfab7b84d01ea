//! Deterministic ID generation using SHA256 hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic entity ID derived from content hash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from a hash string.
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Generate an EntityId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for pilot IDs
pub type PilotId = EntityId;

/// Type alias for competition IDs
pub type CompetitionId = EntityId;

/// Type alias for race IDs
pub type RaceId = EntityId;

/// Type alias for race participant IDs
pub type ParticipantId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["race", "Monza", "2024-03-10", "GT3", "1"]);
        let id2 = EntityId::generate(&["race", "Monza", "2024-03-10", "GT3", "1"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_different_inputs() {
        let id1 = EntityId::generate(&["race", "Monza", "2024-03-10", "GT3", "1"]);
        let id2 = EntityId::generate(&["race", "Monza", "2024-03-10", "GT3", "2"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_length() {
        let id = EntityId::generate(&["pilot", "A. Senna"]);
        assert_eq!(id.as_str().len(), 16);
    }

    #[test]
    fn test_entity_id_hex_format() {
        let id = EntityId::generate(&["pilot", "A. Senna"]);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entity_id_field_separator_matters() {
        // "ab" + "c" must not collide with "a" + "bc"
        let id1 = EntityId::generate(&["ab", "c"]);
        let id2 = EntityId::generate(&["a", "bc"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_serialization() {
        let id = EntityId::generate(&["pilot", "A. Senna"]);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("abc123def456".to_string());
        assert_eq!(format!("{}", id), "abc123def456");
    }

    #[test]
    fn test_entity_id_from_str() {
        let id = EntityId::from("pilot-1");
        assert_eq!(id.as_str(), "pilot-1");
    }
}
