use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles in the knowledge base.
///
/// Stored and returned with the user; endpoints do not check it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can read and acknowledge articles.
    #[default]
    Reader = 0,
    /// Can author and edit articles and sections.
    Editor = 1,
    /// Full administrative access, including user management.
    Admin = 2,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => write!(f, "reader"),
            Role::Editor => write!(f, "editor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    /// Parse a role from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reader" => Some(Role::Reader),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serialized_name() {
        for role in [Role::Reader, Role::Editor, Role::Admin] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    #[test]
    fn test_from_str_ci() {
        assert_eq!(Role::from_str_ci("Admin"), Some(Role::Admin));
        assert_eq!(Role::from_str_ci(" EDITOR "), Some(Role::Editor));
        assert_eq!(Role::from_str_ci("reader"), Some(Role::Reader));
        assert_eq!(Role::from_str_ci("superuser"), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(Role::default(), Role::Reader);
    }
}
