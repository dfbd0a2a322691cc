// src/models/user.rs

use serde::{Deserialize, Serialize};

/// The signed-in principal as supplied by the identity provider.
/// Not persisted by this application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Principal {
    /// Admin status is a pure function of email equality against the single
    /// configured admin address.
    pub fn is_admin(&self, admin_email: &str) -> bool {
        self.email == admin_email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(email: &str) -> Principal {
        Principal {
            id: "uid-1".to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn admin_email_matches() {
        assert!(principal("admin@example.com").is_admin("admin@example.com"));
    }

    #[test]
    fn other_email_does_not_match() {
        assert!(!principal("user@example.com").is_admin("admin@example.com"));
        // Case-sensitive equality, same as the configured-address comparison
        // in the identity layer.
        assert!(!principal("Admin@example.com").is_admin("admin@example.com"));
    }
}
