//! Customer account domain type.

use chrono::{DateTime, Utc};

use eyeric_core::{Email, UserId};

/// A storefront customer.
///
/// The cart and favorites stored on the same row are loaded separately by
/// the services that own them.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name to greet the customer with: their name, or the local part of
    /// their email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                let email = self.email.as_str();
                email.split_once('@').map_or(email, |(local, _)| local)
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("priya@example.com").unwrap(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user(Some("Priya")).display_name(), "Priya");
        assert_eq!(user(Some("  ")).display_name(), "priya");
        assert_eq!(user(None).display_name(), "priya");
    }
}
