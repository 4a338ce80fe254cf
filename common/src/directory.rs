// common/src/directory.rs
use crate::error::AuthError;
use crate::models::{Identity, Role};
use async_trait::async_trait;

/// Source of truth for the identities that may log in.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Case-insensitive lookup by email.
    ///
    /// Backends that talk to a remote service report outages as
    /// [`AuthError::AuthServiceUnavailable`].
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError>;
}

/// Fixed list of identities held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: Vec<Identity>,
}

impl StaticUserDirectory {
    pub fn new(users: Vec<Identity>) -> Self {
        Self { users }
    }

    /// The four demo accounts, one per role
    pub fn demo() -> Self {
        Self::new(vec![
            Identity::new("1", "Admin User", "admin@school.edu", Role::Admin).with_avatar(
                "https://images.pexels.com/photos/3861958/pexels-photo-3861958.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            Identity::new("2", "Teacher Smith", "teacher@school.edu", Role::Teacher).with_avatar(
                "https://images.pexels.com/photos/3861943/pexels-photo-3861943.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            Identity::new("3", "Student Johnson", "student@school.edu", Role::Student).with_avatar(
                "https://images.pexels.com/photos/5212324/pexels-photo-5212324.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            Identity::new("4", "Parent Davis", "parent@example.com", Role::Parent).with_avatar(
                "https://images.pexels.com/photos/3861969/pexels-photo-3861969.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
        ])
    }

    pub fn users(&self) -> &[Identity] {
        &self.users
    }

    pub fn find(&self, email: &str) -> Option<&Identity> {
        self.users.iter().find(|user| user.matches_email(email))
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        let found = self.find(email).cloned();
        tracing::debug!("Directory lookup for {}: found={}", email, found.is_some());
        Ok(found)
    }
}
