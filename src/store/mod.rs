/// Credential store
///
/// The session core only needs three operations on user records. Uniqueness
/// of email and phone number is enforced by the store at insert time and
/// reported as `StoreError::UniqueViolation`.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::UserId;
use crate::error::StoreError;

/// A stored user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: String,
}

/// A user about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Insert unless the email or phone number is already present.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_omits_password_hash() {
        let user = User {
            id: UserId(1),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@x.com".into(),
            password_hash: "$2b$12$hash".into(),
            phone_number: "+1".into(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "firstName": "A",
                "lastName": "B",
                "email": "a@x.com",
                "phoneNumber": "+1"
            })
        );
    }
}
