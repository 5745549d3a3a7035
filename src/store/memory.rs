/// In-process user store, used by the test suite and for local runs without
/// Postgres.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{NewUser, User, UserStore};
use crate::auth::UserId;
use crate::error::{StoreError, UniqueField};

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: HashMap<UserId, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // Check and insert under one write lock, mirroring a UNIQUE constraint.
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(UniqueField::Email));
        }
        if inner.users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(StoreError::UniqueViolation(UniqueField::PhoneNumber));
        }

        inner.next_id += 1;
        let stored = User {
            id: UserId(inner.next_id),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
        };
        inner.users.insert(stored.id, stored.clone());

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password_hash: "$2b$12$hash".into(),
            phone_number: phone.into(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();

        let first = store.insert(new_user("a@x.com", "+1")).await.unwrap();
        let second = store.insert(new_user("b@x.com", "+2")).await.unwrap();

        assert_eq!(first.id, UserId(1));
        assert_eq!(second.id, UserId(2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_lookup_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("a@x.com", "+1")).await.unwrap();

        assert_eq!(store.find_by_email("a@x.com").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
        assert_eq!(store.find_by_id(UserId(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("a@x.com", "+1")).await.unwrap();

        assert_eq!(store.find_by_email("A@X.COM").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("a@x.com", "+1")).await.unwrap();

        assert_eq!(
            store.insert(new_user("a@x.com", "+2")).await,
            Err(StoreError::UniqueViolation(UniqueField::Email))
        );
        assert_eq!(
            store.insert(new_user("b@x.com", "+1")).await,
            Err(StoreError::UniqueViolation(UniqueField::PhoneNumber))
        );
        assert_eq!(store.len().await, 1);
    }
}
