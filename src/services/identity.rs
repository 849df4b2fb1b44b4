//! Maps an external-identity assertion onto exactly one local user record.
//!
//! Email is the primary match key: a person may front several provider
//! subject ids over time (provider migrations, social-login linking), but an
//! email names one account. Concurrent first sign-ins for the same email are
//! resolved through the storage layer's uniqueness constraints rather than
//! in-process locking.

use sea_orm::SqlErr;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::Store;
use crate::entities::users;
use crate::models::patch::UserPatch;
use crate::services::token::IdentityClaims;

/// Caller intent for [`IdentityReconciler::reconcile`].
///
/// A fresh signup must never silently attach to an account that already owns
/// the email under a different subject id; a signin tolerates the mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileIntent {
    Signup,
    Signin,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An account with this email already exists. Please sign in instead.")]
    DuplicateIdentity,

    #[error("Identity reconciliation failed: account vanished after insert conflict")]
    ReconciliationFailed,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct IdentityReconciler {
    store: Store,
    admin_emails: Vec<String>,
}

impl IdentityReconciler {
    #[must_use]
    pub const fn new(store: Store, admin_emails: Vec<String>) -> Self {
        Self {
            store,
            admin_emails,
        }
    }

    /// Resolves the asserted identity to a persisted user row, creating it
    /// on first contact.
    ///
    /// At most one insert and one update are performed; both are committed
    /// before the row is returned, so callers always observe the durable
    /// state.
    pub async fn reconcile(
        &self,
        claims: &IdentityClaims,
        intent: ReconcileIntent,
    ) -> Result<users::Model, IdentityError> {
        let email = claims
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::InvalidInput("Email is required".to_string()))?;

        let users = self.store.user_repo();

        if let Some(existing) = users.get_by_email(email).await? {
            if existing.id != claims.sub {
                match intent {
                    ReconcileIntent::Signup => return Err(IdentityError::DuplicateIdentity),
                    ReconcileIntent::Signin => {
                        warn!(
                            email = %email,
                            stored_id = %existing.id,
                            asserted_id = %claims.sub,
                            "Subject id mismatch on signin; keeping stored account"
                        );
                    }
                }
            }

            if let Some(name) = claims.name.as_deref()
                && existing.name.as_deref() != Some(name)
            {
                let patch = UserPatch {
                    name: Some(name.to_string()),
                };
                return Ok(users.apply_patch(existing, patch).await?);
            }

            return Ok(existing);
        }

        let is_admin = self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email));

        match users
            .insert(&claims.sub, email, claims.name.as_deref(), is_admin)
            .await
        {
            Ok(created) => Ok(created),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // A concurrent request won the race to create this account.
                // One bounded re-read; the raw storage error is never
                // surfaced for the expected case.
                match users.get_by_email_or_id(email, &claims.sub).await? {
                    Some(winner) => Ok(winner),
                    None => {
                        error!(
                            email = %email,
                            subject_id = %claims.sub,
                            "Insert conflicted but no matching row found on re-read"
                        );
                        Err(IdentityError::ReconciliationFailed)
                    }
                }
            }
            Err(err) => Err(IdentityError::Database(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, email: Option<&str>, name: Option<&str>) -> IdentityClaims {
        IdentityClaims {
            sub: sub.to_string(),
            email: email.map(str::to_string),
            email_verified: true,
            name: name.map(str::to_string),
        }
    }

    async fn test_store() -> Store {
        Store::new("sqlite::memory:")
            .await
            .expect("in-memory store")
    }

    #[tokio::test]
    async fn creates_user_on_first_contact() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store.clone(), vec![]);

        let user = reconciler
            .reconcile(
                &claims("sub-1", Some("host@example.com"), Some("Host")),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap();

        assert_eq!(user.id, "sub-1");
        assert_eq!(user.email, "host@example.com");
        assert_eq!(user.name.as_deref(), Some("Host"));
        assert!(!user.is_admin);
        assert!(!user.is_suspended);
    }

    #[tokio::test]
    async fn rejects_empty_email() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store, vec![]);

        let err = reconciler
            .reconcile(&claims("sub-1", Some("   "), None), ReconcileIntent::Signup)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));

        // Absent email is the same failure.
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store, vec![]);
        let err = reconciler
            .reconcile(&claims("sub-1", None, None), ReconcileIntent::Signin)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn signup_with_foreign_subject_id_is_a_conflict() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store, vec![]);

        reconciler
            .reconcile(
                &claims("sub-a", Some("shared@example.com"), None),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap();

        let err = reconciler
            .reconcile(
                &claims("sub-b", Some("shared@example.com"), None),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn signin_with_foreign_subject_id_keeps_stored_account() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store, vec![]);

        reconciler
            .reconcile(
                &claims("sub-a", Some("shared@example.com"), None),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap();

        let user = reconciler
            .reconcile(
                &claims("sub-b", Some("shared@example.com"), None),
                ReconcileIntent::Signin,
            )
            .await
            .unwrap();

        assert_eq!(user.id, "sub-a");
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store.clone(), vec![]);
        let input = claims("sub-1", Some("host@example.com"), Some("Host"));

        let first = reconciler
            .reconcile(&input, ReconcileIntent::Signin)
            .await
            .unwrap();
        let second = reconciler
            .reconcile(&input, ReconcileIntent::Signin)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn updates_changed_display_name() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store, vec![]);

        reconciler
            .reconcile(
                &claims("sub-1", Some("host@example.com"), Some("Old Name")),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap();

        let user = reconciler
            .reconcile(
                &claims("sub-1", Some("host@example.com"), Some("New Name")),
                ReconcileIntent::Signin,
            )
            .await
            .unwrap();

        assert_eq!(user.name.as_deref(), Some("New Name"));
    }

    #[tokio::test]
    async fn insert_conflict_falls_back_to_reread() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store.clone(), vec![]);

        // Seed a row owning the subject id under a different email, so the
        // fresh-insert path hits the primary-key constraint.
        store
            .user_repo()
            .insert("sub-1", "first@example.com", None, false)
            .await
            .unwrap();

        let user = reconciler
            .reconcile(
                &claims("sub-1", Some("second@example.com"), None),
                ReconcileIntent::Signin,
            )
            .await
            .unwrap();

        assert_eq!(user.id, "sub-1");
        assert_eq!(user.email, "first@example.com");
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_signins_create_one_row() {
        let store = test_store().await;
        let reconciler = IdentityReconciler::new(store.clone(), vec![]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let reconciler = reconciler.clone();
            handles.push(tokio::spawn(async move {
                reconciler
                    .reconcile(
                        &claims("sub-race", Some("race@example.com"), None),
                        ReconcileIntent::Signin,
                    )
                    .await
            }));
        }

        for handle in handles {
            let user = handle.await.unwrap().unwrap();
            assert_eq!(user.email, "race@example.com");
        }

        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn admin_allowlist_marks_new_accounts() {
        let store = test_store().await;
        let reconciler =
            IdentityReconciler::new(store, vec!["Admin@Example.com".to_string()]);

        let user = reconciler
            .reconcile(
                &claims("sub-adm", Some("admin@example.com"), None),
                ReconcileIntent::Signup,
            )
            .await
            .unwrap();

        assert!(user.is_admin);
    }
}
