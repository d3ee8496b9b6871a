//! Register and login flows: descriptor in, signed credential out.

use super::{Descriptor, EnrollmentGuard, MatchOutcome, Matcher};
use crate::{
    error::AuthError,
    store::{EnrollmentStore, StoreError},
    token::{Credentials, IssuedToken},
};
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Identity resolved by a register or login call, with its fresh credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub identity: Uuid,
    pub credential: IssuedToken,
}

pub struct FaceAuth {
    store: Arc<dyn EnrollmentStore>,
    guard: EnrollmentGuard,
    matcher: Matcher,
    credentials: Credentials,
}

impl std::fmt::Debug for FaceAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceAuth")
            .field("matcher", &self.matcher)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl FaceAuth {
    #[must_use]
    pub fn new(store: Arc<dyn EnrollmentStore>, matcher: Matcher, credentials: Credentials) -> Self {
        Self {
            guard: EnrollmentGuard::new(store.clone()),
            store,
            matcher,
            credentials,
        }
    }

    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Enroll a new face and issue its first credential.
    ///
    /// # Errors
    /// `MalformedInput`, `AlreadyEnrolled`, `ConflictingEnrollment` or `StorageFailure`.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        descriptor: Option<&str>,
        now_unix_seconds: i64,
    ) -> Result<Authenticated, AuthError> {
        let descriptor = parse_descriptor(descriptor)?;
        let identity = self.guard.register(&descriptor).await?;
        self.authenticated(identity, now_unix_seconds)
    }

    /// Resolve a face to its closest enrolled identity and issue a credential.
    ///
    /// # Errors
    /// `MalformedInput`, `NotEnrolled`, `NoMatch` or `StorageFailure`.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        descriptor: Option<&str>,
        now_unix_seconds: i64,
    ) -> Result<Authenticated, AuthError> {
        let query = parse_descriptor(descriptor)?;

        let snapshot = self.store.find_all().await?;
        if snapshot.is_empty() {
            return Err(AuthError::NotEnrolled);
        }
        if !snapshot.unreadable.is_empty() {
            warn!(
                unreadable = snapshot.unreadable.len(),
                "skipping enrollments with unreadable descriptors"
            );
        }

        match self.matcher.decide(&query, &snapshot.records) {
            MatchOutcome::Matched(best) => {
                info!(identity = %best.identity, distance = best.distance, "Face matched");
                self.authenticated(best.identity, now_unix_seconds)
            }
            // every stored row was unreadable; the population is not empty
            MatchOutcome::NotEnrolled | MatchOutcome::NoMatch { .. } => Err(AuthError::NoMatch),
        }
    }

    /// Recover the identity bound to the request's bearer token.
    ///
    /// # Errors
    /// One of the four token failure kinds.
    pub fn verify_headers(
        &self,
        headers: &HeaderMap,
        now_unix_seconds: i64,
    ) -> Result<Uuid, AuthError> {
        Ok(self.credentials.verify_headers(headers, now_unix_seconds)?)
    }

    /// # Errors
    /// Returns the store's connectivity error.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    fn authenticated(&self, identity: Uuid, now_unix_seconds: i64) -> Result<Authenticated, AuthError> {
        let credential = self.credentials.issue(identity, now_unix_seconds)?;
        Ok(Authenticated {
            identity,
            credential,
        })
    }
}

fn parse_descriptor(raw: Option<&str>) -> Result<Descriptor, AuthError> {
    match raw.map(str::trim) {
        None | Some("") => Err(AuthError::missing_descriptor()),
        Some(text) => Ok(Descriptor::parse(text)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        store::{EnrollmentRecord, EnrollmentSnapshot, MemoryEnrollmentStore},
        token::TokenConfig,
    };
    use async_trait::async_trait;
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn credentials() -> Credentials {
        Credentials::new(TokenConfig::new(SecretString::from(
            "service-test-secret-with-enough-bytes".to_string(),
        )))
        .unwrap()
    }

    fn service(store: Arc<dyn EnrollmentStore>) -> FaceAuth {
        FaceAuth::new(store, Matcher::default(), credentials())
    }

    #[tokio::test]
    async fn register_then_login_with_same_face() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));

        let registered = auth.register(Some("0.1,0.2,0.3"), NOW).await.unwrap();
        let logged_in = auth.login(Some("0.1, 0.2, 0.3"), NOW).await.unwrap();

        assert_eq!(registered.identity, logged_in.identity);
        assert_eq!(
            auth.credentials()
                .verify(&logged_in.credential.token, NOW)
                .unwrap(),
            registered.identity
        );
    }

    #[tokio::test]
    async fn login_with_nearby_face_matches() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));
        let registered = auth.register(Some("0.1,0.2,0.3"), NOW).await.unwrap();

        let logged_in = auth.login(Some("0.15,0.25,0.35"), NOW).await.unwrap();

        assert_eq!(logged_in.identity, registered.identity);
    }

    #[tokio::test]
    async fn login_without_enrollments_is_not_enrolled() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));
        let err = auth.login(Some("0.1,0.2"), NOW).await.unwrap_err();
        assert!(matches!(err, AuthError::NotEnrolled));
    }

    #[tokio::test]
    async fn login_with_distant_face_is_no_match() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));
        auth.register(Some("0.0,0.0"), NOW).await.unwrap();

        let err = auth.login(Some("0.61,0.0"), NOW).await.unwrap_err();

        assert!(matches!(err, AuthError::NoMatch));
    }

    #[tokio::test]
    async fn missing_or_malformed_descriptor_is_rejected_before_storage() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));

        for raw in [None, Some(""), Some("   ")] {
            let err = auth.register(raw, NOW).await.unwrap_err();
            assert!(matches!(err, AuthError::MalformedInput(ref m) if m == "Face ID is required"));
        }

        let err = auth.login(Some("0.1,zero"), NOW).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedInput(_)));
    }

    #[tokio::test]
    async fn duplicate_registration_is_already_enrolled() {
        let auth = service(Arc::new(MemoryEnrollmentStore::new()));
        auth.register(Some("0.4,0.4"), NOW).await.unwrap();

        let err = auth.register(Some("0.4,0.4"), NOW).await.unwrap_err();

        assert!(matches!(err, AuthError::AlreadyEnrolled));
    }

    struct UnreadableStore;

    #[async_trait]
    impl EnrollmentStore for UnreadableStore {
        async fn find_exact(
            &self,
            _descriptor: &Descriptor,
        ) -> Result<Option<EnrollmentRecord>, StoreError> {
            Ok(None)
        }

        async fn find_all(&self) -> Result<EnrollmentSnapshot, StoreError> {
            Ok(EnrollmentSnapshot {
                records: Vec::new(),
                unreadable: vec![Uuid::now_v7()],
            })
        }

        async fn insert(&self, _descriptor: &Descriptor) -> Result<EnrollmentRecord, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn only_unreadable_rows_is_no_match() {
        let auth = service(Arc::new(UnreadableStore));
        let err = auth.login(Some("0.1,0.2"), NOW).await.unwrap_err();
        assert!(matches!(err, AuthError::NoMatch));
    }

    #[tokio::test]
    async fn storage_errors_surface_as_storage_failure() {
        let auth = service(Arc::new(UnreadableStore));
        let err = auth.register(Some("0.1,0.2"), NOW).await.unwrap_err();
        assert!(matches!(err, AuthError::StorageFailure(_)));
    }
}
