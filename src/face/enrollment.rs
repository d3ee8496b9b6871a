//! Registration-time duplicate protection.
//!
//! Only literal duplicates are blocked: the lookup is an exact match on the
//! descriptor, not a distance comparison, so two slightly different captures
//! of the same face may both be enrolled.

use super::Descriptor;
use crate::{error::AuthError, store::EnrollmentStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct EnrollmentGuard {
    store: Arc<dyn EnrollmentStore>,
}

impl EnrollmentGuard {
    #[must_use]
    pub fn new(store: Arc<dyn EnrollmentStore>) -> Self {
        Self { store }
    }

    /// Enroll `descriptor` and return its new identity.
    ///
    /// # Errors
    /// - [`AuthError::AlreadyEnrolled`] when the exact descriptor is stored.
    /// - [`AuthError::ConflictingEnrollment`] when a concurrent registration
    ///   inserted it between the lookup and the insert.
    /// - [`AuthError::StorageFailure`] for anything else from the store.
    #[instrument(skip_all, fields(descriptor_len = descriptor.len()))]
    pub async fn register(&self, descriptor: &Descriptor) -> Result<Uuid, AuthError> {
        if let Some(existing) = self.store.find_exact(descriptor).await? {
            warn!(identity = %existing.identity, "Face already registered");
            return Err(AuthError::AlreadyEnrolled);
        }

        let record = self.store.insert(descriptor).await?;
        info!(identity = %record.identity, "Enrollment created");

        Ok(record.identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{
        EnrollmentRecord, EnrollmentSnapshot, MemoryEnrollmentStore, StoreError,
    };
    use async_trait::async_trait;

    #[tokio::test]
    async fn second_registration_is_already_enrolled() {
        let guard = EnrollmentGuard::new(Arc::new(MemoryEnrollmentStore::new()));
        let descriptor = Descriptor::parse("0.1,0.2,0.3").unwrap();

        guard.register(&descriptor).await.unwrap();
        let err = guard.register(&descriptor).await.unwrap_err();

        assert!(matches!(err, AuthError::AlreadyEnrolled));
    }

    #[tokio::test]
    async fn near_duplicate_is_allowed() {
        let guard = EnrollmentGuard::new(Arc::new(MemoryEnrollmentStore::new()));

        let first = guard
            .register(&Descriptor::parse("0.1,0.2,0.3").unwrap())
            .await
            .unwrap();
        let second = guard
            .register(&Descriptor::parse("0.1,0.2,0.3000001").unwrap())
            .await
            .unwrap();

        assert_ne!(first, second);
    }

    /// Store whose lookup never sees the row a concurrent writer just inserted.
    struct RacingStore;

    #[async_trait]
    impl EnrollmentStore for RacingStore {
        async fn find_exact(
            &self,
            _descriptor: &Descriptor,
        ) -> Result<Option<EnrollmentRecord>, StoreError> {
            Ok(None)
        }

        async fn find_all(&self) -> Result<EnrollmentSnapshot, StoreError> {
            Ok(EnrollmentSnapshot::default())
        }

        async fn insert(&self, _descriptor: &Descriptor) -> Result<EnrollmentRecord, StoreError> {
            Err(StoreError::UniqueViolation)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn lost_race_is_conflicting_enrollment() {
        let guard = EnrollmentGuard::new(Arc::new(RacingStore));
        let err = guard
            .register(&Descriptor::parse("0.5,0.5").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ConflictingEnrollment));
    }
}
