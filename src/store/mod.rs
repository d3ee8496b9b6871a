//! Enrollment storage collaborator.
//!
//! The matcher never talks to the database directly; it receives a
//! point-in-time [`EnrollmentSnapshot`] from an [`EnrollmentStore`].

use crate::face::Descriptor;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryEnrollmentStore;
pub use postgres::PgEnrollmentStore;

/// One enrolled identity and its descriptor. Immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentRecord {
    pub identity: Uuid,
    pub descriptor: Descriptor,
}

/// Full enrollment population as read by a single query.
///
/// `unreadable` lists identities whose stored descriptor no longer parses;
/// they are part of the population but can never be matched.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentSnapshot {
    pub records: Vec<EnrollmentRecord>,
    pub unreadable: Vec<Uuid>,
}

impl EnrollmentSnapshot {
    #[must_use]
    pub fn population(&self) -> usize {
        self.records.len() + self.unreadable.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.population() == 0
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The uniqueness constraint on the descriptor fired, typically because a
    /// concurrent registration won the race.
    #[error("descriptor already enrolled")]
    UniqueViolation,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Exact lookup by descriptor value.
    async fn find_exact(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<EnrollmentRecord>, StoreError>;

    /// Every enrollment, in insertion order, from one consistent read.
    async fn find_all(&self) -> Result<EnrollmentSnapshot, StoreError>;

    /// Persist a new enrollment under a freshly generated identity.
    ///
    /// Returns [`StoreError::UniqueViolation`] when the descriptor is already stored.
    async fn insert(&self, descriptor: &Descriptor) -> Result<EnrollmentRecord, StoreError>;

    /// Connectivity probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
