use super::{EnrollmentRecord, EnrollmentSnapshot, EnrollmentStore, StoreError};
use crate::face::Descriptor;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local enrollment store, used by tests and embedders that do not
/// need persistence.
#[derive(Debug, Default)]
pub struct MemoryEnrollmentStore {
    records: RwLock<Vec<EnrollmentRecord>>,
}

impl MemoryEnrollmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-built records, keeping their identities.
    #[must_use]
    pub fn with_records(records: Vec<EnrollmentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn find_exact(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        let canonical = descriptor.canonical();
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.descriptor.canonical() == canonical)
            .cloned())
    }

    async fn find_all(&self) -> Result<EnrollmentSnapshot, StoreError> {
        Ok(EnrollmentSnapshot {
            records: self.records.read().await.clone(),
            unreadable: Vec::new(),
        })
    }

    async fn insert(&self, descriptor: &Descriptor) -> Result<EnrollmentRecord, StoreError> {
        let canonical = descriptor.canonical();
        // Check and push under one write lock, mirroring the UNIQUE constraint.
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|record| record.descriptor.canonical() == canonical)
        {
            return Err(StoreError::UniqueViolation);
        }

        let record = EnrollmentRecord {
            identity: Uuid::now_v7(),
            descriptor: descriptor.clone(),
        };
        records.push(record.clone());

        Ok(record)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
