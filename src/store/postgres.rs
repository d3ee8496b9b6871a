use super::{EnrollmentRecord, EnrollmentSnapshot, EnrollmentStore, StoreError};
use crate::face::Descriptor;
use async_trait::async_trait;
use sqlx::{Connection, PgPool};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Debug, Clone)]
pub struct PgEnrollmentStore {
    pool: PgPool,
}

impl PgEnrollmentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `enrollments` table and its constraints if missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let span = info_span!("db.migrate", db.system = "postgresql");
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for PgEnrollmentStore {
    async fn find_exact(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        let query = "SELECT id, descriptor FROM enrollments WHERE descriptor_sha256 = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row: Option<(Uuid, String)> = sqlx::query_as(query)
            .bind(descriptor.fingerprint())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        // The fingerprint is a hash; confirm the stored text really is identical.
        Ok(row
            .filter(|(_, text)| *text == descriptor.canonical())
            .map(|(identity, _)| EnrollmentRecord {
                identity,
                descriptor: descriptor.clone(),
            }))
    }

    async fn find_all(&self) -> Result<EnrollmentSnapshot, StoreError> {
        let query = "SELECT id, descriptor FROM enrollments ORDER BY created_at, id";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows: Vec<(Uuid, String)> = sqlx::query_as(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        Ok(snapshot_from_rows(rows))
    }

    async fn insert(&self, descriptor: &Descriptor) -> Result<EnrollmentRecord, StoreError> {
        let query =
            "INSERT INTO enrollments (id, descriptor, descriptor_sha256) VALUES ($1, $2, $3)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let identity = Uuid::now_v7();
        sqlx::query(query)
            .bind(identity)
            .bind(descriptor.canonical())
            .bind(descriptor.fingerprint())
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::UniqueViolation
                } else {
                    StoreError::Database(err)
                }
            })?;

        Ok(EnrollmentRecord {
            identity,
            descriptor: descriptor.clone(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }
}

/// Split raw rows into parseable records and unreadable identities.
fn snapshot_from_rows(rows: Vec<(Uuid, String)>) -> EnrollmentSnapshot {
    let mut snapshot = EnrollmentSnapshot::default();
    for (identity, text) in rows {
        match Descriptor::parse(&text) {
            Ok(descriptor) => snapshot.records.push(EnrollmentRecord {
                identity,
                descriptor,
            }),
            Err(err) => {
                warn!(%identity, error = %err, "stored descriptor is unreadable");
                snapshot.unreadable.push(identity);
            }
        }
    }
    snapshot
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[test]
    fn snapshot_keeps_order_and_flags_unreadable_rows() {
        let first = Uuid::now_v7();
        let broken = Uuid::now_v7();
        let last = Uuid::now_v7();
        let snapshot = snapshot_from_rows(vec![
            (first, "0.1,0.2".to_string()),
            (broken, "0.1,oops".to_string()),
            (last, "0.3,0.4".to_string()),
        ]);

        let ids: Vec<_> = snapshot.records.iter().map(|r| r.identity).collect();
        assert_eq!(ids, vec![first, last]);
        assert_eq!(snapshot.unreadable, vec![broken]);
        assert_eq!(snapshot.population(), 3);
    }

    #[test]
    fn schema_declares_unique_fingerprint() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS enrollments"));
        assert!(SCHEMA_SQL.contains("UNIQUE (descriptor_sha256)"));
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
