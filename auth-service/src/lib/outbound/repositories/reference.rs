use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::user::ports::ReferenceCatalog;
use crate::domain::user::ports::ReferenceKind;
use crate::user::errors::AuthError;

/// Lookup tables of cities, universities, majors and industries.
pub struct PostgresReferenceCatalog {
    pool: PgPool,
}

impl PostgresReferenceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table(kind: ReferenceKind) -> &'static str {
        match kind {
            ReferenceKind::City => "cities",
            ReferenceKind::University => "universities",
            ReferenceKind::Major => "majors",
            ReferenceKind::Industry => "industries",
        }
    }
}

#[async_trait]
impl ReferenceCatalog for PostgresReferenceCatalog {
    async fn exists(&self, kind: ReferenceKind, name: &str) -> Result<bool, AuthError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE name = $1)",
            Self::table(kind)
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }
}
