use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BusinessProfile, MaturityScores};

/// Read port over externally-owned profile data. The engine never writes
/// profiles or maturity scores outside of test seeding.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a user's business profile, if one exists.
    async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<BusinessProfile>>;

    /// Fetch the most recent maturity assessment for a user.
    async fn latest_maturity(&self, user_id: Uuid) -> DomainResult<Option<MaturityScores>>;

    /// Seed a profile row. Upserts on user_id.
    async fn upsert_profile(&self, profile: &BusinessProfile) -> DomainResult<()>;

    /// Record a maturity assessment snapshot.
    async fn insert_maturity(&self, user_id: Uuid, scores: &MaturityScores) -> DomainResult<()>;
}
