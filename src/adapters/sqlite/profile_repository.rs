//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BusinessProfile, MaturityScores};
use crate::domain::ports::ProfileRepository;

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<BusinessProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(BusinessProfile::try_from).transpose()
    }

    async fn latest_maturity(&self, user_id: Uuid) -> DomainResult<Option<MaturityScores>> {
        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT idea_validation, user_experience, market_fit, monetization
             FROM maturity_scores WHERE user_id = ?
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(iv, ux, mf, mo)| {
            MaturityScores::new(
                clamp_score(iv),
                clamp_score(ux),
                clamp_score(mf),
                clamp_score(mo),
            )
        }))
    }

    async fn upsert_profile(&self, profile: &BusinessProfile) -> DomainResult<()> {
        let skills = serde_json::to_string(&profile.primary_skills)?;
        let challenges = serde_json::to_string(&profile.current_challenges)?;
        let goals = serde_json::to_string(&profile.business_goals)?;
        let channels = serde_json::to_string(&profile.sales_channels)?;

        sqlx::query(
            r#"INSERT INTO profiles (user_id, brand_name, business_description, business_type,
               target_market, current_stage, location, team_size, time_availability,
               monthly_revenue_goal, years_in_business, initial_investment, primary_skills,
               current_challenges, business_goals, sales_channels, social_media_presence,
               created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 brand_name = excluded.brand_name,
                 business_description = excluded.business_description,
                 business_type = excluded.business_type,
                 target_market = excluded.target_market,
                 current_stage = excluded.current_stage,
                 location = excluded.location,
                 team_size = excluded.team_size,
                 time_availability = excluded.time_availability,
                 monthly_revenue_goal = excluded.monthly_revenue_goal,
                 years_in_business = excluded.years_in_business,
                 initial_investment = excluded.initial_investment,
                 primary_skills = excluded.primary_skills,
                 current_challenges = excluded.current_challenges,
                 business_goals = excluded.business_goals,
                 sales_channels = excluded.sales_channels,
                 social_media_presence = excluded.social_media_presence,
                 updated_at = excluded.updated_at"#,
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.brand_name)
        .bind(&profile.business_description)
        .bind(&profile.business_type)
        .bind(&profile.target_market)
        .bind(&profile.current_stage)
        .bind(&profile.location)
        .bind(&profile.team_size)
        .bind(&profile.time_availability)
        .bind(profile.monthly_revenue_goal)
        .bind(profile.years_in_business)
        .bind(&profile.initial_investment)
        .bind(&skills)
        .bind(&challenges)
        .bind(&goals)
        .bind(&channels)
        .bind(&profile.social_media_presence)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_maturity(&self, user_id: Uuid, scores: &MaturityScores) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO maturity_scores (id, user_id, idea_validation, user_experience,
               market_fit, monetization, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(i64::from(scores.idea_validation))
        .bind(i64::from(scores.user_experience))
        .bind(i64::from(scores.market_fit))
        .bind(i64::from(scores.monetization))
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

fn parse_string_list(raw: Option<String>) -> DomainResult<Vec<String>> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(Option::unwrap_or_default)
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    brand_name: Option<String>,
    business_description: Option<String>,
    business_type: Option<String>,
    target_market: Option<String>,
    current_stage: Option<String>,
    location: Option<String>,
    team_size: Option<String>,
    time_availability: Option<String>,
    monthly_revenue_goal: Option<f64>,
    years_in_business: Option<i64>,
    initial_investment: Option<String>,
    primary_skills: Option<String>,
    current_challenges: Option<String>,
    business_goals: Option<String>,
    sales_channels: Option<String>,
    social_media_presence: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProfileRow> for BusinessProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&row.user_id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);
        let updated_at = chrono::DateTime::parse_from_rfc3339(&row.updated_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);

        Ok(BusinessProfile {
            user_id,
            brand_name: row.brand_name,
            business_description: row.business_description,
            business_type: row.business_type,
            target_market: row.target_market,
            current_stage: row.current_stage,
            location: row.location,
            team_size: row.team_size,
            time_availability: row.time_availability,
            monthly_revenue_goal: row.monthly_revenue_goal,
            years_in_business: row.years_in_business,
            initial_investment: row.initial_investment,
            primary_skills: parse_string_list(row.primary_skills)?,
            current_challenges: parse_string_list(row.current_challenges)?,
            business_goals: parse_string_list(row.business_goals)?,
            sales_channels: parse_string_list(row.sales_channels)?,
            social_media_presence: row.social_media_presence,
            created_at,
            updated_at,
        })
    }
}
