use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// Gender is not asked on the form; the funnel targets women only.
pub const LEAD_GENDER: &str = "feminino";

#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
    pub goal_weight: f64,
    pub bmi_current: f64,
    pub bmi_ideal: f64,
    pub ideal_weight: f64,
    pub basal_metabolic_rate: f64,
    pub symptoms: Vec<String>,
    pub gender: &'static str,
}

/// Insert-only store of captured leads.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Persists the lead and returns its creation time.
    async fn insert(&self, lead: &NewLead) -> anyhow::Result<OffsetDateTime>;
}

pub struct PgLeadRepository {
    db: PgPool,
}

impl PgLeadRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    async fn insert(&self, lead: &NewLead) -> anyhow::Result<OffsetDateTime> {
        let (created_at,): (OffsetDateTime,) = sqlx::query_as(
            r#"
            INSERT INTO leads (id, name, email, whatsapp, city, age, weight, height,
                               goal_weight, bmi_current, bmi_ideal, ideal_weight, tmb,
                               symptoms, gender)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING created_at
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.city)
        .bind(lead.age)
        .bind(lead.weight)
        .bind(lead.height)
        .bind(lead.goal_weight)
        .bind(lead.bmi_current)
        .bind(lead.bmi_ideal)
        .bind(lead.ideal_weight)
        .bind(lead.basal_metabolic_rate)
        .bind(&lead.symptoms)
        .bind(lead.gender)
        .fetch_one(&self.db)
        .await
        .context("insert lead")?;
        Ok(created_at)
    }
}
