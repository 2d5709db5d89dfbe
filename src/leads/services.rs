use axum::response::{IntoResponse, Response};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::dto::{CreateLeadRequest, LeadCreatedResponse};
use super::repo::{NewLead, LEAD_GENDER};
use crate::error::ApiError;
use crate::health::{self, SymptomGuide, IDEAL_BMI};
use crate::report::{compose, ReportInput};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("Sintoma desconhecido: {0}")]
    UnknownSymptom(String),
    #[error("Erro ao salvar seus dados")]
    Persist(#[source] anyhow::Error),
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        match self {
            LeadError::Persist(_) => ApiError::internal(self.to_string()).into_response(),
            _ => ApiError::bad_request(self.to_string()).into_response(),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Brazilian mobile mask: `(XX) XXXXX-XXXX`, extra digits dropped.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(11).collect();
    match digits.len() {
        0..=2 => digits,
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

fn positive(value: Option<f64>, message: &'static str) -> Result<f64, LeadError> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or(LeadError::Invalid(message))
}

/// Validates the submission and computes every derived figure stored with the lead.
pub fn build_lead(req: &CreateLeadRequest, guide: &SymptomGuide) -> Result<NewLead, LeadError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(LeadError::Invalid("Nome é obrigatório"));
    }
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(LeadError::Invalid("Email é obrigatório"));
    }
    if !is_valid_email(&email) {
        return Err(LeadError::Invalid("Email inválido"));
    }
    if req.phone.trim().is_empty() {
        return Err(LeadError::Invalid("WhatsApp é obrigatório"));
    }
    if req.phone.chars().filter(char::is_ascii_digit).count() < 10 {
        return Err(LeadError::Invalid("WhatsApp incompleto"));
    }
    let city = req.city.trim();
    if city.is_empty() {
        return Err(LeadError::Invalid("Cidade é obrigatória"));
    }

    let age = req
        .age
        .filter(|a| (1..=120).contains(a))
        .ok_or(LeadError::Invalid("Idade inválida"))?;
    let weight = positive(req.weight, "Peso inválido")?;
    let height = positive(req.height, "Altura inválida")?;

    let mut symptoms: Vec<String> = Vec::with_capacity(req.symptoms.len());
    for id in &req.symptoms {
        if !guide.contains(id) {
            return Err(LeadError::UnknownSymptom(id.clone()));
        }
        if !symptoms.contains(id) {
            symptoms.push(id.clone());
        }
    }

    let ideal_weight = health::ideal_weight(height);
    Ok(NewLead {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        phone: format_phone(&req.phone),
        city: city.to_string(),
        age: age as i32,
        weight,
        height,
        goal_weight: ideal_weight,
        bmi_current: health::bmi(weight, height),
        bmi_ideal: IDEAL_BMI,
        ideal_weight,
        basal_metabolic_rate: health::basal_metabolic_rate(weight, height, f64::from(age)),
        symptoms,
        gender: LEAD_GENDER,
    })
}

pub async fn create_lead(
    st: &AppState,
    req: CreateLeadRequest,
) -> Result<LeadCreatedResponse, LeadError> {
    let lead = build_lead(&req, &st.symptoms)?;
    let created_at = st.leads.insert(&lead).await.map_err(|e| {
        error!(error = %e, "insert lead failed");
        LeadError::Persist(e)
    })?;
    info!(lead_id = %lead.id, "lead captured");

    let report = compose(
        &ReportInput {
            name: lead.name.clone(),
            age: lead.age,
            weight: lead.weight,
            height: lead.height,
            symptoms: lead.symptoms.clone(),
            original_image: None,
            transformed_image: None,
        },
        &st.symptoms,
    );

    Ok(LeadCreatedResponse {
        id: lead.id,
        created_at,
        report,
    })
}
