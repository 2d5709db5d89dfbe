use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every field is optional on the wire so a missing one becomes a 400 from
/// validation instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub image_base64: Option<String>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub lead_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    pub transformed_image: String,
    pub cached: bool,
}

/// Request after the required-field check.
#[derive(Debug, Clone)]
pub struct ValidTransformRequest {
    pub image_base64: String,
    pub current_weight: f64,
    pub goal_weight: f64,
    pub height: f64,
}

impl TransformRequest {
    /// Zero counts as missing, like an empty form field.
    pub fn validate(&self) -> Option<ValidTransformRequest> {
        let present = |v: Option<f64>| v.filter(|n| *n != 0.0 && n.is_finite());
        let image_base64 = self.image_base64.as_deref().filter(|s| !s.trim().is_empty())?;
        Some(ValidTransformRequest {
            image_base64: image_base64.to_string(),
            current_weight: present(self.current_weight)?,
            goal_weight: present(self.goal_weight)?,
            height: present(self.height)?,
        })
    }
}
