//! Closed-form health figures shown in the report, plus the symptom orientation table.

pub mod metrics;
pub mod symptoms;

pub use metrics::{
    basal_metabolic_rate, bmi, classify_bmi, devine_weight, ideal_weight, round_to,
    weekly_loss_plan, Severity, WeeklyLossPlan, HEALTHY_BMI_RANGE, IDEAL_BMI,
};
pub use symptoms::SymptomGuide;
