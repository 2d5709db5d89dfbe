//! Report composition: the numeric sections are always produced, the visual
//! section only when both photos are available.

use serde::{Deserialize, Serialize};

use crate::health::{
    self, round_to, Severity, SymptomGuide, WeeklyLossPlan, HEALTHY_BMI_RANGE, IDEAL_BMI,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    pub name: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub original_image: Option<String>,
    pub transformed_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub patient: PatientSection,
    pub bmi: BmiSection,
    pub metabolism: MetabolismSection,
    pub weekly_loss: WeeklyLossPlan,
    pub symptoms: Vec<SymptomSection>,
    pub visual: Option<VisualSection>,
    pub summary: Vec<String>,
    pub download_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSection {
    pub first_name: String,
    pub age: i32,
    pub weight: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BmiSection {
    pub current: f64,
    pub classification: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub ideal: f64,
    pub ideal_weight: f64,
    pub devine_weight: f64,
    pub healthy_range: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolismSection {
    pub basal_kcal_per_day: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomSection {
    pub id: String,
    pub title: Option<&'static str>,
    pub tip: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSection {
    pub before: String,
    pub after: String,
}

pub fn first_name(full: &str) -> &str {
    full.split_whitespace().next().unwrap_or("")
}

fn non_empty(image: &Option<String>) -> Option<&String> {
    image.as_ref().filter(|s| !s.trim().is_empty())
}

pub fn compose(input: &ReportInput, guide: &SymptomGuide) -> Report {
    let bmi = health::bmi(input.weight, input.height);
    let class = health::classify_bmi(bmi);
    let ideal_weight = health::ideal_weight(input.height);
    let bmr = health::basal_metabolic_rate(input.weight, input.height, f64::from(input.age));
    let first = first_name(&input.name).to_string();

    let symptoms = input
        .symptoms
        .iter()
        .map(|id| {
            let orientation = guide.get(id);
            SymptomSection {
                id: id.clone(),
                title: orientation.map(|o| o.title),
                tip: orientation.map(|o| o.tip),
            }
        })
        .collect();

    let visual = match (
        non_empty(&input.original_image),
        non_empty(&input.transformed_image),
    ) {
        (Some(before), Some(after)) => Some(VisualSection {
            before: before.clone(),
            after: after.clone(),
        }),
        _ => None,
    };

    let bmi_section = BmiSection {
        current: round_to(bmi, 1),
        classification: class.label(),
        severity: class.severity(),
        description: class.description(),
        ideal: IDEAL_BMI,
        ideal_weight: ideal_weight.round(),
        devine_weight: round_to(health::devine_weight(input.height), 1),
        healthy_range: HEALTHY_BMI_RANGE,
    };
    let summary = summary_lines(&bmi_section);

    Report {
        download_name: download_name(&first),
        patient: PatientSection {
            first_name: first,
            age: input.age,
            weight: input.weight,
            height: input.height,
        },
        bmi: bmi_section,
        metabolism: MetabolismSection {
            basal_kcal_per_day: bmr.round(),
        },
        weekly_loss: health::weekly_loss_plan(input.weight, ideal_weight),
        symptoms,
        visual,
        summary,
    }
}

/// File name the client saves the exported PDF under.
pub fn download_name(first_name: &str) -> String {
    format!("raio-x-{}.pdf", first_name.to_lowercase())
}

/// The plain-text BMI analysis block used by the exported report.
pub fn summary_lines(bmi: &BmiSection) -> Vec<String> {
    let (min_rate, max_rate) = health::metrics::WEEKLY_LOSS_KG;
    vec![
        format!("Seu IMC atual é {:.1} ({}).", bmi.current, bmi.classification),
        format!(
            "Um peso próximo a {} kg resultaria em um IMC ideal de {}.",
            bmi.ideal_weight, bmi.ideal
        ),
        String::new(),
        "Recomendação de Emagrecimento Saudável:".to_string(),
        format!("• {min_rate}-{max_rate}kg por semana (de GORDURA)"),
        "• Esta é a taxa recomendada para perda de gordura saudável".to_string(),
        "• Preserva massa muscular e saúde metabólica".to_string(),
    ]
}
