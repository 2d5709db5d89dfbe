use serde::Serialize;

/// Reference BMI used for the "ideal weight" figure (middle of the healthy band).
pub const IDEAL_BMI: f64 = 22.0;

/// WHO healthy band, shown next to the ideal BMI in reports.
pub const HEALTHY_BMI_RANGE: (f64, f64) = (18.5, 24.9);

/// Healthy fat-loss rate in kg per week.
pub const WEEKLY_LOSS_KG: (f64, f64) = (0.5, 1.0);

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Weight that yields [`IDEAL_BMI`] at the given height.
pub fn ideal_weight(height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    IDEAL_BMI * (height_m * height_m)
}

/// Mifflin-St Jeor, female equation. Not clamped: extreme inputs may go negative.
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: f64) -> f64 {
    (10.0 * weight_kg) + (6.25 * height_cm) - (5.0 * age) - 161.0
}

/// Devine (1974) reference weight for women: 45.5 kg + 2.3 kg per inch over 5 ft.
pub fn devine_weight(height_cm: f64) -> f64 {
    let inches = height_cm / 2.54;
    45.5 + 2.3 * (inches - 60.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Healthy,
    Attention,
    Moderate,
    High,
    VeryHigh,
}

/// Six-bucket WHO classification; lower bound inclusive, upper bound exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiClass {
    Underweight,
    Normal,
    Overweight,
    ObesityI,
    ObesityII,
    ObesityIII,
}

impl BmiClass {
    pub fn label(self) -> &'static str {
        match self {
            BmiClass::Underweight => "Abaixo do peso",
            BmiClass::Normal => "Peso normal",
            BmiClass::Overweight => "Sobrepeso",
            BmiClass::ObesityI => "Obesidade grau I",
            BmiClass::ObesityII => "Obesidade grau II",
            BmiClass::ObesityIII => "Obesidade grau III",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            BmiClass::Underweight | BmiClass::Overweight => Severity::Attention,
            BmiClass::Normal => Severity::Healthy,
            BmiClass::ObesityI => Severity::Moderate,
            BmiClass::ObesityII => Severity::High,
            BmiClass::ObesityIII => Severity::VeryHigh,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BmiClass::Underweight => "IMC abaixo do recomendado pela OMS",
            BmiClass::Normal => "IMC dentro da faixa saudável",
            BmiClass::Overweight => "IMC acima do recomendado",
            BmiClass::ObesityI => "Risco moderado para a saúde",
            BmiClass::ObesityII => "Risco alto para a saúde",
            BmiClass::ObesityIII => "Risco muito alto para a saúde",
        }
    }
}

/// Total over every `f64`; NaN lands in the last bucket since all comparisons fail.
pub fn classify_bmi(bmi: f64) -> BmiClass {
    if bmi < 18.5 {
        BmiClass::Underweight
    } else if bmi < 25.0 {
        BmiClass::Normal
    } else if bmi < 30.0 {
        BmiClass::Overweight
    } else if bmi < 35.0 {
        BmiClass::ObesityI
    } else if bmi < 40.0 {
        BmiClass::ObesityII
    } else {
        BmiClass::ObesityIII
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyLossPlan {
    pub min_kg_per_week: f64,
    pub max_kg_per_week: f64,
    pub kg_to_lose: f64,
    pub min_weeks: u32,
    pub max_weeks: u32,
}

/// Projection of how long the healthy loss rate takes to reach `goal_kg`.
pub fn weekly_loss_plan(current_kg: f64, goal_kg: f64) -> WeeklyLossPlan {
    let (min_rate, max_rate) = WEEKLY_LOSS_KG;
    let delta = current_kg - goal_kg;
    let kg_to_lose = if delta.is_finite() && delta > 0.0 { delta } else { 0.0 };
    // saturating float->int cast; only absurd inputs hit the ceiling
    let weeks = |rate: f64| (kg_to_lose / rate).ceil() as u32;
    WeeklyLossPlan {
        min_kg_per_week: min_rate,
        max_kg_per_week: max_rate,
        kg_to_lose,
        min_weeks: weeks(max_rate),
        max_weeks: weeks(min_rate),
    }
}

/// Rounds to `places` decimals for display.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
