use crate::health::bmi;

pub fn build_prompt(current_weight: f64, goal_weight: f64, height_cm: f64) -> String {
    let weight_diff = current_weight - goal_weight;
    let bmi_current = bmi(current_weight, height_cm);
    let bmi_goal = bmi(goal_weight, height_cm);

    format!(
        "Transform this full-body photo to show a realistic visualization of the person after \
         losing {weight_diff:.1}kg. Current weight: {current_weight}kg (BMI {bmi_current:.1}), \
         Goal weight: {goal_weight}kg (BMI {bmi_goal:.1}). Make subtle, natural changes \
         focusing on: reduced body fat, more defined features, healthier appearance. Maintain \
         the same pose, clothing, and background. Keep it realistic and encouraging."
    )
}
