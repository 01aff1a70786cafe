use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Body mass index from weight in kilograms and height in centimeters.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Daily calorie target: Harris-Benedict BMR scaled by activity, with a
/// 500 kcal deficit to lose or a 300 kcal surplus to gain.
pub fn daily_calories(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
    activity: ActivityLevel,
    goal: Goal,
) -> u32 {
    let age = f64::from(age);
    let bmr = match gender {
        Gender::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Gender::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    };
    let tdee = bmr * activity.multiplier();
    let adjusted = match goal {
        Goal::Lose => tdee - 500.0,
        Goal::Maintain => tdee,
        Goal::Gain => tdee + 300.0,
    };
    adjusted.round().max(0.0) as u32
}

/// Daily grams of protein, carbohydrate and fat at 4/4/9 kcal per gram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroSplit {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
}

pub fn macro_split(calories: u32, goal: Goal) -> MacroSplit {
    let (protein, carbs, fat) = match goal {
        Goal::Lose => (0.35, 0.35, 0.30),
        Goal::Maintain => (0.30, 0.40, 0.30),
        Goal::Gain => (0.30, 0.45, 0.25),
    };
    let calories = f64::from(calories);
    MacroSplit {
        protein_g: (calories * protein / 4.0).round() as u32,
        carbs_g: (calories * carbs / 4.0).round() as u32,
        fat_g: (calories * fat / 9.0).round() as u32,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub current_weight_kg: f64,
    pub height_cm: f64,
    pub goal_weight_kg: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

/// A computed onboarding plan: goal inference, calorie and macro targets,
/// and a rough time-to-goal estimate at 0.75 kg per week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonalizedPlan {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub weight_delta_kg: f64,
    pub goal: Goal,
    pub daily_calories: u32,
    pub macros: MacroSplit,
    pub estimated_months: u32,
}

impl PersonalizedPlan {
    pub fn generate(metrics: &UserMetrics) -> Self {
        let bmi_value = bmi(metrics.current_weight_kg, metrics.height_cm);
        let delta = metrics.current_weight_kg - metrics.goal_weight_kg;
        let goal = if delta > 0.0 {
            Goal::Lose
        } else if delta < 0.0 {
            Goal::Gain
        } else {
            Goal::Maintain
        };
        let calories = daily_calories(
            metrics.current_weight_kg,
            metrics.height_cm,
            metrics.age,
            metrics.gender,
            metrics.activity_level,
            goal,
        );
        let weeks = delta.abs() / 0.75;
        Self {
            bmi: (bmi_value * 10.0).round() / 10.0,
            bmi_category: bmi_category(bmi_value),
            weight_delta_kg: delta.abs(),
            goal,
            daily_calories: calories,
            macros: macro_split(calories, goal),
            estimated_months: (weeks / 4.0).ceil() as u32,
        }
    }
}
