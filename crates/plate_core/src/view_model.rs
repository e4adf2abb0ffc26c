use crate::{AnalysisPhase, MealResult, View};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub view: View,
    pub login: LoginView,
    pub capture: CaptureView,
    pub analysis: Option<AnalysisView>,
    pub results: ResultsView,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginView {
    pub name: String,
    pub email: String,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureView {
    pub file_name: Option<String>,
    pub preview: Option<String>,
    pub uploading: bool,
}

impl CaptureView {
    /// The analyze action is offered only once a photo is selected.
    pub fn can_submit(&self) -> bool {
        self.file_name.is_some() && !self.uploading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisView {
    pub phase: AnalysisPhase,
    pub progress: u8,
    pub failed: bool,
}

/// What the results screen shows: the meals or the restart-only fallback.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsView {
    #[default]
    Empty,
    Meals(Vec<MealCard>),
}

impl ResultsView {
    pub fn from_meals(meals: Option<&[MealResult]>) -> Self {
        match meals {
            Some(meals) if !meals.is_empty() => {
                ResultsView::Meals(meals.iter().map(MealCard::from_meal).collect())
            }
            _ => ResultsView::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealCard {
    pub name: String,
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ai_insights: String,
    pub tips: Vec<NumberedTip>,
}

impl MealCard {
    fn from_meal(meal: &MealResult) -> Self {
        Self {
            name: meal.name.clone(),
            calories: meal.calories,
            proteins: meal.proteins,
            carbs: meal.carbs,
            fats: meal.fats,
            ai_insights: meal.ai_insights.clone(),
            tips: meal
                .tips
                .iter()
                .enumerate()
                .map(|(index, text)| NumberedTip {
                    number: index + 1,
                    text: text.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedTip {
    pub number: usize,
    pub text: String,
}
