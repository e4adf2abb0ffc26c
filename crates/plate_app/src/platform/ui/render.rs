use plate_core::{
    AnalysisPhase, AnalysisView, AppViewModel, MealCard, Notification, ResultsView, Severity,
    View,
};

use super::constants::*;
use super::input::LoginPrompt;

/// Produces the lines to print for `view`, given the last frame shown.
///
/// A view change redraws the whole screen; otherwise only what changed is
/// printed.
pub fn render(previous: Option<&AppViewModel>, view: &AppViewModel) -> Vec<String> {
    match previous {
        Some(previous) if previous.view == view.view => render_changes(previous, view),
        _ => render_screen(view),
    }
}

pub fn notification_line(notification: Notification) -> String {
    format!("[{}] {}", notification.title(), notification.description())
}

pub fn is_error(notification: Notification) -> bool {
    notification.severity() == Severity::Error
}

pub fn prompt(view: View, login: LoginPrompt) -> &'static str {
    match (view, login) {
        (View::Login, LoginPrompt::Name) => "name> ",
        (View::Login, LoginPrompt::Email) => "email> ",
        (View::Capture, _) => "photo> ",
        (View::Analyzing, _) | (View::Results, _) => "> ",
    }
}

fn render_screen(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![String::new()];
    match view.view {
        View::Login => {
            lines.push("== Welcome to Plate ==".to_string());
            lines.push("Enter your name and email to start your wellness journey.".to_string());
            if view.login.submitting {
                lines.push("Signing in...".to_string());
            }
        }
        View::Capture => {
            lines.push("== Capture your meal ==".to_string());
            lines.push(format!(
                "Enter the path of a JPG, JPEG or PNG photo, then `{CMD_ANALYZE}`."
            ));
            if let Some(line) = selection_line(view) {
                lines.push(line);
            }
            if view.capture.uploading {
                lines.push("Uploading...".to_string());
            }
        }
        View::Analyzing => {
            lines.push("== Analyzing your meal ==".to_string());
            lines.push(format!("Type `{CMD_BACK}` to pick another photo."));
            if let Some(analysis) = &view.analysis {
                lines.push(progress_line(analysis));
                if analysis.failed {
                    lines.push(failed_line());
                }
            }
        }
        View::Results => {
            lines.push("== Your meal ==".to_string());
            lines.extend(results_lines(&view.results));
            lines.push(format!("Type `{CMD_NEW}` to analyze another meal."));
        }
    }
    lines
}

fn render_changes(previous: &AppViewModel, view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    match view.view {
        View::Login => {
            if view.login.submitting && !previous.login.submitting {
                lines.push("Signing in...".to_string());
            }
        }
        View::Capture => {
            if view.capture.file_name != previous.capture.file_name {
                lines.extend(selection_line(view));
            }
            if view.capture.uploading && !previous.capture.uploading {
                lines.push("Uploading...".to_string());
            }
        }
        View::Analyzing => {
            if let Some(analysis) = &view.analysis {
                let before = previous.analysis.as_ref();
                let moved = before
                    .map(|run| run.progress != analysis.progress || run.phase != analysis.phase)
                    .unwrap_or(true);
                if moved && !analysis.failed {
                    lines.push(progress_line(analysis));
                }
                if analysis.failed && !before.map(|run| run.failed).unwrap_or(false) {
                    lines.push(failed_line());
                }
            }
        }
        View::Results => {
            if view.results != previous.results {
                lines.extend(results_lines(&view.results));
            }
        }
    }
    lines
}

fn selection_line(view: &AppViewModel) -> Option<String> {
    let file_name = view.capture.file_name.as_ref()?;
    let preview = match &view.capture.preview {
        Some(preview) => format!("preview ready, {} bytes encoded", preview.len()),
        None => "no preview".to_string(),
    };
    if view.capture.can_submit() {
        Some(format!(
            "Selected {file_name} ({preview}). Type `{CMD_ANALYZE}` to upload."
        ))
    } else {
        Some(format!("Selected {file_name} ({preview})."))
    }
}

fn progress_line(analysis: &AnalysisView) -> String {
    let filled = usize::from(analysis.progress.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled),
        analysis.progress,
        phase_label(analysis.phase)
    )
}

fn phase_label(phase: AnalysisPhase) -> &'static str {
    match phase {
        AnalysisPhase::Initializing => "Starting analysis",
        AnalysisPhase::Polling => "Analyzing",
        AnalysisPhase::FetchingResults => "Fetching results",
        AnalysisPhase::Done => "Done",
        AnalysisPhase::Failed => "Failed",
    }
}

fn failed_line() -> String {
    format!("Analysis stopped. Type `{CMD_BACK}` to try another photo.")
}

fn results_lines(results: &ResultsView) -> Vec<String> {
    match results {
        ResultsView::Empty => vec!["No meal data available.".to_string()],
        ResultsView::Meals(cards) => cards.iter().flat_map(card_lines).collect(),
    }
}

fn card_lines(card: &MealCard) -> Vec<String> {
    let mut lines = vec![
        format!("-- {} --", card.name),
        format!(
            "Calories: {} | Protein: {}g | Carbs: {}g | Fats: {}g",
            card.calories, card.proteins, card.carbs, card.fats
        ),
        "AI Insights".to_string(),
        format!("  {}", card.ai_insights),
    ];
    if !card.tips.is_empty() {
        lines.push("Tips".to_string());
        lines.extend(
            card.tips
                .iter()
                .map(|tip| format!("  {}. {}", tip.number, tip.text)),
        );
    }
    lines
}
