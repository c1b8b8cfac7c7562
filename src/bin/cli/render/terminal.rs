use recall_lib::recall::{Recall, RecallState};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const GRAY: &str = "\x1b[90m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn state_name(state: RecallState) -> &'static str {
    match state {
        RecallState::New => "new",
        RecallState::SeenUnreviewed => "seen",
        RecallState::Failed => "failed",
        RecallState::ReviewedToday => "today",
        RecallState::Pending => "pending",
        RecallState::Due => "due",
        RecallState::Overdue => "overdue",
    }
}

fn state_color(state: RecallState) -> &'static str {
    match state {
        RecallState::Failed => Color::RED,
        RecallState::Overdue => Color::MAGENTA,
        RecallState::Due => Color::YELLOW,
        RecallState::Pending => Color::BLUE,
        RecallState::ReviewedToday => Color::GREEN,
        RecallState::New | RecallState::SeenUnreviewed => Color::GRAY,
    }
}

/// `state (ratio)`, padded for column output
pub fn render_recall(recall: &Recall, use_color: bool) -> String {
    let state = format!("{:<8}", state_name(recall.state));
    format!(
        "{} {:>4.2}",
        paint(&state, state_color(recall.state), use_color),
        recall.ratio
    )
}

/// Horizontal bar scaled to `max`
pub fn render_bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (count * width + max - 1) / max;
    "#".repeat(filled.min(width))
}
