use crate::core::executor::{RunResult, TaskState};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Success,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Success => style(text).green().bold(),
        StyleType::Error => style(text).red().bold(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Colors a task state: green success, red failure, grey skip.
pub fn state_cell(state: &TaskState) -> Cell {
    let color = match state {
        TaskState::Success => Color::Green,
        TaskState::Failed { .. } => Color::Red,
        TaskState::Skipped { .. } => Color::DarkGrey,
    };
    Cell::new(state.to_string()).fg(color)
}

pub fn render_run(result: &RunResult) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Task"),
        header_cell("State"),
        header_cell("Attempts"),
        header_cell("Duration"),
        header_cell("Detail"),
    ]);

    for task in &result.tasks {
        let detail = match &task.state {
            TaskState::Success => String::new(),
            TaskState::Failed { error } => error.clone(),
            TaskState::Skipped { blocked_by } => format!("upstream {blocked_by} did not succeed"),
        };
        table.add_row(vec![
            Cell::new(&task.id),
            state_cell(&task.state),
            Cell::new(task.attempts).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}s", task.duration.as_secs_f64()))
                .set_alignment(CellAlignment::Right),
            Cell::new(detail),
        ]);
    }

    let status = if result.is_success() {
        style_text("SUCCESS", StyleType::Success)
    } else {
        style_text("FAILED", StyleType::Error)
    };
    format!(
        "Run {} for {}: {}\n\n{}\n",
        style_text(&result.run_id, StyleType::Subtle),
        style_text(&result.scheduled_date.to_string(), StyleType::Title),
        status,
        table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::{RunStatus, TaskReport};
    use chrono::NaiveDate;
    use std::time::Duration;

    #[test]
    fn test_render_run_lists_every_task() {
        console::set_colors_enabled(false);
        let result = RunResult {
            run_id: "2024-01-01_x".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: RunStatus::Failed,
            tasks: vec![
                TaskReport {
                    id: "download_rates".to_string(),
                    state: TaskState::Failed { error: "boom".to_string() },
                    attempts: 4,
                    duration: Duration::from_millis(1500),
                },
                TaskReport {
                    id: "bulk_copy".to_string(),
                    state: TaskState::Skipped { blocked_by: "download_rates".to_string() },
                    attempts: 0,
                    duration: Duration::ZERO,
                },
            ],
        };

        let output = render_run(&result);
        assert!(output.contains("FAILED"));
        assert!(output.contains("download_rates"));
        assert!(output.contains("boom"));
        assert!(output.contains("bulk_copy"));
    }
}
