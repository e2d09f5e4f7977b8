use crate::cli::ui;
use crate::core::executor::Executor;
use comfy_table::{Cell, CellAlignment};

/// Tasks in execution order with their upstream tasks and retry policy.
pub fn render_graph(executor: &Executor) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Task"),
        ui::header_cell("Depends on"),
        ui::header_cell("Max attempts"),
        ui::header_cell("Retry delay"),
    ]);

    for (position, task) in executor.ordered_tasks().enumerate() {
        table.add_row(vec![
            Cell::new(position + 1).set_alignment(CellAlignment::Right),
            Cell::new(&task.id),
            Cell::new(task.depends_on.join(", ")),
            Cell::new(task.retry.max_attempts()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:?}", task.retry.delay)),
        ]);
    }

    format!(
        "Graph: {}\n\n{}\n",
        ui::style_text(executor.graph().name(), ui::StyleType::Title),
        table
    )
}
