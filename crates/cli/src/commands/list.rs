use anyhow::Result;
use casker_core::reporting::get_task_color;
use casker_core::results::TaskKind;
use casker_core::TaskManager;
use colored::*;

pub fn execute(manager: &TaskManager) -> Result<()> {
    let result = manager.list_tasks();

    println!("{}", "Tasks".bold().underline());

    if result.tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }

    for task in &result.tasks {
        let tag = match task.kind {
            TaskKind::Task if task.is_long_running => "[long-running]".cyan(),
            TaskKind::Task => "".normal(),
            TaskKind::ParallelGroup => "[parallel]".blue(),
            TaskKind::SeriesGroup => "[series]".blue(),
        };

        println!(
            "{}: {} {}",
            task.name.color(get_task_color(&task.name)).bold(),
            task.description,
            tag
        );
    }
    println!();

    Ok(())
}
