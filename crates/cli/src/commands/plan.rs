use anyhow::Result;
use casker_core::reporting::get_task_color;
use casker_core::TaskManager;
use colored::*;

pub fn execute(manager: &TaskManager, task: &str) -> Result<()> {
    println!("{} {}", "Execution plan for".bold(), task.cyan());

    let plan = manager.get_execution_plan(task)?;

    println!("\n{}:", "Stages".bold());
    for (i, stage) in plan.stages.iter().enumerate() {
        let names = stage
            .iter()
            .map(|name| name.color(get_task_color(name)).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {}. {}", i + 1, names);
    }

    Ok(())
}
