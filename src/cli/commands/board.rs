use anyhow::Result;
use common::TaskCategory;
use compute::TaskBoard;
use tracing::{info, trace};

use crate::gateway::HttpGateway;

/// Print the kanban board of an organization as served by a running instance.
pub async fn show_board(server_url: &str, organization_id: i32) -> Result<()> {
    trace!("Entering show_board function");
    let gateway = HttpGateway::new(server_url, organization_id)?;
    let board = TaskBoard::load(gateway).await?;
    info!(
        organization_id = board.gateway().organization_id(),
        tasks = board.snapshot().tasks.len(),
        "Board loaded"
    );

    for category in TaskCategory::ALL {
        let column = board.column(category);
        println!("{:?} ({})", category, column.len());
        for task in column {
            let mark = if task.completed { "x" } else { " " };
            println!("  [{}] #{} {}", mark, task.id, task.title);
        }
    }

    for project in &board.snapshot().projects {
        let progress = board.project_progress(project.id).unwrap_or(project.progress);
        println!("Project {}: {}%", project.name, progress);
    }
    Ok(())
}
