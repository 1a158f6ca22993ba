use common::{ClientDto, ClientTotals, GoalDto, ProjectDto, TaskDto};
use compute::progress::{TaskProgressInput, resolve_progress};
use model::entities::{client, goal, project, task};

/// Convert a task row into its transport shape
pub fn task_to_dto(model: task::Model) -> TaskDto {
    TaskDto {
        id: model.id,
        title: model.title,
        description: model.description,
        category: model.category.into(),
        completed: model.completed,
        client_id: model.client_id,
        project_id: model.project_id,
        due_date: model.due_date,
        version: model.version,
    }
}

/// Convert a project row, resolving its progress from the tasks linked to it.
/// `tasks` may contain tasks of other projects.
pub fn project_to_dto(model: project::Model, tasks: &[task::Model]) -> ProjectDto {
    let linked: Vec<TaskProgressInput> = tasks
        .iter()
        .filter(|t| t.project_id == Some(model.id))
        .map(TaskProgressInput::from)
        .collect();

    ProjectDto {
        id: model.id,
        client_id: model.client_id,
        progress: resolve_progress(model.progress, &linked),
        manual_progress: model.progress,
        task_count: linked.len() as i64,
        name: model.name,
        description: model.description,
        deadline: model.deadline,
    }
}

pub fn goal_to_dto(model: goal::Model) -> GoalDto {
    GoalDto {
        id: model.id,
        client_id: model.client_id,
        title: model.title,
        target_value: model.target_value,
        current_value: model.current_value,
        deadline: model.deadline,
    }
}

pub fn client_to_dto(model: client::Model, totals: Option<ClientTotals>) -> ClientDto {
    ClientDto {
        id: model.id,
        name: model.name,
        industry: model.industry,
        status: model.status.into(),
        target_roas: model.target_roas,
        crm_enabled: model.crm_enabled,
        totals,
    }
}
