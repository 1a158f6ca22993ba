//! Shapes exchanged by the task board and the client roster.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::analytics::ClientTotals;

/// One of the four urgency/importance buckets a task can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    DoNow,
    Schedule,
    Delegate,
    Delete,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::DoNow,
        TaskCategory::Schedule,
        TaskCategory::Delegate,
        TaskCategory::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::DoNow => "do_now",
            TaskCategory::Schedule => "schedule",
            TaskCategory::Delegate => "delegate",
            TaskCategory::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskDto {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub completed: bool,
    pub client_id: Option<i32>,
    pub project_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
    /// Incremented by the server on every mutation
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectDto {
    pub id: i32,
    pub client_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    /// Manually stored percentage
    pub manual_progress: i32,
    /// Displayed percentage: derived from tasks once any exist
    pub progress: i32,
    pub task_count: i64,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GoalDto {
    pub id: i32,
    pub client_id: Option<i32>,
    pub title: String,
    pub target_value: Decimal,
    pub current_value: Decimal,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientDto {
    pub id: i32,
    pub name: String,
    pub industry: Option<String>,
    pub status: ClientStatus,
    pub target_roas: Option<Decimal>,
    pub crm_enabled: bool,
    /// Present when the listing was computed for a date window
    pub totals: Option<ClientTotals>,
}

/// Everything the kanban view loads at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoardSnapshot {
    pub tasks: Vec<TaskDto>,
    pub projects: Vec<ProjectDto>,
    pub goals: Vec<GoalDto>,
    pub clients: Vec<ClientDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MoveTaskRequest {
    pub category: TaskCategory,
    /// When present, the move is rejected if the stored version differs
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToggleTaskRequest {
    pub completed: bool,
    pub expected_version: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn categories_use_their_wire_names() {
        for category in TaskCategory::ALL {
            assert_eq!(serde_json::to_value(category).unwrap(), json!(category.as_str()));
        }
    }

    #[test]
    fn money_travels_as_strings() {
        let goal = GoalDto {
            id: 1,
            client_id: None,
            title: "Leads".to_string(),
            target_value: Decimal::new(150050, 2),
            current_value: Decimal::ZERO,
            deadline: None,
        };
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["target_value"], json!("1500.50"));

        let back: GoalDto = serde_json::from_value(value).unwrap();
        assert_eq!(back, goal);
    }

    #[test]
    fn move_request_without_version_is_accepted() {
        let request: MoveTaskRequest =
            serde_json::from_value(json!({ "category": "delegate" })).unwrap();
        assert_eq!(request.category, TaskCategory::Delegate);
        assert_eq!(request.expected_version, None);
    }
}
