//! Project progress derived from linked tasks.

/// Completion state of one task linked to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProgressInput {
    pub completed: bool,
}

impl From<&common::TaskDto> for TaskProgressInput {
    fn from(task: &common::TaskDto) -> Self {
        Self {
            completed: task.completed,
        }
    }
}

impl From<&model::entities::task::Model> for TaskProgressInput {
    fn from(task: &model::entities::task::Model) -> Self {
        Self {
            completed: task.completed,
        }
    }
}

/// Resolves the progress shown for a project.
///
/// Without linked tasks the stored manual value is returned as is. Otherwise
/// the percentage of completed tasks wins, rounded half away from zero.
pub fn resolve_progress(manual: i32, tasks: &[TaskProgressInput]) -> i32 {
    let total = tasks.len() as i64;
    if total == 0 {
        return manual;
    }
    let completed = tasks.iter().filter(|t| t.completed).count() as i64;

    // round(100 * completed / total) in integers; all terms are non-negative
    ((200 * completed + total) / (2 * total)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(completed: usize, open: usize) -> Vec<TaskProgressInput> {
        std::iter::repeat(TaskProgressInput { completed: true })
            .take(completed)
            .chain(std::iter::repeat(TaskProgressInput { completed: false }).take(open))
            .collect()
    }

    #[test]
    fn test_manual_value_without_tasks() {
        assert_eq!(resolve_progress(0, &[]), 0);
        assert_eq!(resolve_progress(37, &[]), 37);
        assert_eq!(resolve_progress(100, &[]), 100);
    }

    #[test]
    fn test_tasks_override_manual_value() {
        assert_eq!(resolve_progress(90, &tasks(0, 4)), 0);
        assert_eq!(resolve_progress(10, &tasks(4, 0)), 100);
        assert_eq!(resolve_progress(55, &tasks(1, 3)), 25);
    }

    #[test]
    fn test_rounding() {
        // 1/3 -> 33.33, 2/3 -> 66.67, 1/8 -> 12.5, 5/8 -> 62.5
        assert_eq!(resolve_progress(0, &tasks(1, 2)), 33);
        assert_eq!(resolve_progress(0, &tasks(2, 1)), 67);
        assert_eq!(resolve_progress(0, &tasks(1, 7)), 13);
        assert_eq!(resolve_progress(0, &tasks(5, 3)), 63);
    }
}
