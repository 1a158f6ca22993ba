//! Kanban board controller with optimistic task mutations.
//!
//! A mutation is applied to the in-memory snapshot immediately, then sent to
//! the remote gateway. On success the row returned by the server replaces the
//! optimistic one. On any failure the optimistic state is discarded and the
//! whole board is fetched again, so the displayed state always ends up equal to
//! what the server persisted.
//!
//! The three steps are exposed separately (`begin_move`, `PendingMutation::dispatch`,
//! `finish`) so a UI can render the optimistic state while the request is in
//! flight. `move_task` and `toggle_task` chain them for the common case.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use common::{BoardSnapshot, ProjectDto, TaskCategory, TaskDto};

use crate::gateway::{Confirm, GatewayError, Outcome};
use crate::generation::{Generation, Ticket};
use crate::progress::{TaskProgressInput, resolve_progress};

/// Remote operations the board relies on.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn fetch_board(&self) -> Result<BoardSnapshot, GatewayError>;

    async fn update_category(
        &self,
        task_id: i32,
        category: TaskCategory,
        expected_version: Option<i32>,
    ) -> Result<TaskDto, GatewayError>;

    async fn set_completed(
        &self,
        task_id: i32,
        completed: bool,
        expected_version: Option<i32>,
    ) -> Result<TaskDto, GatewayError>;

    async fn delete_task(&self, task_id: i32) -> Result<(), GatewayError>;
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Task {0} is not on the board")]
    UnknownTask(i32),

    /// The server refused the mutation; the board was reloaded.
    #[error("Mutation rejected: {0}")]
    Rejected(GatewayError),

    /// The board could not be fetched.
    #[error("Board reload failed: {0}")]
    Reload(GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Category(TaskCategory),
    Completed(bool),
}

/// An optimistic change that has been applied locally but not yet confirmed.
#[derive(Debug, Clone)]
#[must_use = "a pending mutation must be dispatched and finished"]
pub struct PendingMutation {
    task_id: i32,
    change: Change,
    expected_version: i32,
    previous: TaskDto,
}

impl PendingMutation {
    pub fn task_id(&self) -> i32 {
        self.task_id
    }

    /// Sends the change to the server.
    pub async fn dispatch<G: TaskGateway + ?Sized>(
        &self,
        gateway: &G,
    ) -> Result<TaskDto, GatewayError> {
        match self.change {
            Change::Category(category) => {
                gateway
                    .update_category(self.task_id, category, Some(self.expected_version))
                    .await
            }
            Change::Completed(completed) => {
                gateway
                    .set_completed(self.task_id, completed, Some(self.expected_version))
                    .await
            }
        }
    }
}

/// In-memory board state backed by a [`TaskGateway`].
pub struct TaskBoard<G> {
    gateway: G,
    snapshot: BoardSnapshot,
    loads: Generation,
}

impl<G: TaskGateway> TaskBoard<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            snapshot: BoardSnapshot::default(),
            loads: Generation::new(),
        }
    }

    /// Creates the board and performs the initial fetch.
    pub async fn load(gateway: G) -> Result<Self, BoardError> {
        let mut board = Self::new(gateway);
        board.reload().await?;
        Ok(board)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    pub fn task(&self, task_id: i32) -> Option<&TaskDto> {
        self.snapshot.tasks.iter().find(|t| t.id == task_id)
    }

    /// Tasks of one column in fetch order.
    pub fn column(&self, category: TaskCategory) -> Vec<&TaskDto> {
        self.snapshot
            .tasks
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    /// Progress of a project recomputed from the tasks currently on the board.
    pub fn project_progress(&self, project_id: i32) -> Option<i32> {
        let project: &ProjectDto = self.snapshot.projects.iter().find(|p| p.id == project_id)?;
        let tasks: Vec<TaskProgressInput> = self
            .snapshot
            .tasks
            .iter()
            .filter(|t| t.project_id == Some(project_id))
            .map(TaskProgressInput::from)
            .collect();
        Some(resolve_progress(project.manual_progress, &tasks))
    }

    /// Starts a reload. Any reload or mutation started later supersedes it.
    pub fn begin_reload(&self) -> Ticket {
        self.loads.issue()
    }

    /// Applies a fetched snapshot unless a newer load or mutation started in
    /// the meantime.
    pub fn apply_reload(&mut self, ticket: Ticket, snapshot: BoardSnapshot) -> bool {
        if !self.loads.is_current(ticket) {
            debug!(?ticket, "Dropping stale board snapshot");
            return false;
        }
        self.snapshot = snapshot;
        true
    }

    /// Fetches the whole board again.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<bool, BoardError> {
        let ticket = self.begin_reload();
        let snapshot = self
            .gateway
            .fetch_board()
            .await
            .map_err(BoardError::Reload)?;
        let applied = self.apply_reload(ticket, snapshot);
        debug!(applied, tasks = self.snapshot.tasks.len(), "Board reloaded");
        Ok(applied)
    }

    fn begin(&mut self, task_id: i32, change: Change) -> Result<PendingMutation, BoardError> {
        // Local edits supersede any fetch already in flight
        self.loads.issue();

        let task = self
            .snapshot
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(BoardError::UnknownTask(task_id))?;
        let previous = task.clone();

        match change {
            Change::Category(category) => task.category = category,
            Change::Completed(completed) => task.completed = completed,
        }
        debug!(task_id, ?change, "Applied optimistic change");

        Ok(PendingMutation {
            task_id,
            change,
            expected_version: previous.version,
            previous,
        })
    }

    /// Moves a task to another column locally. Every column, including the
    /// current one, is a valid target.
    pub fn begin_move(
        &mut self,
        task_id: i32,
        category: TaskCategory,
    ) -> Result<PendingMutation, BoardError> {
        self.begin(task_id, Change::Category(category))
    }

    pub fn begin_toggle(
        &mut self,
        task_id: i32,
        completed: bool,
    ) -> Result<PendingMutation, BoardError> {
        self.begin(task_id, Change::Completed(completed))
    }

    /// Reconciles a dispatched mutation with the server's answer.
    #[instrument(skip(self, pending, result), fields(task_id = pending.task_id))]
    pub async fn finish(
        &mut self,
        pending: PendingMutation,
        result: Result<TaskDto, GatewayError>,
    ) -> Result<TaskDto, BoardError> {
        match result {
            Ok(row) => {
                if let Some(task) = self.snapshot.tasks.iter_mut().find(|t| t.id == row.id) {
                    *task = row.clone();
                }
                info!(version = row.version, "Task mutation confirmed");
                Ok(row)
            }
            Err(err) => {
                warn!(error = %err, "Task mutation rejected, reloading board");
                match self.reload().await {
                    Ok(_) => Err(BoardError::Rejected(err)),
                    Err(reload_err) => {
                        self.restore(pending.previous);
                        Err(reload_err)
                    }
                }
            }
        }
    }

    fn restore(&mut self, previous: TaskDto) {
        match self.snapshot.tasks.iter_mut().find(|t| t.id == previous.id) {
            Some(task) => *task = previous,
            None => self.snapshot.tasks.push(previous),
        }
    }

    pub async fn move_task(
        &mut self,
        task_id: i32,
        category: TaskCategory,
    ) -> Result<TaskDto, BoardError> {
        let pending = self.begin_move(task_id, category)?;
        let result = pending.dispatch(&self.gateway).await;
        self.finish(pending, result).await
    }

    pub async fn toggle_task(&mut self, task_id: i32, completed: bool) -> Result<TaskDto, BoardError> {
        let pending = self.begin_toggle(task_id, completed)?;
        let result = pending.dispatch(&self.gateway).await;
        self.finish(pending, result).await
    }

    /// Deletes a task after the user confirmed. A declined confirmation leaves
    /// the board untouched and issues no remote call.
    #[instrument(skip(self, confirm))]
    pub async fn delete_task(
        &mut self,
        task_id: i32,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, BoardError> {
        let position = self
            .snapshot
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or(BoardError::UnknownTask(task_id))?;

        let prompt = format!("Delete task \"{}\"?", self.snapshot.tasks[position].title);
        if !confirm.confirm(&prompt) {
            debug!("Task deletion cancelled");
            return Ok(Outcome::Cancelled);
        }

        self.loads.issue();
        let removed = self.snapshot.tasks.remove(position);

        match self.gateway.delete_task(task_id).await {
            Ok(()) => {
                info!("Task deleted");
                Ok(Outcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "Task deletion rejected, reloading board");
                match self.reload().await {
                    Ok(_) => Err(BoardError::Rejected(err)),
                    Err(reload_err) => {
                        let position = position.min(self.snapshot.tasks.len());
                        self.snapshot.tasks.insert(position, removed);
                        Err(reload_err)
                    }
                }
            }
        }
    }
}
