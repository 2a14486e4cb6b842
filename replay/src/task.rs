//! Analysis task pipeline.
//!
//! A [`Task`] is one unit of an analysis run with prepare/execute/finish
//! phases. A [`CompoundTask`] sequences owned child tasks, stopping at the
//! first failure; compound tasks nest, forming the task tree of a full
//! analysis. [`ReplayTask`] adapts a single replay pass to the task
//! interface.

use reverb_core::LocalTrace;
use thiserror::Error;

use crate::{
    callback::{CallbackData, CallbackManager, ReplayError},
    driver::{backward_replay, forward_replay},
};

// TASK ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("task failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

// TASK
// ================================================================================================

/// One step of an analysis pipeline.
///
/// A failing phase aborts the surrounding pipeline; see [`CompoundTask`] for
/// the exact sequencing.
pub trait Task {
    /// Pre-execution hook.
    fn prepare(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Performs the actual work of the task.
    fn execute(&mut self) -> Result<(), TaskError>;

    /// Post-execution hook.
    fn finish(&mut self) -> Result<(), TaskError> {
        Ok(())
    }
}

// COMPOUND TASK
// ================================================================================================

/// Executes a list of owned subtasks in insertion order.
///
/// `execute` runs `prepare`, then each child's `execute` (recording the
/// child's position in `current_step` and stopping at the first error), and
/// `finish`. `finish` runs iff `prepare` succeeded, also when a child
/// failed; a child error takes precedence over a `finish` error.
pub struct CompoundTask<'a> {
    tasks: Vec<Box<dyn Task + 'a>>,
    current_step: u32,
    prepare_hook: Option<Box<dyn FnMut() -> Result<(), TaskError> + 'a>>,
    finish_hook: Option<Box<dyn FnMut() -> Result<(), TaskError> + 'a>>,
}

impl<'a> CompoundTask<'a> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            current_step: 0,
            prepare_hook: None,
            finish_hook: None,
        }
    }

    /// Appends a subtask; the compound task takes ownership.
    pub fn add_task(&mut self, task: impl Task + 'a) {
        self.tasks.push(Box::new(task));
    }

    /// Installs a hook running before the first subtask.
    pub fn on_prepare(&mut self, hook: impl FnMut() -> Result<(), TaskError> + 'a) {
        self.prepare_hook = Some(Box::new(hook));
    }

    /// Installs a hook running after the subtasks; it runs iff the prepare
    /// phase succeeded, also when a subtask failed.
    pub fn on_finish(&mut self, hook: impl FnMut() -> Result<(), TaskError> + 'a) {
        self.finish_hook = Some(Box::new(hook));
    }

    /// Number of subtasks.
    pub fn num_steps(&self) -> u32 {
        self.tasks.len() as u32
    }

    /// Position of the subtask currently (or last) executed.
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    fn execute_steps(&mut self) -> Result<(), TaskError> {
        for (step, task) in self.tasks.iter_mut().enumerate() {
            self.current_step = step as u32;
            task.execute()?;
        }
        Ok(())
    }
}

impl Task for CompoundTask<'_> {
    fn prepare(&mut self) -> Result<(), TaskError> {
        match &mut self.prepare_hook {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    #[tracing::instrument(skip_all, fields(steps = self.tasks.len()))]
    fn execute(&mut self) -> Result<(), TaskError> {
        self.prepare()?;
        let result = self.execute_steps();
        let finished = self.finish();
        result.and(finished)
    }

    fn finish(&mut self) -> Result<(), TaskError> {
        match &mut self.finish_hook {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}

impl Default for CompoundTask<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// REPLAY TASK
// ================================================================================================

/// Direction of a replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A task running one replay of a trace with a fixed callback manager and
/// shared data.
pub struct ReplayTask<'t, D: CallbackData> {
    trace: &'t LocalTrace,
    cbmanager: &'t CallbackManager<D>,
    data: &'t mut D,
    direction: Direction,
}

impl<'t, D: CallbackData> ReplayTask<'t, D> {
    pub fn new(
        trace: &'t LocalTrace,
        cbmanager: &'t CallbackManager<D>,
        data: &'t mut D,
        direction: Direction,
    ) -> Self {
        Self { trace, cbmanager, data, direction }
    }
}

impl<D: CallbackData> Task for ReplayTask<'_, D> {
    fn execute(&mut self) -> Result<(), TaskError> {
        match self.direction {
            Direction::Forward => forward_replay(self.trace, self.cbmanager, &mut *self.data)?,
            Direction::Backward => backward_replay(self.trace, self.cbmanager, &mut *self.data)?,
        }
        Ok(())
    }
}
