use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TaskError;
use crate::logic::{self, Task};
use crate::models::{Alarm, TaskDifficulty, TaskType};

// Reported once the user passes the dismissal task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub completed: bool,
    pub attempts: u32,   // failed submissions before the correct one
    pub time_spent: u64, // whole seconds since the session started
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    // Wrong answer. The task stays the same and the input should be cleared.
    Incorrect { attempts: u32, accuracy: Option<f64> },
    Completed(TaskResult),
}

// One dismissal attempt: a task generated once, plus the attempt counter
// and the moment it was first shown.
#[derive(Debug, Clone)]
pub struct DismissSession {
    task: Task,
    started_at: DateTime<Utc>,
    attempts: u32,
    result: Option<TaskResult>,
}

impl DismissSession {
    pub fn start(task_type: TaskType, difficulty: TaskDifficulty) -> Result<Self, TaskError> {
        let task = logic::generate_task(task_type, difficulty)?;
        Ok(Self::with_task(task, Utc::now()))
    }

    pub fn for_alarm(alarm: &Alarm) -> Result<Self, TaskError> {
        Self::start(alarm.task_type, alarm.task_difficulty)
    }

    pub fn with_task(task: Task, started_at: DateTime<Utc>) -> Self {
        Self {
            task,
            started_at,
            attempts: 0,
            result: None,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn result(&self) -> Option<TaskResult> {
        self.result
    }

    pub fn submit(&mut self, input: &str) -> Result<SubmitOutcome, TaskError> {
        self.submit_at(input, Utc::now())
    }

    pub fn submit_at(&mut self, input: &str, now: DateTime<Utc>) -> Result<SubmitOutcome, TaskError> {
        if self.result.is_some() {
            return Err(TaskError::SessionCompleted);
        }

        let verification = logic::verify_submission(&self.task, input);
        if !verification.is_correct {
            self.attempts += 1;
            debug!(attempts = self.attempts, "incorrect dismissal answer");
            return Ok(SubmitOutcome::Incorrect {
                attempts: self.attempts,
                accuracy: verification.accuracy,
            });
        }

        let time_spent = (now - self.started_at).num_seconds().max(0) as u64;
        let result = TaskResult {
            completed: true,
            attempts: self.attempts,
            time_spent,
        };
        info!(attempts = result.attempts, time_spent, "dismissal task completed");
        self.result = Some(result);
        Ok(SubmitOutcome::Completed(result))
    }
}
