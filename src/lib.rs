// Alarm clock core: dismissal tasks and alarm state
pub mod config;  // Environment configuration
pub mod error;   // Task / alarm error types
pub mod logic;   // Task generation and verification
pub mod models;  // Alarm data structures and form defaults
pub mod session; // One dismissal attempt (attempts, elapsed time)
pub mod state;   // Alarm reducer and subscribe/dispatch store
pub mod store;   // Persistence collaborators (JSON file, memory)

pub use config::Config;
pub use error::{AlarmError, TaskError};
pub use logic::{generate_task, typing_accuracy, verify_submission, Task, Verification};
pub use models::{Alarm, AlarmDraft, AlarmId, Frequency, Schedule, TaskDifficulty, TaskType};
pub use session::{DismissSession, SubmitOutcome, TaskResult};
pub use state::{reduce_alarms, AlarmAction, AlarmState, AlarmStore};
pub use store::{AlarmStorage, JsonFileStorage, MemoryStorage, StorageError};
