use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AlarmError;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Opaque alarm identifier, random so rapid creation can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(Uuid);

impl AlarmId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlarmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AlarmId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Math,
    Puzzle,
    Typing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Custom,
}

// Display / FromStr use the same lowercase names as the JSON form
macro_rules! keyword_enum {
    ($ty:ty, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", $what)),
                }
            }
        }
    };
}

keyword_enum!(TaskType, "task type", { Math => "math", Puzzle => "puzzle", Typing => "typing" });
keyword_enum!(TaskDifficulty, "difficulty", { Easy => "easy", Medium => "medium", Hard => "hard" });
keyword_enum!(Frequency, "frequency", {
    Once => "once",
    Daily => "daily",
    Weekly => "weekly",
    Custom => "custom",
});

/// Recurrence of an alarm. Only the variant that uses days or dates
/// carries them, so both can never be populated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum Schedule {
    Once,
    Daily,
    Weekly {
        #[serde(rename = "daysOfWeek")]
        days_of_week: BTreeSet<u8>, // 0 = Sunday .. 6 = Saturday
    },
    Custom {
        #[serde(rename = "customDates")]
        custom_dates: Vec<DateTime<FixedOffset>>,
    },
}

impl Schedule {
    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Once => Frequency::Once,
            Schedule::Daily => Frequency::Daily,
            Schedule::Weekly { .. } => Frequency::Weekly,
            Schedule::Custom { .. } => Frequency::Custom,
        }
    }

    pub fn validate(&self) -> Result<(), AlarmError> {
        match self {
            Schedule::Weekly { days_of_week } => {
                if days_of_week.is_empty() {
                    return Err(AlarmError::Invalid("weekly alarm needs at least one day".into()));
                }
                if let Some(day) = days_of_week.iter().find(|d| **d > 6) {
                    return Err(AlarmError::Invalid(format!("weekday index out of range: {day}")));
                }
            }
            Schedule::Custom { custom_dates } if custom_dates.is_empty() => {
                return Err(AlarmError::Invalid("custom alarm needs at least one date".into()));
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Once | Schedule::Daily => f.write_str(self.frequency().as_str()),
            Schedule::Weekly { days_of_week } => {
                let days: Vec<&str> = days_of_week
                    .iter()
                    .filter_map(|d| WEEKDAY_NAMES.get(usize::from(*d)).copied())
                    .collect();
                write!(f, "weekly ({})", days.join(", "))
            }
            Schedule::Custom { custom_dates } => {
                let dates: Vec<String> = custom_dates
                    .iter()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect();
                write!(f, "custom ({})", dates.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    pub time: DateTime<FixedOffset>, // time of day; also the date for one-off alarms
    pub label: String,
    pub is_enabled: bool,
    #[serde(flatten)]
    pub schedule: Schedule,
    pub task_type: TaskType,
    pub task_difficulty: TaskDifficulty,
}

impl Alarm {
    pub fn frequency(&self) -> Frequency {
        self.schedule.frequency()
    }

    pub fn validate(&self) -> Result<(), AlarmError> {
        self.schedule.validate()
    }
}

/// Partial alarm as collected by the create/edit form.
///
/// Unset fields fall back to: enabled, `once`, `math`, `medium`, empty label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDraft {
    pub time: DateTime<FixedOffset>,
    pub label: Option<String>,
    pub is_enabled: Option<bool>,
    pub frequency: Option<Frequency>,
    pub days_of_week: Option<Vec<u8>>,
    pub custom_dates: Option<Vec<DateTime<FixedOffset>>>,
    pub task_type: Option<TaskType>,
    pub task_difficulty: Option<TaskDifficulty>,
}

impl AlarmDraft {
    pub fn new(time: DateTime<FixedOffset>) -> Self {
        Self {
            time,
            label: None,
            is_enabled: None,
            frequency: None,
            days_of_week: None,
            custom_dates: None,
            task_type: None,
            task_difficulty: None,
        }
    }

    /// Build a brand-new alarm with a fresh id.
    pub fn build(self) -> Result<Alarm, AlarmError> {
        self.build_for(AlarmId::new())
    }

    /// Build the alarm for an existing id (edit form submission).
    pub fn build_for(self, id: AlarmId) -> Result<Alarm, AlarmError> {
        let frequency = self.frequency.unwrap_or_default();

        if self.days_of_week.is_some() && frequency != Frequency::Weekly {
            return Err(AlarmError::Invalid(format!(
                "days of week given for a {frequency} alarm"
            )));
        }
        if self.custom_dates.is_some() && frequency != Frequency::Custom {
            return Err(AlarmError::Invalid(format!(
                "custom dates given for a {frequency} alarm"
            )));
        }

        let schedule = match frequency {
            Frequency::Once => Schedule::Once,
            Frequency::Daily => Schedule::Daily,
            Frequency::Weekly => Schedule::Weekly {
                days_of_week: self.days_of_week.unwrap_or_default().into_iter().collect(),
            },
            Frequency::Custom => {
                // entry order kept, repeats dropped
                let mut custom_dates = Vec::new();
                for date in self.custom_dates.unwrap_or_default() {
                    if !custom_dates.contains(&date) {
                        custom_dates.push(date);
                    }
                }
                Schedule::Custom { custom_dates }
            }
        };

        let alarm = Alarm {
            id,
            time: self.time,
            label: self.label.unwrap_or_default(),
            is_enabled: self.is_enabled.unwrap_or(true),
            schedule,
            task_type: self.task_type.unwrap_or_default(),
            task_difficulty: self.task_difficulty.unwrap_or_default(),
        };
        alarm.validate()?;
        Ok(alarm)
    }
}

impl From<&Alarm> for AlarmDraft {
    fn from(alarm: &Alarm) -> Self {
        let (days_of_week, custom_dates): (Option<Vec<u8>>, Option<Vec<DateTime<FixedOffset>>>) = match &alarm.schedule {
            Schedule::Weekly { days_of_week } => (Some(days_of_week.iter().copied().collect()), None),
            Schedule::Custom { custom_dates } => (None, Some(custom_dates.clone())),
            Schedule::Once | Schedule::Daily => (None, None),
        };
        Self {
            time: alarm.time,
            label: Some(alarm.label.clone()),
            is_enabled: Some(alarm.is_enabled),
            frequency: Some(alarm.frequency()),
            days_of_week,
            custom_dates,
            task_type: Some(alarm.task_type),
            task_difficulty: Some(alarm.task_difficulty),
        }
    }
}
