//! Command-line front end for the alarm core: list / add / edit / toggle /
//! delete alarms, and run an alarm's dismissal task on stdin.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use alarm_tasks::logic::Task;
use alarm_tasks::{
    Alarm, AlarmDraft, AlarmId, AlarmStore, Config, DismissSession, Frequency, JsonFileStorage,
    SubmitOutcome, TaskDifficulty, TaskType,
};

#[derive(Parser)]
#[command(name = "alarm-tasks")]
#[command(about = "Alarms you can only dismiss by solving a task", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List alarms
    List,
    /// Create an alarm
    Add {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Edit an alarm; unset flags keep their current value
    Edit {
        /// Alarm ID
        id: AlarmId,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Switch an alarm on or off
    Toggle {
        /// Alarm ID
        id: AlarmId,
    },
    /// Remove an alarm
    Delete {
        /// Alarm ID
        id: AlarmId,
    },
    /// Solve the alarm's dismissal task, reading answers from stdin
    Dismiss {
        /// Alarm ID
        id: AlarmId,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Time of day, "HH:MM"
    #[arg(long)]
    time: Option<String>,
    /// Date, "YYYY-MM-DD" (defaults to the next time the clock reads --time)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    label: Option<String>,
    /// once, daily, weekly or custom
    #[arg(long)]
    frequency: Option<Frequency>,
    /// Weekdays for weekly alarms, 0 = Sunday, e.g. "1,3,5"
    #[arg(long, value_delimiter = ',')]
    days: Option<Vec<u8>>,
    /// Dates for custom alarms, e.g. "2026-12-24,2026-12-31"
    #[arg(long, value_delimiter = ',')]
    dates: Option<Vec<NaiveDate>>,
    /// math, typing or puzzle
    #[arg(long)]
    task_type: Option<TaskType>,
    /// easy, medium or hard
    #[arg(long)]
    difficulty: Option<TaskDifficulty>,
}

// Local -> FixedOffset using the current system offset
fn now_fixed_offset() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset()
}

// Parse a "HH:MM" string into a DateTime on the given date.
fn parse_hhmm_on(date: NaiveDate, hhmm: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let (h, m) = hhmm.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    let naive = date.and_hms_opt(h, m, 0)?;
    offset.from_local_datetime(&naive).single()
}

// Without an explicit date: today if the time is still ahead, otherwise tomorrow.
fn resolve_time(
    hhmm: &str,
    date: Option<NaiveDate>,
    now: DateTime<FixedOffset>,
) -> Result<DateTime<FixedOffset>> {
    let offset = *now.offset();
    let day = date.unwrap_or_else(|| now.date_naive());
    let time = parse_hhmm_on(day, hhmm, offset)
        .with_context(|| format!("invalid time {hhmm:?}, expected HH:MM"))?;

    if date.is_none() && time <= now {
        return Ok(time + Duration::days(1));
    }
    Ok(time)
}

impl FormArgs {
    fn apply(self, draft: &mut AlarmDraft, now: DateTime<FixedOffset>) -> Result<()> {
        match (&self.time, self.date) {
            (Some(hhmm), date) => draft.time = resolve_time(hhmm, date, now)?,
            (None, Some(date)) => {
                let hhmm = draft.time.format("%H:%M").to_string();
                draft.time = resolve_time(&hhmm, Some(date), now)?;
            }
            (None, None) => {}
        }

        if let Some(label) = self.label {
            draft.label = Some(label);
        }
        if let Some(frequency) = self.frequency {
            // stale days / dates from the previous frequency are dropped
            if frequency != Frequency::Weekly {
                draft.days_of_week = None;
            }
            if frequency != Frequency::Custom {
                draft.custom_dates = None;
            }
            draft.frequency = Some(frequency);
        }
        if let Some(days) = self.days {
            draft.days_of_week = Some(days);
        }
        let hhmm = draft.time.format("%H:%M").to_string();
        let offset = *draft.time.offset();
        let on_date =
            |d: NaiveDate| parse_hhmm_on(d, &hhmm, offset).with_context(|| format!("invalid date {d}"));
        if let Some(dates) = self.dates {
            let dates = dates.into_iter().map(&on_date).collect::<Result<Vec<_>>>()?;
            draft.custom_dates = Some(dates);
        } else if self.time.is_some() {
            // existing custom dates follow the new time of day
            if let Some(existing) = draft.custom_dates.take() {
                let dates = existing
                    .iter()
                    .map(|d| on_date(d.date_naive()))
                    .collect::<Result<Vec<_>>>()?;
                draft.custom_dates = Some(dates);
            }
        }
        if let Some(task_type) = self.task_type {
            draft.task_type = Some(task_type);
        }
        if let Some(difficulty) = self.difficulty {
            draft.task_difficulty = Some(difficulty);
        }
        Ok(())
    }
}

fn format_alarm(alarm: &Alarm) -> String {
    format!(
        "{} | {} | {:<3} | {} | {}/{} | {}",
        alarm.id,
        alarm.time.format("%H:%M"),
        if alarm.is_enabled { "on" } else { "off" },
        alarm.schedule,
        alarm.task_type,
        alarm.task_difficulty,
        alarm.label,
    )
}

async fn dismiss(alarm: &Alarm) -> Result<()> {
    let mut session = DismissSession::for_alarm(alarm)?;

    println!("Complete this task to dismiss the alarm");
    match session.task() {
        Task::Math(problem) => {
            let options: Vec<String> = problem.options.iter().map(|o| o.to_string()).collect();
            println!("  {} = ?", problem.question);
            println!("  options: {}", options.join("  "));
        }
        Task::Typing(challenge) => {
            println!("  Type this ({}% accuracy needed):", challenge.min_accuracy);
            println!("  {}", challenge.text);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match session.submit(&line)? {
            SubmitOutcome::Incorrect { attempts, accuracy } => {
                match accuracy {
                    Some(accuracy) => println!("Not quite ({accuracy:.1}% accurate). Attempts: {attempts}"),
                    None => println!("Incorrect. Attempts: {attempts}"),
                }
            }
            SubmitOutcome::Completed(result) => {
                println!(
                    "Alarm dismissed: {} failed attempts, {}s",
                    result.attempts, result.time_spent
                );
                return Ok(());
            }
        }
    }
    bail!("input closed before the task was completed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let storage = JsonFileStorage::new(&config.db_path);
    let mut store = AlarmStore::open(storage)
        .await
        .with_context(|| format!("failed to load {}", config.db_path.display()))?;

    match cli.command {
        Commands::List => {
            println!("Alarms ({})", store.alarms().len());
            for alarm in store.alarms() {
                println!("  {}", format_alarm(alarm));
            }
        }
        Commands::Add { form } => {
            let now = now_fixed_offset();
            let Some(hhmm) = form.time.as_deref() else {
                bail!("--time is required");
            };
            let mut draft = AlarmDraft::new(resolve_time(hhmm, form.date, now)?);
            form.apply(&mut draft, now)?;
            let alarm = store.create(draft).await?;
            println!("Added alarm: {}", format_alarm(&alarm));
        }
        Commands::Edit { id, form } => {
            let Some(current) = store.get(id) else {
                bail!("alarm not found: {id}");
            };
            let mut draft = AlarmDraft::from(current);
            form.apply(&mut draft, now_fixed_offset())?;
            let alarm = draft.build_for(id)?;
            store.update(alarm.clone()).await?;
            println!("Updated alarm: {}", format_alarm(&alarm));
        }
        Commands::Toggle { id } => {
            store.toggle(id).await?;
            if let Some(alarm) = store.get(id) {
                println!("{}", format_alarm(alarm));
            }
        }
        Commands::Delete { id } => {
            store.delete(id).await?;
            println!("Deleted alarm {id}");
        }
        Commands::Dismiss { id } => {
            let Some(alarm) = store.get(id) else {
                bail!("alarm not found: {id}");
            };
            dismiss(alarm).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-20T09:30:00+09:00").unwrap()
    }

    #[test]
    fn time_rolls_to_tomorrow_when_passed() {
        let t = resolve_time("07:00", None, now()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-21T07:00:00+09:00");

        let t = resolve_time("21:15", None, now()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-20T21:15:00+09:00");
    }

    #[test]
    fn explicit_date_is_kept() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let t = resolve_time("07:00", Some(date), now()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-01T07:00:00+09:00");
    }

    #[test]
    fn bad_times_are_rejected() {
        assert!(resolve_time("7am", None, now()).is_err());
        assert!(resolve_time("25:00", None, now()).is_err());
    }

    #[test]
    fn switching_frequency_drops_stale_days() {
        let mut draft = AlarmDraft::new(now());
        draft.frequency = Some(Frequency::Weekly);
        draft.days_of_week = Some(vec![1, 2]);

        let form = FormArgs {
            time: None,
            date: None,
            label: None,
            frequency: Some(Frequency::Custom),
            days: None,
            dates: Some(vec![NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()]),
            task_type: None,
            difficulty: None,
        };
        form.apply(&mut draft, now()).unwrap();

        let alarm = draft.build().unwrap();
        assert_eq!(alarm.frequency(), Frequency::Custom);
        assert_eq!(alarm.schedule.to_string(), "custom (2026-12-24)");
    }

    #[test]
    fn new_time_moves_existing_custom_dates() {
        let mut draft = AlarmDraft::new(now());
        draft.frequency = Some(Frequency::Custom);
        draft.custom_dates = Some(vec![
            DateTime::parse_from_rfc3339("2026-12-24T09:30:00+09:00").unwrap(),
            DateTime::parse_from_rfc3339("2026-12-31T09:30:00+09:00").unwrap(),
        ]);

        let form = FormArgs {
            time: Some("06:45".into()),
            date: None,
            label: None,
            frequency: None,
            days: None,
            dates: None,
            task_type: None,
            difficulty: None,
        };
        form.apply(&mut draft, now()).unwrap();

        let dates: Vec<String> = draft
            .custom_dates
            .unwrap()
            .iter()
            .map(|d| d.to_rfc3339())
            .collect();
        assert_eq!(dates, ["2026-12-24T06:45:00+09:00", "2026-12-31T06:45:00+09:00"]);
    }
}
