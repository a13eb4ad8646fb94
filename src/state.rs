// --------------------------------------------------
// Alarm collection state.
//
// - `reduce_alarms`: pure (state, action) -> state
// - `AlarmStore`: owns the state, publishes snapshots to subscribers
//   and writes every change through the storage collaborator
// --------------------------------------------------

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::AlarmError;
use crate::models::{Alarm, AlarmDraft, AlarmId};
use crate::store::AlarmStorage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmState {
    pub alarms: Vec<Alarm>,
}

impl AlarmState {
    pub fn new(alarms: Vec<Alarm>) -> Self {
        Self { alarms }
    }

    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AlarmId) -> bool {
        self.get(id).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmAction {
    Add(Alarm),
    Update(Alarm),
    Delete(AlarmId),
    Toggle(AlarmId),
}

impl AlarmAction {
    pub fn target(&self) -> AlarmId {
        match self {
            AlarmAction::Add(alarm) | AlarmAction::Update(alarm) => alarm.id,
            AlarmAction::Delete(id) | AlarmAction::Toggle(id) => *id,
        }
    }
}

/// Apply one action, returning a fresh state.
///
/// Update / delete / toggle of an unknown id, and add of an id already
/// present, return a state equal to the input.
pub fn reduce_alarms(state: &AlarmState, action: &AlarmAction) -> AlarmState {
    let alarms = match action {
        AlarmAction::Add(alarm) => {
            let mut alarms = state.alarms.clone();
            if !state.contains(alarm.id) {
                alarms.push(alarm.clone());
            }
            alarms
        }
        AlarmAction::Update(alarm) => state
            .alarms
            .iter()
            .map(|a| if a.id == alarm.id { alarm.clone() } else { a.clone() })
            .collect(),
        AlarmAction::Delete(id) => state.alarms.iter().filter(|a| a.id != *id).cloned().collect(),
        AlarmAction::Toggle(id) => state
            .alarms
            .iter()
            .map(|a| {
                let mut a = a.clone();
                if a.id == *id {
                    a.is_enabled = !a.is_enabled;
                }
                a
            })
            .collect(),
    };
    AlarmState { alarms }
}

/// Application-lifetime holder of the alarm state.
///
/// Changes are applied in memory first and then saved. A failed save keeps
/// the new state, is reported as `AlarmError::Storage`, and is retried on the
/// next change or `flush`.
pub struct AlarmStore<S: AlarmStorage> {
    storage: S,
    state: AlarmState,
    tx: watch::Sender<AlarmState>,
    dirty: bool,
}

impl<S: AlarmStorage> AlarmStore<S> {
    pub async fn open(storage: S) -> Result<Self, AlarmError> {
        let alarms = storage.load_alarms().await?;
        info!(count = alarms.len(), "alarm store opened");
        let state = AlarmState::new(alarms);
        let (tx, _rx) = watch::channel(state.clone());
        Ok(Self {
            storage,
            state,
            tx,
            dirty: false,
        })
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.state.alarms
    }

    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.state.get(id)
    }

    /// True while the last change has not reached storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn subscribe(&self) -> watch::Receiver<AlarmState> {
        self.tx.subscribe()
    }

    pub async fn dispatch(&mut self, action: AlarmAction) -> Result<(), AlarmError> {
        let id = action.target();
        match &action {
            AlarmAction::Add(alarm) => {
                if self.state.contains(id) {
                    warn!(%id, "alarm id already in use");
                    return Err(AlarmError::DuplicateId(id));
                }
                alarm.validate()?;
            }
            AlarmAction::Update(alarm) => {
                if !self.state.contains(id) {
                    warn!(%id, "update of unknown alarm");
                    return Err(AlarmError::NotFound(id));
                }
                alarm.validate()?;
            }
            AlarmAction::Delete(_) | AlarmAction::Toggle(_) => {
                if !self.state.contains(id) {
                    warn!(%id, ?action, "unknown alarm");
                    return Err(AlarmError::NotFound(id));
                }
            }
        }

        self.state = reduce_alarms(&self.state, &action);
        self.tx.send_replace(self.state.clone());
        info!(%id, action = action_name(&action), count = self.state.alarms.len(), "alarm state changed");

        self.dirty = true;
        self.flush().await
    }

    /// Write the current state out if it has unsaved changes.
    pub async fn flush(&mut self) -> Result<(), AlarmError> {
        if !self.dirty {
            return Ok(());
        }
        match self.storage.save_alarms(&self.state.alarms).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to persist alarms; keeping in-memory state");
                Err(e.into())
            }
        }
    }

    /// Build a new alarm from form input and add it.
    pub async fn create(&mut self, draft: AlarmDraft) -> Result<Alarm, AlarmError> {
        let alarm = draft.build()?;
        self.dispatch(AlarmAction::Add(alarm.clone())).await?;
        Ok(alarm)
    }

    pub async fn update(&mut self, alarm: Alarm) -> Result<(), AlarmError> {
        self.dispatch(AlarmAction::Update(alarm)).await
    }

    pub async fn delete(&mut self, id: AlarmId) -> Result<(), AlarmError> {
        self.dispatch(AlarmAction::Delete(id)).await
    }

    pub async fn toggle(&mut self, id: AlarmId) -> Result<(), AlarmError> {
        self.dispatch(AlarmAction::Toggle(id)).await
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn action_name(action: &AlarmAction) -> &'static str {
    match action {
        AlarmAction::Add(_) => "add",
        AlarmAction::Update(_) => "update",
        AlarmAction::Delete(_) => "delete",
        AlarmAction::Toggle(_) => "toggle",
    }
}
