//! Rotating presence (status + activity) on a fixed interval.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::AutomationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Invisible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl Presence {
    pub fn new(status: PresenceStatus) -> Self {
        Self {
            status,
            activity: None,
        }
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }
}

/// Cycles through a non-empty list of presences, wrapping around.
#[derive(Debug, Clone)]
pub struct PresenceCycler {
    presences: Vec<Presence>,
    index: usize,
}

impl PresenceCycler {
    pub fn new(presences: Vec<Presence>) -> Result<Self, AutomationError> {
        if presences.is_empty() {
            return Err(AutomationError::EmptyRotation);
        }
        Ok(Self {
            presences,
            index: 0,
        })
    }

    pub fn current(&self) -> &Presence {
        &self.presences[self.index]
    }

    /// Move to the next presence and return it.
    pub fn advance(&mut self) -> &Presence {
        self.index = (self.index + 1) % self.presences.len();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.presences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presences.is_empty()
    }

    /// Run the rotation in the background. `apply` receives the current
    /// presence immediately and then once per `every`. Abort the returned
    /// handle to stop.
    pub fn spawn<F>(mut self, every: Duration, mut apply: F) -> Result<JoinHandle<()>, AutomationError>
    where
        F: FnMut(&Presence) + Send + 'static,
    {
        if every.is_zero() {
            return Err(AutomationError::InvalidConfig(
                "presence interval must be non-zero".into(),
            ));
        }

        Ok(tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                log::debug!("applying presence {:?}", self.current().status);
                apply(self.current());
                self.advance();
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn rotation() -> Vec<Presence> {
        vec![
            Presence::new(PresenceStatus::Online).with_activity("coding"),
            Presence::new(PresenceStatus::Idle),
            Presence::new(PresenceStatus::Dnd).with_activity("focus"),
        ]
    }

    #[test]
    fn advance_wraps_around() {
        let mut cycler = PresenceCycler::new(rotation()).unwrap();
        assert_eq!(cycler.current().status, PresenceStatus::Online);
        assert_eq!(cycler.advance().status, PresenceStatus::Idle);
        assert_eq!(cycler.advance().status, PresenceStatus::Dnd);
        assert_eq!(cycler.advance().status, PresenceStatus::Online);
    }

    #[test]
    fn empty_rotation_is_rejected() {
        assert!(matches!(
            PresenceCycler::new(Vec::new()),
            Err(AutomationError::EmptyRotation)
        ));
    }

    #[test]
    fn presence_serializes_lowercase_status() {
        let json = serde_json::to_value(Presence::new(PresenceStatus::Dnd)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "dnd"}));
    }

    #[tokio::test(start_paused = true)]
    async fn background_rotation_applies_each_presence() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = PresenceCycler::new(rotation())
            .unwrap()
            .spawn(Duration::from_secs(30), move |presence| {
                sink.lock().unwrap().push(presence.status);
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        handle.abort();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                PresenceStatus::Online,
                PresenceStatus::Idle,
                PresenceStatus::Dnd
            ]
        );
    }
}
