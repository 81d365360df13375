//! Time-tracking session state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Tracking --pause--> Paused --resume--> Tracking
//! Tracking | Paused --stop--> Idle
//! ```
//!
//! At most one session exists. Starting while a session is live replaces it;
//! stopping while idle is an error. Durations exclude paused time.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::location::{lookup_bounded, GeoPoint, LocationProvider};
use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{JsonSlot, PreferenceStore, TrackingConfig};

pub const NAMESPACE: &str = "TimeTrackingPrefs";
pub const KEY_ACTIVE_SESSION: &str = "active_session";

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Tracking,
    Paused,
}

/// The live session as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub project_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
    /// Set while paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<i64>,
    /// Paused time from completed pause intervals.
    #[serde(default)]
    pub paused_ms: i64,
}

impl TrackingSession {
    pub fn state(&self) -> SessionState {
        if self.paused_at.is_some() {
            SessionState::Paused
        } else {
            SessionState::Tracking
        }
    }

    /// Tracked time at `now`, excluding every pause interval.
    pub fn elapsed_ms(&self, now: i64) -> i64 {
        let open_pause = self.paused_at.map(|p| now - p).unwrap_or(0);
        (now - self.start_time - self.paused_ms - open_pause).max(0)
    }
}

pub fn duration_minutes(duration_ms: i64) -> i64 {
    (duration_ms as f64 / MS_PER_MINUTE).round() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Started {
    pub success: bool,
    pub start_time: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stopped {
    pub success: bool,
    pub end_time: i64,
    pub duration: i64,
    pub duration_minutes: i64,
    pub notes: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paused {
    pub success: bool,
    pub paused_at: i64,
    pub duration: i64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resumed {
    pub success: bool,
    pub resumed_at: i64,
    pub paused_ms: i64,
}

/// Result of `pause`: a real pause, or a stop in legacy mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PauseOutcome {
    Paused(Paused),
    Stopped(Stopped),
}

/// Session as reported by `active`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub project_id: String,
    pub project_name: String,
    pub description: String,
    pub start_time: i64,
    pub duration: i64,
    pub duration_minutes: i64,
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
}

/// Single-slot session holder backed by the preference store.
pub struct TimeTracker {
    slot: JsonSlot<Option<TrackingSession>>,
    clock: Arc<dyn Clock>,
    location: Arc<dyn LocationProvider>,
    location_timeout: Duration,
    pause_stops_session: bool,
}

impl TimeTracker {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
        location: Arc<dyn LocationProvider>,
        config: &TrackingConfig,
    ) -> Self {
        Self {
            slot: JsonSlot::new(store, NAMESPACE, KEY_ACTIVE_SESSION),
            clock,
            location,
            location_timeout: Duration::from_millis(config.location_timeout_ms),
            pause_stops_session: config.pause_stops_session,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> Result<SessionState> {
        Ok(self
            .slot
            .read()?
            .map(|s| s.state())
            .unwrap_or(SessionState::Idle))
    }

    /// Live view of the current session. No side effects.
    pub fn active(&self) -> Result<ActiveSession> {
        let Some(session) = self.slot.read()? else {
            return Ok(ActiveSession {
                active: false,
                session: None,
            });
        };
        let duration = session.elapsed_ms(self.clock.now_ms());
        Ok(ActiveSession {
            active: true,
            session: Some(SessionView {
                paused: session.state() == SessionState::Paused,
                project_id: session.project_id,
                project_name: session.project_name,
                description: session.description,
                start_time: session.start_time,
                duration,
                duration_minutes: duration_minutes(duration),
                location_lat: session.location_lat,
                location_lng: session.location_lng,
            }),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(
        &self,
        project_id: &str,
        project_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Started> {
        if project_id.trim().is_empty() {
            return Err(ValidationError::Missing("projectId").into());
        }

        // Outside the slot lock: the lookup may take up to the timeout.
        let fix = lookup_bounded(&self.location, self.location_timeout);

        let guard = self.slot.lock()?;
        if let Some(previous) = guard.load()? {
            tracing::warn!(
                previous_project = %previous.project_id,
                "starting a session while one is active; replacing it"
            );
        }

        let start_time = self.clock.now_ms();
        guard.store(&Some(TrackingSession {
            project_id: project_id.to_string(),
            project_name: project_name.unwrap_or_default().to_string(),
            description: description.unwrap_or_default().to_string(),
            start_time,
            location_lat: fix.map(|f| f.lat),
            location_lng: fix.map(|f| f.lng),
            paused_at: None,
            paused_ms: 0,
        }))?;

        tracing::info!(project_id, start_time, with_location = fix.is_some(), "time tracking started");
        let message = if fix.is_some() {
            "Time tracking started"
        } else {
            "Time tracking started (without location)"
        };
        Ok(Started {
            success: true,
            start_time,
            message: message.to_string(),
            location: fix,
        })
    }

    pub fn stop(&self, notes: Option<&str>) -> Result<Stopped> {
        let guard = self.slot.lock()?;
        let session = guard.load()?.ok_or_else(no_active_session)?;

        let end_time = self.clock.now_ms();
        let duration = session.elapsed_ms(end_time);
        guard.remove()?;

        tracing::info!(project_id = %session.project_id, duration, "time tracking stopped");
        Ok(Stopped {
            success: true,
            end_time,
            duration,
            duration_minutes: duration_minutes(duration),
            notes: notes.unwrap_or_default().to_string(),
            message: "Time tracking stopped".to_string(),
        })
    }

    pub fn pause(&self) -> Result<PauseOutcome> {
        if self.pause_stops_session {
            return Ok(PauseOutcome::Stopped(self.stop(None)?));
        }

        let guard = self.slot.lock()?;
        let mut session = guard.load()?.ok_or_else(no_active_session)?;
        if session.state() == SessionState::Paused {
            return Err(CoreError::invalid_state("time tracking is already paused"));
        }

        let now = self.clock.now_ms();
        session.paused_at = Some(now);
        let duration = session.elapsed_ms(now);
        guard.store(&Some(session))?;

        tracing::info!(duration, "time tracking paused");
        Ok(PauseOutcome::Paused(Paused {
            success: true,
            paused_at: now,
            duration,
            duration_minutes: duration_minutes(duration),
        }))
    }

    pub fn resume(&self) -> Result<Resumed> {
        let guard = self.slot.lock()?;
        let mut session = guard.load()?.ok_or_else(no_active_session)?;
        let Some(paused_at) = session.paused_at.take() else {
            return Err(CoreError::invalid_state("time tracking is not paused"));
        };

        let now = self.clock.now_ms();
        session.paused_ms += (now - paused_at).max(0);
        let paused_ms = session.paused_ms;
        guard.store(&Some(session))?;

        tracing::info!(paused_ms, "time tracking resumed");
        Ok(Resumed {
            success: true,
            resumed_at: now,
            paused_ms,
        })
    }
}

fn no_active_session() -> CoreError {
    CoreError::invalid_state("no active time tracking session")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryPreferences;
    use crate::tracking::location::{FixedLocation, NoLocation};

    const T0: i64 = 1_700_000_000_000;

    fn tracker_with(
        location: Arc<dyn LocationProvider>,
        config: TrackingConfig,
    ) -> (TimeTracker, ManualClock) {
        let clock = ManualClock::new(T0);
        let tracker = TimeTracker::new(
            Arc::new(MemoryPreferences::new()),
            Arc::new(clock.clone()),
            location,
            &config,
        );
        (tracker, clock)
    }

    fn tracker() -> (TimeTracker, ManualClock) {
        tracker_with(Arc::new(NoLocation), TrackingConfig::default())
    }

    #[test]
    fn start_requires_project_id() {
        let (tracker, _) = tracker();
        assert!(matches!(
            tracker.start("  ", None, None),
            Err(CoreError::Validation(ValidationError::Missing("projectId")))
        ));
        assert_eq!(tracker.state().unwrap(), SessionState::Idle);
    }

    #[test]
    fn start_active_stop() {
        let (tracker, clock) = tracker();
        let started = tracker.start("P1", Some("Project One"), None).unwrap();
        assert_eq!(started.start_time, T0);
        assert!(started.location.is_none());

        clock.advance(90_000);
        let active = tracker.active().unwrap();
        assert!(active.active);
        let session = active.session.unwrap();
        assert_eq!(session.project_name, "Project One");
        assert_eq!(session.description, "");
        assert_eq!(session.duration, 90_000);
        assert_eq!(session.duration_minutes, 2);

        clock.advance(10_000);
        let stopped = tracker.stop(Some("done")).unwrap();
        assert_eq!(stopped.end_time, T0 + 100_000);
        assert_eq!(stopped.duration, 100_000);
        assert_eq!(stopped.duration_minutes, 2);
        assert_eq!(stopped.notes, "done");

        assert!(!tracker.active().unwrap().active);
    }

    #[test]
    fn immediate_stop_has_zero_duration() {
        let (tracker, _) = tracker();
        tracker.start("P1", None, None).unwrap();
        let stopped = tracker.stop(None).unwrap();
        assert_eq!(stopped.duration, 0);
        assert_eq!(stopped.duration_minutes, 0);
    }

    #[test]
    fn stop_while_idle_is_invalid_state() {
        let (tracker, _) = tracker();
        assert!(matches!(tracker.stop(None), Err(CoreError::InvalidState(_))));

        tracker.start("P1", None, None).unwrap();
        tracker.stop(None).unwrap();
        assert!(matches!(tracker.stop(None), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn second_start_replaces_session() {
        let (tracker, clock) = tracker();
        tracker.start("P1", None, None).unwrap();
        clock.advance(60_000);
        tracker.start("P2", None, None).unwrap();

        let session = tracker.active().unwrap().session.unwrap();
        assert_eq!(session.project_id, "P2");
        assert_eq!(session.start_time, T0 + 60_000);
    }

    #[test]
    fn location_fix_is_recorded() {
        let (tracker, _) = tracker_with(
            Arc::new(FixedLocation(GeoPoint { lat: 48.0, lng: 11.0 })),
            TrackingConfig::default(),
        );
        let started = tracker.start("P1", None, None).unwrap();
        assert_eq!(started.message, "Time tracking started");

        let session = tracker.active().unwrap().session.unwrap();
        assert_eq!(session.location_lat, Some(48.0));
        assert_eq!(session.location_lng, Some(11.0));
    }

    #[test]
    fn pause_resume_excludes_paused_time() {
        let (tracker, clock) = tracker();
        tracker.start("P1", None, None).unwrap();

        clock.advance(60_000);
        let PauseOutcome::Paused(paused) = tracker.pause().unwrap() else {
            panic!("expected a real pause");
        };
        assert_eq!(paused.duration, 60_000);
        assert_eq!(tracker.state().unwrap(), SessionState::Paused);

        clock.advance(300_000);
        let view = tracker.active().unwrap().session.unwrap();
        assert!(view.paused);
        assert_eq!(view.duration, 60_000);

        let resumed = tracker.resume().unwrap();
        assert_eq!(resumed.paused_ms, 300_000);

        clock.advance(30_000);
        let stopped = tracker.stop(None).unwrap();
        assert_eq!(stopped.duration, 90_000);
    }

    #[test]
    fn stop_from_paused_excludes_open_pause() {
        let (tracker, clock) = tracker();
        tracker.start("P1", None, None).unwrap();
        clock.advance(120_000);
        tracker.pause().unwrap();
        clock.advance(999_000);
        assert_eq!(tracker.stop(None).unwrap().duration, 120_000);
    }

    #[test]
    fn pause_and_resume_guard_state() {
        let (tracker, _) = tracker();
        assert!(matches!(tracker.pause(), Err(CoreError::InvalidState(_))));
        assert!(matches!(tracker.resume(), Err(CoreError::InvalidState(_))));

        tracker.start("P1", None, None).unwrap();
        assert!(matches!(tracker.resume(), Err(CoreError::InvalidState(_))));
        tracker.pause().unwrap();
        assert!(matches!(tracker.pause(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn legacy_pause_stops_session() {
        let (tracker, clock) = tracker_with(
            Arc::new(NoLocation),
            TrackingConfig {
                pause_stops_session: true,
                ..TrackingConfig::default()
            },
        );
        assert!(matches!(tracker.pause(), Err(CoreError::InvalidState(_))));

        tracker.start("P1", None, None).unwrap();
        clock.advance(45_000);
        let PauseOutcome::Stopped(stopped) = tracker.pause().unwrap() else {
            panic!("legacy pause should stop");
        };
        assert_eq!(stopped.duration, 45_000);
        assert_eq!(tracker.state().unwrap(), SessionState::Idle);
    }

    #[test]
    fn duration_minutes_rounds_half_up() {
        assert_eq!(duration_minutes(0), 0);
        assert_eq!(duration_minutes(29_999), 0);
        assert_eq!(duration_minutes(30_000), 1);
        assert_eq!(duration_minutes(89_999), 1);
        assert_eq!(duration_minutes(90_000), 2);
    }
}
