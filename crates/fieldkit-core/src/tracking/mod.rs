//! TimeTracking plugin.

pub mod location;
mod session;

pub use location::{
    lookup_bounded, provider_from_config, FixedLocation, GeoPoint, LocationProvider, NoLocation,
};
pub use session::{
    duration_minutes, ActiveSession, PauseOutcome, Paused, Resumed, SessionState, SessionView,
    Started, Stopped, TimeTracker, TrackingSession, KEY_ACTIVE_SESSION, NAMESPACE,
};
