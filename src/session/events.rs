use bevy::prelude::*;

/// User asked to enter AR (start control pressed).
#[derive(Debug, Clone, Copy, Default, Event)]
pub struct StartSessionRequest;

/// User asked to leave AR. The platform answers with an end notification.
#[derive(Debug, Clone, Copy, Default, Event)]
pub struct EndSessionRequest;

#[derive(Debug, Clone, Copy, Event)]
pub struct ArSessionStarted {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Event)]
pub struct ArSessionEnded {
    pub generation: u64,
}

/// One discrete tap/trigger delivered by the session's input source.
#[derive(Debug, Clone, Copy, Default, Event)]
pub struct ArSelect;
