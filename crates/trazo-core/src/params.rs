//! Typed parameter snapshot.
//!
//! The host keeps its parameters in whatever tree its framework provides;
//! the core never touches that. Once per processing cycle (and once per
//! redraw tick on the display side) the collaborator flattens the live
//! values into a [`ScopeParams`] and passes it in by value. Inside the core
//! there are no parameter objects or listeners, just this
//! struct.

use crate::trigger::TriggerConfig;

/// What the scope is plotting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Time-domain waveform from the capture buffer.
    #[default]
    Time,
    /// Frequency-domain spectrum from the analysis engine.
    Frequency,
}

/// Input coupling of the probe front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouplingMode {
    /// Direct coupling, DC offsets included.
    #[default]
    Dc,
    /// Capacitor-coupled, DC offsets blocked.
    Ac,
}

/// Snapshot of every user-facing control the core reads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScopeParams {
    /// Current plot mode; selects which acquisition path a block feeds.
    pub display_mode: DisplayMode,
    /// Trigger level/offset/smoothing.
    pub trigger: TriggerConfig,
    /// Index into [`crate::ranges::VERTICAL_SCALES`].
    pub vertical_scale: usize,
    /// Index into [`crate::ranges::HORIZONTAL_SCALES`].
    pub horizontal_scale: usize,
    /// Index into [`crate::ranges::INPUT_RANGES`].
    pub range: usize,
    /// Probe coupling, selects which calibration entry applies.
    pub coupling: CouplingMode,
    /// Vertical trace offset in divisions.
    pub vertical_position: f32,
    /// Horizontal trace offset in divisions.
    pub horizontal_position: f32,
    /// Freeze acquisition without tearing the pipeline down.
    pub bypass: bool,
}
