//! Playback state snapshot
//!
//! [`PlaybackState`] is the single record every UI component renders from.
//! Snapshots are immutable once published; the store swaps in a new one on
//! every change.

use serde::{Deserialize, Serialize};

/// Prefix of the default progress key (`audio:progress:<src>`).
pub const DEFAULT_PROGRESS_KEY_PREFIX: &str = "audio:progress:";

/// Error code recorded when the media element reports a failure.
pub const AUDIO_ERROR: &str = "audio_error";

pub const MIN_VOLUME: f64 = 0.0;
pub const MAX_VOLUME: f64 = 1.0;
pub const MIN_RATE: f64 = 0.5;
pub const MAX_RATE: f64 = 2.0;

/// Clamp a volume to `[0, 1]`. `NaN` maps to full volume.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        return MAX_VOLUME;
    }
    volume.clamp(MIN_VOLUME, MAX_VOLUME)
}

/// Clamp a playback rate to `[0.5, 2]`. `NaN` maps to normal speed.
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 1.0;
    }
    rate.clamp(MIN_RATE, MAX_RATE)
}

/// Positions and durations reported by hosts may be `NaN` or infinite while
/// unknown; the state only ever holds finite, non-negative seconds.
pub(crate) fn finite_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Current state of the shared audio element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Active media source.
    pub src: Option<String>,
    pub is_playing: bool,
    /// Position in seconds.
    pub current_time: f64,
    /// Duration in seconds, `0` until metadata is loaded.
    pub duration: f64,
    /// Volume in `[0, 1]`.
    pub volume: f64,
    /// Playback rate in `[0.5, 2]`.
    pub rate: f64,
    /// Metadata loaded or playback started.
    pub is_ready: bool,
    /// Last error reported by the element.
    pub error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            src: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            rate: 1.0,
            is_ready: false,
            error: None,
        }
    }
}

impl PlaybackState {
    /// Lifecycle phase derived from the snapshot.
    pub fn phase(&self) -> PlaybackPhase {
        if self.error.is_some() {
            return PlaybackPhase::Failed;
        }
        if self.src.is_none() {
            return PlaybackPhase::Unloaded;
        }
        if self.is_playing {
            return PlaybackPhase::Playing;
        }
        if !self.is_ready {
            return PlaybackPhase::Loading;
        }
        if self.duration > 0.0 && self.current_time >= self.duration {
            return PlaybackPhase::Ended;
        }
        if self.current_time > 0.0 {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Ready
        }
    }

    /// Fraction of the media played, `0` while the duration is unknown.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Per-source lifecycle.
///
/// ```text
/// Unloaded -> Loading -> Ready -> Playing <-> Paused -> Ended
/// ```
///
/// `Failed` is reachable from every phase and never blocks further calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Failed,
}

/// Partial update merged into the current snapshot.
///
/// Unset fields keep their current value.
///
/// ```
/// use core_playback::{PlaybackState, StatePatch};
///
/// let mut state = PlaybackState::default();
/// StatePatch::new().current_time(12.0).is_playing(true).apply(&mut state);
/// assert_eq!(state.current_time, 12.0);
/// assert!(state.is_playing);
/// assert_eq!(state.volume, 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    src: Option<Option<String>>,
    is_playing: Option<bool>,
    current_time: Option<f64>,
    duration: Option<f64>,
    volume: Option<f64>,
    rate: Option<f64>,
    is_ready: Option<bool>,
    error: Option<Option<String>>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(mut self, src: Option<String>) -> Self {
        self.src = Some(src);
        self
    }

    pub fn is_playing(mut self, is_playing: bool) -> Self {
        self.is_playing = Some(is_playing);
        self
    }

    pub fn current_time(mut self, current_time: f64) -> Self {
        self.current_time = Some(current_time);
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Volume, clamped on apply.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Rate, clamped on apply.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn is_ready(mut self, is_ready: bool) -> Self {
        self.is_ready = Some(is_ready);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into `state`.
    pub fn apply(self, state: &mut PlaybackState) {
        if let Some(src) = self.src {
            state.src = src;
        }
        if let Some(is_playing) = self.is_playing {
            state.is_playing = is_playing;
        }
        if let Some(current_time) = self.current_time {
            state.current_time = current_time;
        }
        if let Some(duration) = self.duration {
            state.duration = duration;
        }
        if let Some(volume) = self.volume {
            state.volume = clamp_volume(volume);
        }
        if let Some(rate) = self.rate {
            state.rate = clamp_rate(rate);
        }
        if let Some(is_ready) = self.is_ready {
            state.is_ready = is_ready;
        }
        if let Some(error) = self.error {
            state.error = error;
        }
    }
}
