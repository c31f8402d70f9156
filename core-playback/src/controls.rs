//! Playback controls handle for UI layers.

use crate::manager::AudioManager;

/// The transport subset of [`AudioManager`].
///
/// Components that only drive playback get this instead of the full manager,
/// so they cannot dispose it or reconfigure persistence.
#[derive(Clone, Debug)]
pub struct AudioControls {
    manager: AudioManager,
}

impl AudioControls {
    pub(crate) fn new(manager: AudioManager) -> Self {
        Self { manager }
    }

    pub async fn play(&self, src: Option<&str>) {
        self.manager.play(src).await;
    }

    pub fn pause(&self) {
        self.manager.pause();
    }

    pub fn stop(&self) {
        self.manager.stop();
    }

    pub fn seek(&self, time: f64) {
        self.manager.seek(time);
    }

    pub fn set_volume(&self, volume: f64) {
        self.manager.set_volume(volume);
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.manager.set_playback_rate(rate);
    }

    pub fn set_source(&self, src: Option<&str>) {
        self.manager.set_source(src);
    }
}
