use tracing::debug;

use super::gameplay::Sound;

/// Consumer of the simulation's sound requests.
pub(crate) trait AudioSink {
    fn play(&mut self, sound: Sound);
}

/// No playback backend; records each request in the log.
#[derive(Debug, Default)]
pub(crate) struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, sound: Sound) {
        debug!(sound = sound.as_str(), "sound_requested");
    }
}
