//! Sound cue bindings
//!
//! Entities never hold audio buffers. A profile maps abstract cues to the
//! host's "category/name" keys, and playback goes through the [`SoundSink`]
//! boundary. A cue a species does not bind is silently skipped, so shared
//! code can request cues without checking the roster first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::SoundSink;

/// Abstract sound moments the simulation can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Step,
    Jump,
    Hurt,
    Die,
    Throw,
    Shatter,
    Collect,
    Snore,
    Chitter,
    Bellow,
}

/// One species' cue-to-key table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoundSet {
    cues: BTreeMap<SoundCue, String>,
}

impl SoundSet {
    pub fn new(cues: BTreeMap<SoundCue, String>) -> Self {
        Self { cues }
    }

    /// The host key bound to a cue, if the species carries one.
    pub fn key(&self, cue: SoundCue) -> Option<&str> {
        self.cues.get(&cue).map(String::as_str)
    }

    /// Play the cue; unbound cues are a no-op.
    pub fn play(&self, cue: SoundCue, audio: &mut dyn SoundSink) {
        if let Some(key) = self.key(cue) {
            audio.play(key);
        }
    }

    /// Stop the cue's sound; unbound cues are a no-op.
    pub fn stop(&self, cue: SoundCue, audio: &mut dyn SoundSink) {
        if let Some(key) = self.key(cue) {
            audio.stop(key);
        }
    }

    /// Fade the cue's sound out; unbound cues are a no-op.
    pub fn fade_out(&self, cue: SoundCue, audio: &mut dyn SoundSink, over_ms: f64) {
        if let Some(key) = self.key(cue) {
            audio.fade_out(key, over_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;

    fn sample() -> SoundSet {
        let mut cues = BTreeMap::new();
        cues.insert(SoundCue::Step, "drifter/steps".to_owned());
        cues.insert(SoundCue::Jump, "drifter/jump".to_owned());
        SoundSet::new(cues)
    }

    #[test]
    fn test_bound_cue_plays_its_key() {
        let (mut audio, log) = RecordingAudio::new();
        let set = sample();

        set.play(SoundCue::Step, &mut audio);
        set.stop(SoundCue::Step, &mut audio);
        set.fade_out(SoundCue::Jump, &mut audio, 250.0);

        assert_eq!(
            *log.borrow(),
            vec![
                "play drifter/steps".to_owned(),
                "stop drifter/steps".to_owned(),
                "fade drifter/jump 250".to_owned(),
            ]
        );
    }

    #[test]
    fn test_unbound_cue_is_silent() {
        let (mut audio, log) = RecordingAudio::new();
        let set = sample();

        set.play(SoundCue::Bellow, &mut audio);
        set.stop(SoundCue::Snore, &mut audio);

        assert!(log.borrow().is_empty());
        assert_eq!(set.key(SoundCue::Bellow), None);
    }
}
