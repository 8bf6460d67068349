//! Audio boundary
//!
//! The core decides *when* a sound happens; the host decides *how* it is
//! mixed and heard. Keys use the "category/name" convention
//! ("drifter/steps", "broodmother/bellow") so a host can route whole
//! categories to volume buses.

/// Host-side audio output
pub trait SoundSink {
    /// Start (or restart) the sound for this key.
    fn play(&mut self, key: &str);

    /// Stop the sound immediately. Unknown or already-stopped keys are a
    /// no-op.
    fn stop(&mut self, key: &str);

    /// Fade the sound out over the given window, then stop it.
    fn fade_out(&mut self, key: &str, over_ms: f64);
}

/// Sink that swallows everything; the default for headless runs
#[derive(Debug, Default)]
pub struct NullAudio;

impl SoundSink for NullAudio {
    fn play(&mut self, _key: &str) {}
    fn stop(&mut self, _key: &str) {}
    fn fade_out(&mut self, _key: &str, _over_ms: f64) {}
}

/// Sink that journals every call; tests keep the shared log half.
#[cfg(test)]
pub(crate) struct RecordingAudio {
    log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
}

#[cfg(test)]
impl RecordingAudio {
    pub(crate) fn new() -> (Self, std::rc::Rc<std::cell::RefCell<Vec<String>>>) {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        (
            Self {
                log: std::rc::Rc::clone(&log),
            },
            log,
        )
    }
}

#[cfg(test)]
impl SoundSink for RecordingAudio {
    fn play(&mut self, key: &str) {
        self.log.borrow_mut().push(format!("play {key}"));
    }

    fn stop(&mut self, key: &str) {
        self.log.borrow_mut().push(format!("stop {key}"));
    }

    fn fade_out(&mut self, key: &str, over_ms: f64) {
        self.log.borrow_mut().push(format!("fade {key} {over_ms}"));
    }
}
