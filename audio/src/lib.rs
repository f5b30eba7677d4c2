//! Procedural audio engine: synthesized ambience and one-shot cues.
//!
//! # Architecture
//!
//! Everything audible is generated in code - oscillators, filters, and
//! envelopes from [`synth`] - and played through `rodio`. The engine owns
//! exactly one output context, created lazily on first use so creation
//! always happens in response to a user gesture.
//!
//! Two kinds of sound:
//!
//! - **Ambience** ([`AudioEngine::start_ambience`]): three endless layers
//!   recorded in a single [`AmbienceHandle`]. At most one handle exists at
//!   a time; starting while active is a no-op, stopping tears every layer
//!   down uniformly.
//! - **Cues** (`play_summon` / `play_reveal` / `play_reset`): short sources
//!   with finite envelopes played on detached sinks, so each cue cleans up
//!   after itself once its envelope ends.
//!
//! If the platform denies an output device the engine degrades to a silent
//! mode: ambience bookkeeping still runs on idle sinks (the one-graph
//! invariant stays observable), cues are dropped, and the failure is logged
//! once. Nothing here ever aborts the gaze sequence.
//!
//! The output stream is not `Send`; the engine lives on the UI thread for
//! its whole life, which matches the single-execution-context model of the
//! rest of the application.

use rodio::queue::SourcesQueueOutput;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

mod ambience;
mod cues;
pub mod synth;

enum Context {
    /// Not yet created; waiting for the first user gesture.
    Cold,
    Live {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    },
    /// Device denied or absent.
    Silent,
}

/// The currently-active ambience layers. Dropping (via `stop_ambience`)
/// tears the whole graph down.
struct AmbienceHandle {
    sinks: Vec<Sink>,
    // Queue outputs keep silent-mode sinks alive.
    _idle: Vec<SourcesQueueOutput<f32>>,
}

pub struct AudioEngine {
    context: Context,
    ambience: Option<AmbienceHandle>,
    muted: bool,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AudioEngine {
    #[must_use]
    pub fn new(muted: bool) -> Self {
        Self {
            context: Context::Cold,
            ambience: None,
            muted,
        }
    }

    /// Create the output context if it does not exist yet. Call only from a
    /// user-gesture path.
    pub fn ensure_context(&mut self) {
        if matches!(self.context, Context::Cold) {
            match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    self.context = Context::Live {
                        _stream: stream,
                        handle,
                    };
                }
                Err(err) => {
                    tracing::warn!(%err, "Audio output unavailable; continuing silently");
                    self.context = Context::Silent;
                }
            }
        }
    }

    /// Start the background layers. No-op while ambience is already active
    /// or the engine is muted.
    pub fn start_ambience(&mut self) {
        if self.muted || self.ambience.is_some() {
            return;
        }
        self.ensure_context();

        let mut sinks = Vec::new();
        let mut idle = Vec::new();
        for layer in ambience::layers() {
            let (sink, queue) = self.new_sink();
            sink.append(layer);
            sinks.push(sink);
            if let Some(queue) = queue {
                idle.push(queue);
            }
        }

        self.ambience = Some(AmbienceHandle {
            sinks,
            _idle: idle,
        });
    }

    /// Tear down every ambience layer. A later `start_ambience` builds a
    /// fresh graph.
    pub fn stop_ambience(&mut self) {
        if let Some(handle) = self.ambience.take() {
            for sink in &handle.sinks {
                sink.stop();
            }
        }
    }

    /// Rising two-second cue for the start of a gaze.
    pub fn play_summon(&mut self) {
        if self.muted {
            return;
        }
        self.ensure_context();
        self.spawn_cue(cues::summon());
    }

    /// Four-note chord for the moment of revelation.
    pub fn play_reveal(&mut self) {
        if self.muted {
            return;
        }
        self.ensure_context();
        for note in cues::reveal_notes() {
            self.spawn_cue(note);
        }
    }

    /// Falling half-second cue for the return to idle.
    pub fn play_reset(&mut self) {
        if self.muted {
            return;
        }
        self.ensure_context();
        self.spawn_cue(cues::reset());
    }

    #[must_use]
    pub fn ambience_active(&self) -> bool {
        self.ambience.is_some()
    }

    /// Number of live ambience layers; zero when stopped.
    #[must_use]
    pub fn ambience_layer_count(&self) -> usize {
        self.ambience.as_ref().map_or(0, |handle| handle.sinks.len())
    }

    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    fn new_sink(&self) -> (Sink, Option<SourcesQueueOutput<f32>>) {
        if let Context::Live { handle, .. } = &self.context {
            match Sink::try_new(handle) {
                Ok(sink) => return (sink, None),
                Err(err) => {
                    tracing::warn!(%err, "Failed to open an audio sink; playing silently");
                }
            }
        }
        let (sink, queue) = Sink::new_idle();
        (sink, Some(queue))
    }

    fn spawn_cue<S>(&self, source: S)
    where
        S: Source<Item = f32> + Send + 'static,
    {
        let Context::Live { handle, .. } = &self.context else {
            return;
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(source);
                sink.detach();
            }
            Err(err) => tracing::debug!(%err, "Dropping cue; could not open a sink"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AudioEngine;

    #[test]
    fn starting_twice_keeps_one_graph() {
        let mut engine = AudioEngine::default();
        engine.start_ambience();
        assert!(engine.ambience_active());
        assert_eq!(engine.ambience_layer_count(), 3);

        engine.start_ambience();
        assert_eq!(engine.ambience_layer_count(), 3);
    }

    #[test]
    fn stop_then_start_builds_a_fresh_graph() {
        let mut engine = AudioEngine::default();
        engine.start_ambience();
        engine.stop_ambience();
        assert!(!engine.ambience_active());
        assert_eq!(engine.ambience_layer_count(), 0);

        engine.start_ambience();
        assert!(engine.ambience_active());
        assert_eq!(engine.ambience_layer_count(), 3);
    }

    #[test]
    fn muted_engine_builds_nothing() {
        let mut engine = AudioEngine::new(true);
        engine.start_ambience();
        assert!(!engine.ambience_active());

        // Cues are no-ops too; just must not panic.
        engine.play_summon();
        engine.play_reveal();
        engine.play_reset();
    }

    #[test]
    fn cues_survive_a_missing_device() {
        let mut engine = AudioEngine::default();
        engine.play_summon();
        engine.play_reveal();
        engine.play_reset();
        engine.stop_ambience();
    }

    #[test]
    fn defaults_to_unmuted() {
        assert!(!AudioEngine::default().is_muted());
    }
}
