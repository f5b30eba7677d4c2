//! Oracle state machine.
//!
//! # Architecture
//!
//! [`Oracle`] mediates between the user gesture, the insight provider, and
//! the audio engine. It owns both collaborators explicitly - no module-level
//! singletons - and holds the single current [`OraclePhase`] plus the
//! current [`Insight`], if any.
//!
//! The gaze sequence is split into three layers so every consumer shares
//! one pacing implementation:
//!
//! - [`Oracle::begin_gaze`] - guard plus the synchronous side effects
//!   (audio context, ambience, summon cue, phase change);
//! - [`await_insight`] - the minimum-wait timer joined with the provider
//!   fetch, usable from a spawned task;
//! - [`Oracle::complete_gaze`] - stores the result, enters `Revealed`,
//!   fires the reveal cue.
//!
//! [`Oracle::gaze`] composes the three for callers that can simply await.
//!
//! # Timing
//!
//! The reveal never lands before [`MIN_GAZE_DURATION`] has passed, however
//! fast the provider resolves - a pacing floor, not a timeout. After the
//! reveal, the explanation becomes visible once [`EXPLANATION_DELAY`] has
//! elapsed; visibility is computed from the reveal timestamp, so leaving
//! `Revealed` early simply makes it false with nothing to cancel.

use std::time::Duration;
use tokio::time::Instant;

use unseen_audio::AudioEngine;
use unseen_provider::InsightSource;
use unseen_types::{Insight, OraclePhase};

/// Floor on the time between a gaze and its reveal, so the reveal never
/// feels instantaneous even on the immediate fallback path.
pub const MIN_GAZE_DURATION: Duration = Duration::from_millis(2000);

/// How long after the reveal the explanation text becomes visible.
pub const EXPLANATION_DELAY: Duration = Duration::from_millis(3000);

pub struct Oracle<P> {
    provider: P,
    audio: AudioEngine,
    phase: OraclePhase,
    insight: Option<Insight>,
    revealed_at: Option<Instant>,
}

impl<P> Oracle<P>
where
    P: InsightSource,
{
    #[must_use]
    pub fn new(provider: P, audio: AudioEngine) -> Self {
        Self {
            provider,
            audio,
            phase: OraclePhase::Idle,
            insight: None,
            revealed_at: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> OraclePhase {
        self.phase
    }

    #[must_use]
    pub fn insight(&self) -> Option<&Insight> {
        self.insight.as_ref()
    }

    #[must_use]
    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    /// The provider, for cloning into a spawned gaze task.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Enter `Gazing` and fire its side effects. Returns `false` - a pure
    /// no-op, nothing touched - when a gaze is already in flight.
    ///
    /// Side effects, in order: audio context ensured and ambience running,
    /// phase set, previous insight cleared, summon cue fired. The caller
    /// then owes a `complete_gaze` once [`await_insight`] resolves.
    pub fn begin_gaze(&mut self) -> bool {
        if self.phase.is_gazing() {
            tracing::debug!("Gaze requested while already gazing; ignored");
            return false;
        }

        self.audio.ensure_context();
        self.audio.start_ambience();
        self.phase = OraclePhase::Gazing;
        self.insight = None;
        self.revealed_at = None;
        self.audio.play_summon();
        true
    }

    /// Land the result of a gaze: store the insight, enter `Revealed`,
    /// stamp the reveal time, fire the reveal cue.
    ///
    /// Ignored unless a gaze is in flight, so a completion that raced a
    /// reset cannot resurrect stale content.
    pub fn complete_gaze(&mut self, insight: Insight) {
        if !self.phase.is_gazing() {
            tracing::debug!(phase = ?self.phase, "Stale gaze completion dropped");
            return;
        }

        self.insight = Some(insight);
        self.phase = OraclePhase::Revealed;
        self.revealed_at = Some(Instant::now());
        self.audio.play_reveal();
    }

    /// The full gaze sequence for callers that can await in place.
    pub async fn gaze(&mut self) {
        if !self.begin_gaze() {
            return;
        }
        let insight = await_insight(&self.provider).await;
        self.complete_gaze(insight);
    }

    /// Return to `Idle` from any phase: reset cue, content cleared.
    /// Ambience is deliberately left running - it lives for the whole
    /// session, independent of phase.
    pub fn reset(&mut self) {
        self.audio.play_reset();
        self.phase = OraclePhase::Idle;
        self.insight = None;
        self.revealed_at = None;
    }

    /// Whether the explanation text should be shown. True only in
    /// `Revealed`, and only once [`EXPLANATION_DELAY`] has passed since
    /// the reveal.
    #[must_use]
    pub fn explanation_visible(&self) -> bool {
        self.phase.is_revealed()
            && self
                .revealed_at
                .is_some_and(|at| at.elapsed() >= EXPLANATION_DELAY)
    }
}

/// Join the pacing floor with the provider fetch; resolves once both have.
/// Free-standing so a presentation layer can drive the same pacing from a
/// spawned task while its event loop keeps animating.
pub async fn await_insight<P>(provider: &P) -> Insight
where
    P: InsightSource,
{
    let ((), insight) = tokio::join!(
        tokio::time::sleep(MIN_GAZE_DURATION),
        provider.fetch_insight()
    );
    insight
}
