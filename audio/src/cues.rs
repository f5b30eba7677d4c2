//! One-shot cues tied to oracle transitions. Each source carries its own
//! finite envelope, so a cue stops itself without caller-managed cleanup.

use crate::synth::{Envelope, LowPass, Oscillator, Shaped, Sweep, Waveform};
use std::time::Duration;

/// Rising energy: triangle sweep 60 -> 400 Hz over two seconds, swelling to
/// 0.2 at the midpoint and back to silence.
pub(crate) fn summon() -> Shaped<Sweep> {
    Shaped::new(
        Sweep::new(Waveform::Triangle, 60.0, 400.0, Duration::from_secs(2)),
        Envelope::starting_at(0.0)
            .linear_to(0.2, Duration::from_secs(1))
            .linear_to(0.0, Duration::from_secs(1)),
    )
}

/// A mystical chord, roughly A major: each note gets a fast attack to a
/// level that steps down per note, then a long exponential decay.
pub(crate) fn reveal_notes() -> Vec<Shaped<Oscillator>> {
    const CHORD_HZ: [f32; 4] = [220.0, 277.18, 329.63, 440.0];

    CHORD_HZ
        .iter()
        .enumerate()
        .map(|(index, &hz)| {
            let peak = 0.1 - 0.02 * index as f32;
            Shaped::new(
                Oscillator::new(Waveform::Sine, hz),
                Envelope::starting_at(0.0)
                    .linear_to(peak, Duration::from_millis(100))
                    .exponential_to(0.001, Duration::from_millis(3900)),
            )
        })
        .collect()
}

/// Falling pitch with a muffled suction character: sawtooth 200 -> 50 Hz
/// through a 400 Hz lowpass, decaying over half a second.
pub(crate) fn reset() -> Shaped<LowPass<Sweep>> {
    let duration = Duration::from_millis(500);
    Shaped::new(
        LowPass::new(
            Sweep::new(Waveform::Sawtooth, 200.0, 50.0, duration),
            400.0,
        ),
        Envelope::starting_at(0.1).exponential_to(0.001, duration),
    )
}
