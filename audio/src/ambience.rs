//! The continuous background layer: three synthesized drones mixed against
//! a single master level, independent of UI phase.

use crate::synth::{LowPass, Oscillator, Waveform};
use rodio::Source;

/// Overall ambience volume.
const MASTER_LEVEL: f32 = 0.2;

/// Deep drone fundamental, a low F#.
const DRONE_HZ: f32 = 45.0;
/// Dark, muffled voicing for the drone.
const DRONE_CUTOFF_HZ: f32 = 120.0;
/// Slow breath: the drone's cutoff wobbles at this rate...
const BREATH_RATE_HZ: f32 = 0.15;
/// ...by this much either side of the base cutoff.
const BREATH_DEPTH_HZ: f32 = 50.0;

/// Slightly detuned against the drone for an audible slow beat.
const BEAT_HZ: f32 = 45.5;
const BEAT_LEVEL: f32 = 0.4;

/// An octave up, filtered and quiet.
const HIGH_HZ: f32 = 90.0;
const HIGH_CUTOFF_HZ: f32 = 200.0;
const HIGH_LEVEL: f32 = 0.1;

/// Build the three ambience layers. Each is an infinite source; the engine
/// owns their teardown.
pub(crate) fn layers() -> Vec<Box<dyn Source<Item = f32> + Send>> {
    let drone = LowPass::breathing(
        Oscillator::new(Waveform::Sawtooth, DRONE_HZ),
        DRONE_CUTOFF_HZ,
        BREATH_DEPTH_HZ,
        BREATH_RATE_HZ,
    )
    .amplify(MASTER_LEVEL);

    let beat = Oscillator::new(Waveform::Sine, BEAT_HZ).amplify(BEAT_LEVEL * MASTER_LEVEL);

    let high = LowPass::new(Oscillator::new(Waveform::Triangle, HIGH_HZ), HIGH_CUTOFF_HZ)
        .amplify(HIGH_LEVEL * MASTER_LEVEL);

    vec![Box::new(drone), Box::new(beat), Box::new(high)]
}

#[cfg(test)]
mod tests {
    use super::layers;
    use rodio::Source;

    #[test]
    fn three_endless_layers() {
        let layers = layers();
        assert_eq!(layers.len(), 3);
        for layer in &layers {
            assert_eq!(layer.total_duration(), None);
            assert_eq!(layer.channels(), 1);
        }
    }

    #[test]
    fn layers_produce_audible_output() {
        for (index, layer) in layers().into_iter().enumerate() {
            let peak = layer
                .take(crate::synth::SAMPLE_RATE as usize)
                .fold(0.0f32, |max, s| max.max(s.abs()));
            assert!(peak > 0.001, "layer {index} is silent");
            assert!(peak <= 0.25, "layer {index} exceeds the master level");
        }
    }
}
