//! Synthesis primitives.
//!
//! Everything the engine plays is generated: mono `f32` sources at 44.1 kHz
//! built from oscillators, one-pole lowpass filters, and piecewise amplitude
//! envelopes. No sample playback anywhere.

use rodio::Source;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44_100;

/// Floor for exponential ramps; a true zero never converges.
const EXP_FLOOR: f32 = 1.0e-4;

const TAU: f32 = std::f32::consts::TAU;

// ============================================================================
// Oscillator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Evaluate one sample at `phase` in `[0, 1)`.
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Fixed-frequency oscillator. Infinite; pair with an [`Envelope`] or a
/// sink teardown to end it.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
}

impl Oscillator {
    #[must_use]
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }
}

impl Iterator for Oscillator {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let value = self.waveform.sample(self.phase);
        self.phase = (self.phase + self.frequency / SAMPLE_RATE as f32).fract();
        Some(value)
    }
}

impl Source for Oscillator {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

// ============================================================================
// Sweep
// ============================================================================

/// Oscillator whose frequency ramps exponentially from one value to another
/// over a duration, then holds the target. Phase-continuous across the ramp.
#[derive(Debug, Clone)]
pub struct Sweep {
    waveform: Waveform,
    from_hz: f32,
    to_hz: f32,
    ramp_samples: u32,
    elapsed: u32,
    phase: f32,
}

impl Sweep {
    #[must_use]
    pub fn new(waveform: Waveform, from_hz: f32, to_hz: f32, ramp: Duration) -> Self {
        Self {
            waveform,
            from_hz,
            to_hz,
            ramp_samples: (ramp.as_secs_f32() * SAMPLE_RATE as f32) as u32,
            elapsed: 0,
            phase: 0.0,
        }
    }

    fn frequency_at(&self, sample: u32) -> f32 {
        if sample >= self.ramp_samples || self.ramp_samples == 0 {
            return self.to_hz;
        }
        let progress = sample as f32 / self.ramp_samples as f32;
        self.from_hz * (self.to_hz / self.from_hz).powf(progress)
    }
}

impl Iterator for Sweep {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let value = self.waveform.sample(self.phase);
        let frequency = self.frequency_at(self.elapsed);
        self.phase = (self.phase + frequency / SAMPLE_RATE as f32).fract();
        self.elapsed = self.elapsed.saturating_add(1);
        Some(value)
    }
}

impl Source for Sweep {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

// ============================================================================
// LowPass
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Cutoff {
    Fixed(f32),
    /// Cutoff wobbles around `base_hz` by `depth_hz` at `rate_hz` - the
    /// "breathing" modulation on the ambience drone.
    Breathing {
        base_hz: f32,
        depth_hz: f32,
        rate_hz: f32,
    },
}

/// One-pole lowpass filter over another source.
#[derive(Debug, Clone)]
pub struct LowPass<S> {
    inner: S,
    cutoff: Cutoff,
    state: f32,
    lfo_phase: f32,
}

impl<S> LowPass<S>
where
    S: Source<Item = f32>,
{
    #[must_use]
    pub fn new(inner: S, cutoff_hz: f32) -> Self {
        Self {
            inner,
            cutoff: Cutoff::Fixed(cutoff_hz),
            state: 0.0,
            lfo_phase: 0.0,
        }
    }

    #[must_use]
    pub fn breathing(inner: S, base_hz: f32, depth_hz: f32, rate_hz: f32) -> Self {
        Self {
            inner,
            cutoff: Cutoff::Breathing {
                base_hz,
                depth_hz,
                rate_hz,
            },
            state: 0.0,
            lfo_phase: 0.0,
        }
    }

    fn next_cutoff(&mut self) -> f32 {
        match self.cutoff {
            Cutoff::Fixed(hz) => hz,
            Cutoff::Breathing {
                base_hz,
                depth_hz,
                rate_hz,
            } => {
                let hz = base_hz + depth_hz * (TAU * self.lfo_phase).sin();
                self.lfo_phase = (self.lfo_phase + rate_hz / SAMPLE_RATE as f32).fract();
                hz.max(1.0)
            }
        }
    }
}

impl<S> Iterator for LowPass<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let input = self.inner.next()?;
        let cutoff = self.next_cutoff();
        // RC smoothing coefficient for the current cutoff.
        let alpha = 1.0 - (-TAU * cutoff / SAMPLE_RATE as f32).exp();
        self.state += alpha * (input - self.state);
        Some(self.state)
    }
}

impl<S> Source for LowPass<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Ramp {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    target: f32,
    duration: Duration,
    ramp: Ramp,
}

/// Piecewise amplitude automation: a start level followed by ramp segments,
/// in the style of scheduled audio-parameter values.
#[derive(Debug, Clone)]
pub struct Envelope {
    start: f32,
    segments: Vec<Segment>,
}

impl Envelope {
    #[must_use]
    pub fn starting_at(level: f32) -> Self {
        Self {
            start: level,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn linear_to(mut self, target: f32, duration: Duration) -> Self {
        self.segments.push(Segment {
            target,
            duration,
            ramp: Ramp::Linear,
        });
        self
    }

    #[must_use]
    pub fn exponential_to(mut self, target: f32, duration: Duration) -> Self {
        self.segments.push(Segment {
            target,
            duration,
            ramp: Ramp::Exponential,
        });
        self
    }

    /// Total automation time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Level at `t` seconds from the start. Clamps to the final target
    /// beyond the last segment.
    #[must_use]
    pub fn level_at(&self, t: f32) -> f32 {
        let mut from = self.start;
        let mut offset = 0.0f32;

        for segment in &self.segments {
            let seconds = segment.duration.as_secs_f32();
            if t < offset + seconds {
                let progress = (t - offset) / seconds;
                return match segment.ramp {
                    Ramp::Linear => from + (segment.target - from) * progress,
                    Ramp::Exponential => {
                        let from = from.max(EXP_FLOOR);
                        let to = segment.target.max(EXP_FLOOR);
                        from * (to / from).powf(progress)
                    }
                };
            }
            offset += seconds;
            from = segment.target;
        }

        from
    }
}

/// A source shaped by an [`Envelope`]. Ends when the envelope ends, which
/// is what makes the one-shot cues self-terminating.
#[derive(Debug, Clone)]
pub struct Shaped<S> {
    inner: S,
    envelope: Envelope,
    elapsed: u32,
    total_samples: u32,
}

impl<S> Shaped<S>
where
    S: Source<Item = f32>,
{
    #[must_use]
    pub fn new(inner: S, envelope: Envelope) -> Self {
        let total_samples = (envelope.duration().as_secs_f32() * SAMPLE_RATE as f32) as u32;
        Self {
            inner,
            envelope,
            elapsed: 0,
            total_samples,
        }
    }
}

impl<S> Iterator for Shaped<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.elapsed >= self.total_samples {
            return None;
        }
        let t = self.elapsed as f32 / SAMPLE_RATE as f32;
        let value = self.inner.next()? * self.envelope.level_at(t);
        self.elapsed += 1;
        Some(value)
    }
}

impl<S> Source for Shaped<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.envelope.duration())
    }
}
