//! Per-character variation: the engine that makes type look handwritten
//!
//! Every non-whitespace character gets a small baseline offset, a slant, a
//! micro-tilt, and a perturbed ink color. The numbers come from an
//! injected [`VariationStrategy`]; two are provided:
//!
//! - [`RealisticStrategy`] blends a slow-moving noise signal with uniform
//!   randomness, so consecutive characters drift together the way a pen
//!   does instead of scattering independently.
//! - [`SubtleStrategy`] is the same signal at roughly half amplitude.
//!
//! Whatever the strategy, output magnitude never exceeds the requested
//! range: `|jitter(r)| <= r` holds for every call.

use crate::types::TextVariation;
use crate::Color;

/// Default baseline jitter range, pixels
pub const DEFAULT_BASELINE_JITTER: f32 = 1.5;
/// Default slant jitter range, radians
pub const DEFAULT_SLANT_JITTER: f32 = 0.035;
/// Default micro-tilt range, radians
pub const DEFAULT_MICRO_TILT: f32 = 0.02;
/// Default color variation intensity
pub const DEFAULT_COLOR_INTENSITY: f32 = 1.0;

/// Hard ceiling for positional/rotational ranges
pub const MAX_JITTER_RANGE: f32 = 2.5;
/// Hard ceiling for color variation intensity
pub const MAX_COLOR_INTENSITY: f32 = 3.0;

/// Fraction of full channel scale perturbed at intensity 1.0
const COLOR_CHANNEL_SPREAD: f32 = 0.06;

/// How the noise phase advances per generated value
const PHASE_STEP: f32 = 0.35;
/// Weight of the coherent drift signal vs. pure randomness
const DRIFT_WEIGHT: f32 = 0.6;

/// Numeric source behind the variation engine
///
/// Implementations must keep every output inside `[-range, range]`.
pub trait VariationStrategy {
    /// A positional offset within `[-range, range]`
    fn jitter(&mut self, range: f32) -> f32;

    /// A rotation within `[-range, range]` radians
    fn rotation(&mut self, range: f32) -> f32;

    /// The base ink color with each RGB channel perturbed by up to
    /// `intensity * ~6%` of full scale
    fn color_variation(&mut self, base: Color, intensity: f32) -> Color;

    /// Restart the stream from a known seed
    fn reseed(&mut self, seed: u64);
}

/// Coherent drift plus bounded randomness, approximating pen flow
pub struct RealisticStrategy {
    rng: fastrand::Rng,
    phase: f32,
}

impl RealisticStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            phase: (seed % 628) as f32 / 100.0,
        }
    }

    fn signed_unit(&mut self) -> f32 {
        self.rng.f32() * 2.0 - 1.0
    }

    fn blended(&mut self, range: f32) -> f32 {
        if range <= 0.0 {
            return 0.0;
        }
        self.phase += PHASE_STEP;
        let drift = self.phase.sin();
        let noise = self.signed_unit();
        (drift * DRIFT_WEIGHT + noise * (1.0 - DRIFT_WEIGHT)) * range
    }
}

impl VariationStrategy for RealisticStrategy {
    fn jitter(&mut self, range: f32) -> f32 {
        self.blended(range)
    }

    fn rotation(&mut self, range: f32) -> f32 {
        self.blended(range)
    }

    fn color_variation(&mut self, base: Color, intensity: f32) -> Color {
        if intensity <= 0.0 {
            return base;
        }
        let spread = intensity * COLOR_CHANNEL_SPREAD * 255.0;
        let mut delta = || (self.signed_unit() * spread).round() as i16;
        base.shifted(delta(), delta(), delta())
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
        self.phase = (seed % 628) as f32 / 100.0;
    }
}

/// Realistic output scaled down for a calmer look
pub struct SubtleStrategy {
    inner: RealisticStrategy,
}

/// How much of the realistic amplitude survives
const SUBTLE_SCALE: f32 = 0.5;

impl SubtleStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: RealisticStrategy::new(seed),
        }
    }
}

impl VariationStrategy for SubtleStrategy {
    fn jitter(&mut self, range: f32) -> f32 {
        self.inner.jitter(range) * SUBTLE_SCALE
    }

    fn rotation(&mut self, range: f32) -> f32 {
        self.inner.rotation(range) * SUBTLE_SCALE
    }

    fn color_variation(&mut self, base: Color, intensity: f32) -> Color {
        self.inner.color_variation(base, intensity * SUBTLE_SCALE)
    }

    fn reseed(&mut self, seed: u64) {
        self.inner.reseed(seed);
    }
}

/// The closed set of strategies, chosen at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Realistic,
    Subtle,
}

enum Strategy {
    Realistic(RealisticStrategy),
    Subtle(SubtleStrategy),
}

impl Strategy {
    fn new(kind: StrategyKind, seed: u64) -> Self {
        match kind {
            StrategyKind::Realistic => Strategy::Realistic(RealisticStrategy::new(seed)),
            StrategyKind::Subtle => Strategy::Subtle(SubtleStrategy::new(seed)),
        }
    }

    fn as_dyn(&mut self) -> &mut dyn VariationStrategy {
        match self {
            Strategy::Realistic(s) => s,
            Strategy::Subtle(s) => s,
        }
    }
}

/// Per-field range overrides for [`VariationEngine::configure_ranges`]
///
/// `None` leaves the current value alone; non-finite values fall back to
/// the documented default for that field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeOverrides {
    pub baseline_jitter: Option<f32>,
    pub slant_jitter: Option<f32>,
    pub micro_tilt: Option<f32>,
    pub color_intensity: Option<f32>,
}

/// Generates a [`TextVariation`] per character
pub struct VariationEngine {
    strategy: Strategy,
    baseline_range: f32,
    slant_range: f32,
    tilt_range: f32,
    color_intensity: f32,
    /// Global multiplier over all ranges, 0–3
    intensity: f32,
    base_ink: Color,
}

impl VariationEngine {
    pub fn new(kind: StrategyKind, seed: u64) -> Self {
        Self {
            strategy: Strategy::new(kind, seed),
            baseline_range: DEFAULT_BASELINE_JITTER,
            slant_range: DEFAULT_SLANT_JITTER,
            tilt_range: DEFAULT_MICRO_TILT,
            color_intensity: DEFAULT_COLOR_INTENSITY,
            intensity: 1.0,
            base_ink: Color::ink_blue(),
        }
    }

    pub fn set_base_ink(&mut self, color: Color) {
        self.base_ink = color;
    }

    /// Clamp to [0, 3]; anything non-finite resets to the neutral 1.0.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_finite() {
            intensity.clamp(0.0, MAX_COLOR_INTENSITY)
        } else {
            log::warn!("non-finite variation intensity, resetting to 1.0");
            1.0
        };
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Override individual ranges. Each value is clamped to its safe
    /// bound; non-finite inputs fall back to that field's default.
    pub fn configure_ranges(&mut self, overrides: RangeOverrides) {
        fn apply(slot: &mut f32, value: Option<f32>, max: f32, default: f32) {
            if let Some(v) = value {
                *slot = if v.is_finite() {
                    v.clamp(0.0, max)
                } else {
                    default
                };
            }
        }
        apply(
            &mut self.baseline_range,
            overrides.baseline_jitter,
            MAX_JITTER_RANGE,
            DEFAULT_BASELINE_JITTER,
        );
        apply(
            &mut self.slant_range,
            overrides.slant_jitter,
            MAX_JITTER_RANGE,
            DEFAULT_SLANT_JITTER,
        );
        apply(
            &mut self.tilt_range,
            overrides.micro_tilt,
            MAX_JITTER_RANGE,
            DEFAULT_MICRO_TILT,
        );
        apply(
            &mut self.color_intensity,
            overrides.color_intensity,
            MAX_COLOR_INTENSITY,
            DEFAULT_COLOR_INTENSITY,
        );
    }

    /// Restart the stream; renderers reseed per character so a page
    /// renders the same way twice.
    pub fn reseed(&mut self, seed: u64) {
        self.strategy.as_dyn().reseed(seed);
    }

    /// Variation for one character at one position.
    ///
    /// Whitespace spends no jitter: it always gets the neutral variation.
    pub fn variation(&mut self, ch: char, position: usize) -> TextVariation {
        if ch.is_whitespace() {
            return TextVariation::none(self.base_ink);
        }
        let _ = position; // reserved for position-aware strategies
        let intensity = self.intensity;
        let base = self.base_ink;
        let baseline = self.baseline_range * intensity;
        let slant = self.slant_range * intensity;
        let tilt = self.tilt_range * intensity;
        let color_intensity = self.color_intensity * intensity;
        let strategy = self.strategy.as_dyn();
        TextVariation {
            baseline_jitter: strategy.jitter(baseline),
            slant_jitter: strategy.rotation(slant),
            micro_tilt: strategy.rotation(tilt),
            color: strategy.color_variation(base, color_intensity),
        }
    }

    /// Precompute variations for a whole string.
    pub fn batch_variations(&mut self, text: &str) -> Vec<TextVariation> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| self.variation(ch, i))
            .collect()
    }
}

/// Mix a line index, character index, and character code into a seed.
///
/// Not a cryptographic hash; just enough avalanche that neighbouring
/// characters land on unrelated streams.
pub fn char_seed(line: usize, column: usize, ch: char) -> u64 {
    let mut x = (line as u64)
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add((column as u64).wrapping_mul(0xbf58_476d_1ce4_e5b9))
        .wrapping_add(ch as u64);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intensity_yields_neutral_variation() {
        let mut engine = VariationEngine::new(StrategyKind::Realistic, 7);
        engine.set_base_ink(Color::black());
        engine.set_intensity(0.0);
        for (i, ch) in "Handwriting 123!".chars().enumerate() {
            let v = engine.variation(ch, i);
            assert_eq!(v.baseline_jitter, 0.0, "char {ch:?}");
            assert_eq!(v.slant_jitter, 0.0);
            assert_eq!(v.micro_tilt, 0.0);
            assert_eq!(v.color, Color::black());
        }
    }

    #[test]
    fn jitter_magnitude_bounded_by_range_times_intensity() {
        for &intensity in &[0.25, 1.0, 2.0, 3.0] {
            let mut engine = VariationEngine::new(StrategyKind::Realistic, 42);
            engine.set_intensity(intensity);
            let range = DEFAULT_BASELINE_JITTER;
            for i in 0..500 {
                let v = engine.variation('m', i);
                assert!(
                    v.baseline_jitter.abs() <= range * intensity + f32::EPSILON,
                    "|{}| > {} * {}",
                    v.baseline_jitter,
                    range,
                    intensity
                );
            }
        }
    }

    #[test]
    fn whitespace_gets_zero_variation_in_batches() {
        let mut engine = VariationEngine::new(StrategyKind::Realistic, 1);
        engine.set_base_ink(Color::ink_blue());
        let variations = engine.batch_variations("a b\tc\nd");
        for (ch, v) in "a b\tc\nd".chars().zip(&variations) {
            if ch.is_whitespace() {
                assert_eq!(*v, TextVariation::none(Color::ink_blue()));
            }
        }
        assert_eq!(variations.len(), 7);
    }

    #[test]
    fn non_finite_intensity_resets_to_neutral() {
        let mut engine = VariationEngine::new(StrategyKind::Subtle, 3);
        engine.set_intensity(f32::NAN);
        assert_eq!(engine.intensity(), 1.0);
        engine.set_intensity(f32::INFINITY);
        assert_eq!(engine.intensity(), 1.0);
        engine.set_intensity(5.0);
        assert_eq!(engine.intensity(), 3.0);
    }

    #[test]
    fn configure_ranges_clamps_and_defaults() {
        let mut engine = VariationEngine::new(StrategyKind::Realistic, 3);
        engine.configure_ranges(RangeOverrides {
            baseline_jitter: Some(10.0),
            slant_jitter: Some(f32::NAN),
            micro_tilt: None,
            color_intensity: Some(-1.0),
        });
        assert_eq!(engine.baseline_range, MAX_JITTER_RANGE);
        assert_eq!(engine.slant_range, DEFAULT_SLANT_JITTER);
        assert_eq!(engine.tilt_range, DEFAULT_MICRO_TILT);
        assert_eq!(engine.color_intensity, 0.0);
    }

    #[test]
    fn subtle_is_calmer_than_realistic() {
        let mut realistic = RealisticStrategy::new(99);
        let mut subtle = SubtleStrategy::new(99);
        let r_spread: f32 = (0..200).map(|_| realistic.jitter(1.0).abs()).sum();
        let s_spread: f32 = (0..200).map(|_| subtle.jitter(1.0).abs()).sum();
        assert!(s_spread < r_spread);
    }

    #[test]
    fn reseeding_reproduces_the_stream() {
        let mut engine = VariationEngine::new(StrategyKind::Realistic, 0);
        engine.reseed(1234);
        let first = engine.variation('q', 0);
        engine.reseed(1234);
        let second = engine.variation('q', 0);
        assert_eq!(first, second);
    }

    #[test]
    fn char_seed_varies_with_every_input() {
        let base = char_seed(2, 3, 'a');
        assert_ne!(base, char_seed(3, 3, 'a'));
        assert_ne!(base, char_seed(2, 4, 'a'));
        assert_ne!(base, char_seed(2, 3, 'b'));
    }
}
