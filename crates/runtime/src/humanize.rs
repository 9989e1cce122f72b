//! Randomized timing and click positions.
//!
//! A [`Humanizer`] is owned by the task context and drawn from by every
//! phase that needs a delay or a point. Seeding it makes a whole run
//! reproducible, which the tests rely on.
use std::f64::consts::TAU;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use world_core::{ScreenPoint, ScreenRect};

use crate::config::HumanizationProfile;

/// Seedable source of humanized randomness.
#[derive(Clone, Debug)]
pub struct Humanizer {
    rng: ChaCha8Rng,
}

impl Humanizer {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn from_profile(profile: &HumanizationProfile) -> Self {
        match profile.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Normally distributed sample (Box-Muller).
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1: f64 = self.rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.r#gen();
        let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        mean + z * std_dev
    }

    pub fn gaussian_clamped(&mut self, mean: f64, std_dev: f64, min: f64, max: f64) -> f64 {
        self.gaussian(mean, std_dev).clamp(min, max.max(min))
    }

    /// Uniform sample in `[min, max]`.
    pub fn uniform(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    pub fn uniform_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.rng.gen_bool(probability)
        }
    }

    /// Uniform delay in `[min, max]` at millisecond resolution.
    pub fn delay_between(&mut self, min: Duration, max: Duration) -> Duration {
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        Duration::from_millis(self.uniform(min_ms, max_ms))
    }

    /// Point inside `rect`, Gaussian around an off-center anchor.
    ///
    /// The anchor sits at 45-55% of each dimension, never the exact center,
    /// and the spread is 15% of the dimension. Samples are clamped inside.
    pub fn click_point(&mut self, rect: &ScreenRect) -> ScreenPoint {
        if rect.is_empty() {
            return ScreenPoint::new(rect.x, rect.y);
        }
        let width = f64::from(rect.width);
        let height = f64::from(rect.height);

        let anchor_x = f64::from(rect.x) + width * self.uniform_f64(0.45, 0.55);
        let anchor_y = f64::from(rect.y) + height * self.uniform_f64(0.45, 0.55);

        let x = self.gaussian_clamped(
            anchor_x,
            width * 0.15,
            f64::from(rect.x),
            f64::from(rect.right() - 1),
        );
        let y = self.gaussian_clamped(
            anchor_y,
            height * 0.15,
            f64::from(rect.y),
            f64::from(rect.bottom() - 1),
        );
        ScreenPoint::new(x.round() as i32, y.round() as i32)
    }
}
