//! Human-like pointer paths.
//!
//! A path is a single quadratic Bézier from the pointer's start to the
//! target, sampled with an ease-out parameter and a jitter that shrinks to
//! zero at the end. [`MotionPath`] yields steps lazily; playback (moving the
//! pointer and sleeping `delay_ms` between steps) belongs to whoever drives
//! the input device. Once the steps run out, [`MotionPath::finish`] produces
//! the settle-and-click timings.

use rand::Rng;

use crate::constants::{
    HULL_INSET_PX, MAX_CURVE_SPREAD, MAX_MOTION_STEPS, MAX_PATH_JITTER_PX, MIN_CURVE_SPREAD,
    MIN_MOTION_STEPS, MOTION_EASE_EXPONENT, PRESS_HOLD_MS, SETTLE_DELAY_MS, SETTLE_JITTER_PX,
    STEP_DELAY_MS,
};
use crate::geometry::{ScreenPoint, ScreenRect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerStep {
    pub point: ScreenPoint,
    /// Pause after moving to `point`.
    pub delay_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickPlan {
    pub settle: ScreenPoint,
    /// Pause between the settle move and the press.
    pub settle_delay_ms: u64,
    /// Pause between press and release.
    pub hold_ms: u64,
}

/// Ease-out: fast start, slow arrival.
pub fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powf(MOTION_EASE_EXPONENT)
}

/// Random point inside `bounds`, kept off the outer edge.
pub fn click_point_in<R: Rng + ?Sized>(bounds: &ScreenRect, rng: &mut R) -> ScreenPoint {
    let span_x = (bounds.width - 2 * HULL_INSET_PX).max(1);
    let span_y = (bounds.height - 2 * HULL_INSET_PX).max(1);
    ScreenPoint::new(
        bounds.x + HULL_INSET_PX + rng.gen_range(0..span_x),
        bounds.y + HULL_INSET_PX + rng.gen_range(0..span_y),
    )
}

fn pick_delay<R: Rng + ?Sized>(rng: &mut R, (min, max): (u64, u64)) -> u64 {
    rng.gen_range(min..=max)
}

pub struct MotionPath<R> {
    start: ScreenPoint,
    target: ScreenPoint,
    control: (f64, f64),
    steps: i32,
    next_step: i32,
    rng: R,
}

impl<R: Rng> MotionPath<R> {
    pub fn new(start: ScreenPoint, target: ScreenPoint, mut rng: R) -> Self {
        let distance = start.distance(target).round() as i32;
        let steps =
            (distance / 12 + 10 + rng.gen_range(0..8)).clamp(MIN_MOTION_STEPS, MAX_MOTION_STEPS);

        let spread = (distance / 5).clamp(MIN_CURVE_SPREAD, MAX_CURVE_SPREAD);
        let control = (
            f64::from(start.x + target.x) / 2.0 + f64::from(rng.gen_range(-spread..=spread)),
            f64::from(start.y + target.y) / 2.0 + f64::from(rng.gen_range(-spread..=spread)),
        );

        Self {
            start,
            target,
            control,
            steps,
            next_step: 1,
            rng,
        }
    }

    pub fn steps(&self) -> i32 {
        self.steps
    }

    pub fn control(&self) -> (f64, f64) {
        self.control
    }

    pub fn target(&self) -> ScreenPoint {
        self.target
    }

    /// Quadratic Bézier at `u` in `[0, 1]`; `u = 1` lands exactly on the target.
    pub fn curve_at(&self, u: f64) -> (f64, f64) {
        let inv = 1.0 - u;
        let (cx, cy) = self.control;
        let x = inv * inv * f64::from(self.start.x)
            + 2.0 * inv * u * cx
            + u * u * f64::from(self.target.x);
        let y = inv * inv * f64::from(self.start.y)
            + 2.0 * inv * u * cy
            + u * u * f64::from(self.target.y);
        (x, y)
    }

    /// Settle near the target and time the press/release pair.
    pub fn finish(mut self) -> ClickPlan {
        let settle = self.target.offset(
            self.rng.gen_range(-SETTLE_JITTER_PX..=SETTLE_JITTER_PX),
            self.rng.gen_range(-SETTLE_JITTER_PX..=SETTLE_JITTER_PX),
        );
        ClickPlan {
            settle,
            settle_delay_ms: pick_delay(&mut self.rng, SETTLE_DELAY_MS),
            hold_ms: pick_delay(&mut self.rng, PRESS_HOLD_MS),
        }
    }
}

impl<R: Rng> Iterator for MotionPath<R> {
    type Item = PointerStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_step > self.steps {
            return None;
        }
        let t = f64::from(self.next_step) / f64::from(self.steps);
        self.next_step += 1;

        let (x, y) = self.curve_at(ease_out(t));
        let jitter = (MAX_PATH_JITTER_PX * (1.0 - t)).round().max(0.0) as i32;
        let (jx, jy) = if jitter == 0 {
            (0, 0)
        } else {
            (
                self.rng.gen_range(-jitter..=jitter),
                self.rng.gen_range(-jitter..=jitter),
            )
        };

        Some(PointerStep {
            point: ScreenPoint::new(x.round() as i32 + jx, y.round() as i32 + jy),
            delay_ms: pick_delay(&mut self.rng, STEP_DELAY_MS),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps - self.next_step + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl<R: Rng> ExactSizeIterator for MotionPath<R> {}
