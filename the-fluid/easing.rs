//! Named animation curves.
//!
//! Every curve has a CSS value, used verbatim in the inline style of a
//! decoration, and a cubic bezier that native renderers sample with
//! [`AnimationEase::apply`].

use std::{
  fmt,
  str::FromStr,
};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationEase {
  Linear,
  Ease,
  EaseIn,
  #[default]
  EaseOut,
  EaseInOut,
  EaseInSine,
  EaseOutSine,
  EaseInOutSine,
  EaseInQuad,
  EaseOutQuad,
  EaseInOutQuad,
  EaseInCubic,
  EaseOutCubic,
  EaseInOutCubic,
  EaseInQuart,
  EaseOutQuart,
  EaseInOutQuart,
}

impl AnimationEase {
  pub const ALL: [Self; 17] = [
    Self::Linear,
    Self::Ease,
    Self::EaseIn,
    Self::EaseOut,
    Self::EaseInOut,
    Self::EaseInSine,
    Self::EaseOutSine,
    Self::EaseInOutSine,
    Self::EaseInQuad,
    Self::EaseOutQuad,
    Self::EaseInOutQuad,
    Self::EaseInCubic,
    Self::EaseOutCubic,
    Self::EaseInOutCubic,
    Self::EaseInQuart,
    Self::EaseOutQuart,
    Self::EaseInOutQuart,
  ];

  /// Name used in configuration files.
  pub const fn name(self) -> &'static str {
    match self {
      Self::Linear => "linear",
      Self::Ease => "ease",
      Self::EaseIn => "ease-in",
      Self::EaseOut => "ease-out",
      Self::EaseInOut => "ease-in-out",
      Self::EaseInSine => "ease-in-sine",
      Self::EaseOutSine => "ease-out-sine",
      Self::EaseInOutSine => "ease-in-out-sine",
      Self::EaseInQuad => "ease-in-quad",
      Self::EaseOutQuad => "ease-out-quad",
      Self::EaseInOutQuad => "ease-in-out-quad",
      Self::EaseInCubic => "ease-in-cubic",
      Self::EaseOutCubic => "ease-out-cubic",
      Self::EaseInOutCubic => "ease-in-out-cubic",
      Self::EaseInQuart => "ease-in-quart",
      Self::EaseOutQuart => "ease-out-quart",
      Self::EaseInOutQuart => "ease-in-out-quart",
    }
  }

  /// Value of the CSS `animation-timing-function`.
  pub const fn css(self) -> &'static str {
    match self {
      Self::Linear => "linear",
      Self::Ease => "ease",
      Self::EaseIn => "ease-in",
      Self::EaseOut => "ease-out",
      Self::EaseInOut => "ease-in-out",
      Self::EaseInSine => "cubic-bezier(0.47, 0, 0.745, 0.715)",
      Self::EaseOutSine => "cubic-bezier(0.39, 0.575, 0.565, 1)",
      Self::EaseInOutSine => "cubic-bezier(0.445, 0.05, 0.55, 0.95)",
      Self::EaseInQuad => "cubic-bezier(0.55, 0.085, 0.68, 0.53)",
      Self::EaseOutQuad => "cubic-bezier(0.25, 0.46, 0.45, 0.94)",
      Self::EaseInOutQuad => "cubic-bezier(0.455, 0.03, 0.515, 0.955)",
      Self::EaseInCubic => "cubic-bezier(0.55, 0.055, 0.675, 0.19)",
      Self::EaseOutCubic => "cubic-bezier(0.215, 0.61, 0.355, 1)",
      Self::EaseInOutCubic => "cubic-bezier(0.645, 0.045, 0.355, 1)",
      Self::EaseInQuart => "cubic-bezier(0.895, 0.03, 0.685, 0.22)",
      Self::EaseOutQuart => "cubic-bezier(0.165, 0.84, 0.44, 1)",
      Self::EaseInOutQuart => "cubic-bezier(0.77, 0, 0.175, 1)",
    }
  }

  /// Control points of the curve. The CSS keywords use the points the CSS
  /// easing spec assigns to them.
  pub const fn bezier(self) -> CubicBezier {
    match self {
      Self::Linear => CubicBezier::new(0.0, 0.0, 1.0, 1.0),
      Self::Ease => CubicBezier::new(0.25, 0.1, 0.25, 1.0),
      Self::EaseIn => CubicBezier::new(0.42, 0.0, 1.0, 1.0),
      Self::EaseOut => CubicBezier::new(0.0, 0.0, 0.58, 1.0),
      Self::EaseInOut => CubicBezier::new(0.42, 0.0, 0.58, 1.0),
      Self::EaseInSine => CubicBezier::new(0.47, 0.0, 0.745, 0.715),
      Self::EaseOutSine => CubicBezier::new(0.39, 0.575, 0.565, 1.0),
      Self::EaseInOutSine => CubicBezier::new(0.445, 0.05, 0.55, 0.95),
      Self::EaseInQuad => CubicBezier::new(0.55, 0.085, 0.68, 0.53),
      Self::EaseOutQuad => CubicBezier::new(0.25, 0.46, 0.45, 0.94),
      Self::EaseInOutQuad => CubicBezier::new(0.455, 0.03, 0.515, 0.955),
      Self::EaseInCubic => CubicBezier::new(0.55, 0.055, 0.675, 0.19),
      Self::EaseOutCubic => CubicBezier::new(0.215, 0.61, 0.355, 1.0),
      Self::EaseInOutCubic => CubicBezier::new(0.645, 0.045, 0.355, 1.0),
      Self::EaseInQuart => CubicBezier::new(0.895, 0.03, 0.685, 0.22),
      Self::EaseOutQuart => CubicBezier::new(0.165, 0.84, 0.44, 1.0),
      Self::EaseInOutQuart => CubicBezier::new(0.77, 0.0, 0.175, 1.0),
    }
  }

  /// Apply the curve to a linear progress value (0.0 to 1.0).
  pub fn apply(self, t: f32) -> f32 {
    self.bezier().sample(t)
  }
}

impl fmt::Display for AnimationEase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for AnimationEase {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|ease| ease.name() == s)
      .ok_or_else(|| ConfigError::UnknownEase(s.to_owned()))
  }
}

/// A CSS style cubic bezier through `(0, 0)`, `(x1, y1)`, `(x2, y2)` and
/// `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
}

impl CubicBezier {
  const NEWTON_ITERATIONS: usize = 8;
  const BISECTION_ITERATIONS: usize = 32;
  const EPSILON: f32 = 1e-6;

  pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
    Self { x1, y1, x2, y2 }
  }

  /// Progress of the curve at `x`, clamped to the unit interval.
  pub fn sample(&self, x: f32) -> f32 {
    if x <= 0.0 {
      return 0.0;
    }
    if x >= 1.0 {
      return 1.0;
    }
    Self::component(self.y1, self.y2, self.solve_t(x))
  }

  /// Polynomial form of one coordinate at parameter `t`.
  fn component(p1: f32, p2: f32, t: f32) -> f32 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    ((a * t + b) * t + c) * t
  }

  fn slope(p1: f32, p2: f32, t: f32) -> f32 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    (3.0 * a * t + 2.0 * b) * t + c
  }

  /// Finds the curve parameter whose x coordinate is `x`.
  fn solve_t(&self, x: f32) -> f32 {
    let mut t = x;
    for _ in 0..Self::NEWTON_ITERATIONS {
      let error = Self::component(self.x1, self.x2, t) - x;
      if error.abs() < Self::EPSILON {
        return t;
      }
      let slope = Self::slope(self.x1, self.x2, t);
      if slope.abs() < Self::EPSILON {
        break;
      }
      t -= error / slope;
    }

    // x(t) is monotonic for control points inside the unit square
    let (mut low, mut high) = (0.0_f32, 1.0_f32);
    t = x;
    for _ in 0..Self::BISECTION_ITERATIONS {
      let value = Self::component(self.x1, self.x2, t);
      if (value - x).abs() < Self::EPSILON {
        break;
      }
      if value < x {
        low = t;
      } else {
        high = t;
      }
      t = (low + high) / 2.0;
    }
    t
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn endpoints_are_fixed() {
    for ease in AnimationEase::ALL {
      assert_eq!(ease.apply(0.0), 0.0, "{ease}");
      assert_eq!(ease.apply(1.0), 1.0, "{ease}");
      assert_eq!(ease.apply(-3.0), 0.0, "{ease}");
      assert_eq!(ease.apply(7.0), 1.0, "{ease}");
    }
  }

  #[test]
  fn linear_is_identity() {
    for t in [0.1, 0.25, 0.5, 0.9] {
      assert!((AnimationEase::Linear.apply(t) - t).abs() < 1e-4);
    }
  }

  #[test]
  fn curve_shapes() {
    assert!(AnimationEase::EaseOut.apply(0.5) > 0.5);
    assert!(AnimationEase::EaseOutCubic.apply(0.5) > AnimationEase::EaseOutQuad.apply(0.5));
    assert!(AnimationEase::EaseIn.apply(0.5) < 0.5);
    assert!(AnimationEase::EaseInQuart.apply(0.5) < AnimationEase::EaseInQuad.apply(0.5));
    assert!((AnimationEase::EaseInOut.apply(0.5) - 0.5).abs() < 1e-3);
  }

  #[test]
  fn curves_are_monotonic() {
    for ease in AnimationEase::ALL {
      let mut last = 0.0;
      for step in 1..=100 {
        let value = ease.apply(step as f32 / 100.0);
        assert!(value + 1e-4 >= last, "{ease} decreases at step {step}");
        last = value;
      }
    }
  }

  #[test]
  fn names_parse_back() {
    for ease in AnimationEase::ALL {
      assert_eq!(ease.name().parse::<AnimationEase>().unwrap(), ease);
    }
  }

  #[test]
  fn unknown_name_is_reported() {
    let err = "ease-out-bounce".parse::<AnimationEase>().unwrap_err();
    assert!(matches!(&err, ConfigError::UnknownEase(name) if name == "ease-out-bounce"));
    assert!(err.to_string().contains("ease-out-bounce"));
  }

  #[test]
  fn css_values() {
    assert_eq!(AnimationEase::default().css(), "ease-out");
    assert_eq!(
      AnimationEase::EaseOutCubic.css(),
      "cubic-bezier(0.215, 0.61, 0.355, 1)"
    );
    assert_eq!(AnimationEase::EaseInOutQuart.css(), "cubic-bezier(0.77, 0, 0.175, 1)");
  }

  quickcheck::quickcheck! {
    fn samples_stay_in_unit_range(t: f32) -> bool {
      AnimationEase::ALL.iter().all(|ease| {
        let value = ease.apply(t);
        // back-easing curves are not in the table, so nothing overshoots
        t.is_nan() || (-1e-4..=1.0 + 1e-4).contains(&value)
      })
    }
  }
}
