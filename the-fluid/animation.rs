//! Native rendition of the fade-in, for hosts that do not render CSS.
//!
//! [`FadeIn`] samples the same keyframes the stylesheet declares: opacity
//! goes from 0 to 1 while the character slides up from 10px below its
//! resting position. Like the CSS `both` fill mode, the first frame is held
//! before the animation starts and the last one after it ends.

use crate::{
  easing::AnimationEase,
  options::Options,
};

/// Types that can be interpolated.
pub trait Lerp: Clone {
  /// `t` is in `[0.0, 1.0]`, where 0.0 is `self` and 1.0 is `target`.
  fn lerp(&self, target: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
  fn lerp(&self, target: &Self, t: f32) -> Self {
    self + (target - self) * t
  }
}

impl Lerp for (f32, f32) {
  fn lerp(&self, target: &Self, t: f32) -> Self {
    (self.0.lerp(&target.0, t), self.1.lerp(&target.1, t))
  }
}

/// Look of an animated character at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeFrame {
  pub opacity:  f32,
  /// Vertical offset in pixels, positive is downwards.
  pub offset_y: f32,
  pub done:     bool,
}

impl FadeFrame {
  pub const FROM: Self = Self {
    opacity:  0.0,
    offset_y: 10.0,
    done:     false,
  };
  pub const TO: Self = Self {
    opacity:  1.0,
    offset_y: 0.0,
    done:     true,
  };
}

impl Lerp for FadeFrame {
  fn lerp(&self, target: &Self, t: f32) -> Self {
    let (opacity, offset_y) =
      (self.opacity, self.offset_y).lerp(&(target.opacity, target.offset_y), t);
    Self {
      opacity,
      offset_y,
      done: t >= 1.0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeIn {
  /// Seconds.
  duration: f32,
  ease:     AnimationEase,
  elapsed:  f32,
}

impl FadeIn {
  pub fn new(duration: f32, ease: AnimationEase) -> Self {
    Self {
      duration,
      ease,
      elapsed: 0.0,
    }
  }

  pub fn from_options(options: &Options) -> Self {
    Self::new(options.animation_duration(), options.animation_ease())
  }

  /// Frame `elapsed` seconds after the character appeared.
  pub fn sample(&self, elapsed: f32) -> FadeFrame {
    if elapsed <= 0.0 {
      return FadeFrame::FROM;
    }
    if elapsed >= self.duration {
      return FadeFrame::TO;
    }
    let t = self.ease.apply(elapsed / self.duration);
    FadeFrame::FROM.lerp(&FadeFrame::TO, t)
  }

  /// Advances by `dt` seconds. Returns true once the animation is complete.
  pub fn update(&mut self, dt: f32) -> bool {
    self.elapsed += dt.max(0.0);
    self.is_complete()
  }

  pub fn current(&self) -> FadeFrame {
    self.sample(self.elapsed)
  }

  pub fn is_complete(&self) -> bool {
    self.elapsed >= self.duration
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_mode_holds_both_ends() {
    let fade = FadeIn::new(0.2, AnimationEase::EaseOut);
    assert_eq!(fade.sample(-1.0), FadeFrame::FROM);
    assert_eq!(fade.sample(0.0), FadeFrame::FROM);
    assert_eq!(fade.sample(0.2), FadeFrame::TO);
    assert_eq!(fade.sample(5.0), FadeFrame::TO);
  }

  #[test]
  fn linear_midpoint() {
    let fade = FadeIn::new(1.0, AnimationEase::Linear);
    let frame = fade.sample(0.5);
    assert!((frame.opacity - 0.5).abs() < 1e-3);
    assert!((frame.offset_y - 5.0).abs() < 1e-2);
    assert!(!frame.done);
  }

  #[test]
  fn update_runs_to_completion() {
    let mut fade = FadeIn::from_options(&Options::default());
    assert!(!fade.update(0.1));
    let halfway = fade.current();
    assert!(halfway.opacity > 0.5, "ease-out is past half at half time");
    assert!(halfway.offset_y < 5.0);
    assert!(fade.update(0.15));
    assert_eq!(fade.current(), FadeFrame::TO);
    assert!(fade.is_complete());
  }

  #[test]
  fn frames_progress_monotonically() {
    let fade = FadeIn::new(0.3, AnimationEase::EaseInOutCubic);
    let mut last = FadeFrame::FROM;
    for step in 1..=30 {
      let frame = fade.sample(step as f32 * 0.01);
      assert!(frame.opacity + 1e-4 >= last.opacity);
      assert!(frame.offset_y <= last.offset_y + 1e-3);
      last = frame;
    }
    assert!(fade.sample(0.3).done);
  }
}
