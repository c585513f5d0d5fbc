//! CSS emitted by fluid typing.

use std::fmt;

use the_doc::Tendril;

use crate::easing::AnimationEase;

pub const KEYFRAMES_NAME: &str = "fluidTypingFadeIn";

/// Injected once per attached instance and removed again on detach.
pub const KEYFRAMES: &str = "@keyframes fluidTypingFadeIn {
  from {
    opacity: 0;
    transform: translateY(10px);
  }
  to {
    opacity: 1;
    transform: translateY(0);
  }
}";

/// Inline style of one animated character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDirective {
  duration: f32,
  ease:     AnimationEase,
}

impl StyleDirective {
  pub fn new(duration: f32, ease: AnimationEase) -> Self {
    Self { duration, ease }
  }

  pub fn duration(&self) -> f32 {
    self.duration
  }

  pub fn ease(&self) -> AnimationEase {
    self.ease
  }

  pub fn to_css(&self) -> Tendril {
    use fmt::Write;

    let mut css = Tendril::new();
    // writing into a string cannot fail
    let _ = write!(css, "{self}");
    css
  }
}

impl fmt::Display for StyleDirective {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "display: inline-block; animation: {KEYFRAMES_NAME} {}s {} both;",
      self.duration,
      self.ease.css()
    )
  }
}
