use std::{
  fmt,
  str::FromStr,
};

use crate::{
  config::ConfigError,
  easing::AnimationEase,
  style::StyleDirective,
};

/// Duration of the fade-in, in seconds.
pub const DEFAULT_DURATION: f32 = 0.2;

/// How text nodes are recognized across document changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeIdentity {
  /// By node id. Edits in one node never affect what another node
  /// remembers.
  #[default]
  Stable,
  /// By the position of the node's first character. A node whose position
  /// shifted is compared against whatever was previously remembered at its
  /// new position.
  Offset,
}

impl NodeIdentity {
  pub const fn name(self) -> &'static str {
    match self {
      Self::Stable => "stable",
      Self::Offset => "offset",
    }
  }
}

impl fmt::Display for NodeIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for NodeIdentity {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "stable" => Ok(Self::Stable),
      "offset" => Ok(Self::Offset),
      _ => Err(ConfigError::UnknownIdentity(s.to_owned())),
    }
  }
}

/// Which characters of a grown text node get animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InsertionMode {
  /// One character, right after the length the node had before.
  #[default]
  Trailing,
  /// Every character between the unchanged prefix and suffix.
  PerCharacter,
}

impl InsertionMode {
  pub const fn name(self) -> &'static str {
    match self {
      Self::Trailing => "trailing",
      Self::PerCharacter => "per-character",
    }
  }
}

impl fmt::Display for InsertionMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for InsertionMode {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "trailing" => Ok(Self::Trailing),
      "per-character" => Ok(Self::PerCharacter),
      _ => Err(ConfigError::UnknownInsertion(s.to_owned())),
    }
  }
}

/// Validated settings of one fluid typing instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
  animation_duration: f32,
  animation_ease:     AnimationEase,
  identity:           NodeIdentity,
  insertion:          InsertionMode,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      animation_duration: DEFAULT_DURATION,
      animation_ease:     AnimationEase::default(),
      identity:           NodeIdentity::default(),
      insertion:          InsertionMode::default(),
    }
  }
}

impl Options {
  pub fn new(animation_duration: f32, animation_ease: AnimationEase) -> Result<Self, ConfigError> {
    Self::default()
      .with_duration(animation_duration)
      .map(|options| options.with_ease(animation_ease))
  }

  pub fn with_duration(mut self, secs: f32) -> Result<Self, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
      return Err(ConfigError::InvalidDuration(secs));
    }
    self.animation_duration = secs;
    Ok(self)
  }

  pub fn with_ease(mut self, ease: AnimationEase) -> Self {
    self.animation_ease = ease;
    self
  }

  pub fn with_identity(mut self, identity: NodeIdentity) -> Self {
    self.identity = identity;
    self
  }

  pub fn with_insertion(mut self, insertion: InsertionMode) -> Self {
    self.insertion = insertion;
    self
  }

  /// Seconds.
  pub fn animation_duration(&self) -> f32 {
    self.animation_duration
  }

  pub fn animation_ease(&self) -> AnimationEase {
    self.animation_ease
  }

  pub fn identity(&self) -> NodeIdentity {
    self.identity
  }

  pub fn insertion(&self) -> InsertionMode {
    self.insertion
  }

  pub fn style(&self) -> StyleDirective {
    StyleDirective::new(self.animation_duration, self.animation_ease)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let options = Options::default();
    assert_eq!(options.animation_duration(), 0.2);
    assert_eq!(options.animation_ease(), AnimationEase::EaseOut);
    assert_eq!(options.identity(), NodeIdentity::Stable);
    assert_eq!(options.insertion(), InsertionMode::Trailing);
  }

  #[test]
  fn rejects_bad_durations() {
    for secs in [0.0, -0.5, f32::NAN, f32::INFINITY] {
      let err = Options::default().with_duration(secs).unwrap_err();
      assert!(matches!(err, ConfigError::InvalidDuration(_)), "{secs}");
    }
    let options = Options::new(0.35, AnimationEase::EaseInCubic).unwrap();
    assert_eq!(options.animation_duration(), 0.35);
    assert_eq!(options.animation_ease(), AnimationEase::EaseInCubic);
  }

  #[test]
  fn modes_parse() {
    assert_eq!("offset".parse::<NodeIdentity>().unwrap(), NodeIdentity::Offset);
    assert_eq!(
      "per-character".parse::<InsertionMode>().unwrap(),
      InsertionMode::PerCharacter
    );
    assert!(matches!(
      "by-id".parse::<NodeIdentity>(),
      Err(ConfigError::UnknownIdentity(name)) if name == "by-id"
    ));
    assert!(matches!(
      "all".parse::<InsertionMode>(),
      Err(ConfigError::UnknownInsertion(name)) if name == "all"
    ));
  }
}
