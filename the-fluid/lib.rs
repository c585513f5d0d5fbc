//! Fluid typing: freshly typed characters fade in.
//!
//! Install [`FluidTyping`] into a [`the_doc::view::EditorView`]. After every
//! document change it compares each text node against the text it last saw
//! there and decorates the new characters with an inline fade-in animation.
//!
//! ```
//! use the_doc::{document::Document, view::EditorView};
//! use the_fluid::{AnimationEase, FluidTyping, Options};
//!
//! let options = Options::new(0.3, AnimationEase::EaseOutCubic)?;
//! let plugin = FluidTyping::configure(options);
//! let view = EditorView::new(Document::from_text(""), vec![Box::new(plugin)]);
//! assert!(view.styles().to_css().contains("fluidTypingFadeIn"));
//! # Ok::<(), the_fluid::ConfigError>(())
//! ```

pub mod animation;
pub mod config;
pub mod detector;
pub mod easing;
pub mod memory;
pub mod options;
pub mod plugin;
pub mod style;

pub use config::{
  Config,
  ConfigError,
};
pub use detector::{
  Detection,
  Detector,
};
pub use easing::AnimationEase;
pub use options::{
  InsertionMode,
  NodeIdentity,
  Options,
};
pub use plugin::{
  FLUID_TYPING,
  FluidTyping,
};
