//! Minimal editor host: a document tree with stable node identities,
//! transactions with position mapping, immutable editor state and a view
//! that drives plugins.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod decoration;
pub mod document;
pub mod plugin;
pub mod state;
pub mod style;
pub mod transaction;
pub mod view;

pub type Tendril = SmartString<LazyCompact>;
