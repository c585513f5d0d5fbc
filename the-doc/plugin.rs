//! Extension points of the editor.
//!
//! A [`Plugin`] owns one slot of [`EditorState`] (addressed by its
//! [`PluginKey`]), is told about every dispatched transaction, and can hand
//! decorations to the rendering layer.
//!
//! The order of calls for one dispatched transaction is:
//!
//! 1. [`Plugin::apply`] computes the new slot value from the old one,
//! 2. the view swaps in the new state,
//! 3. [`Plugin::update`] sees the new and the previous state and may return a
//!    follow-up transaction. Follow-ups are dispatched after the current
//!    cycle finished, never from inside it.

use std::any::Any;

use crate::{
  decoration::DecorationSet,
  document::Document,
  state::EditorState,
  style::StyleSheet,
  transaction::Transaction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginKey(&'static str);

impl PluginKey {
  pub const fn new(name: &'static str) -> Self {
    Self(name)
  }

  pub const fn name(self) -> &'static str {
    self.0
  }
}

pub trait Plugin {
  fn key(&self) -> PluginKey;

  /// Initial value of the plugin's state slot.
  fn init(&self, doc: &Document) -> Box<dyn Any>;

  /// Computes the slot value after `tx` from the previous value.
  fn apply(&self, tx: &Transaction, old: &dyn Any) -> Box<dyn Any>;

  /// Called once when the plugin is attached to a view.
  fn attach(&mut self, _styles: &StyleSheet) {}

  /// Called after every state change.
  fn update(&mut self, _state: &EditorState, _prev: &EditorState) -> Option<Transaction> {
    None
  }

  fn decorations(&self, _state: &EditorState) -> Option<DecorationSet> {
    None
  }

  /// Called once when the view is torn down.
  fn detach(&mut self) {}
}
