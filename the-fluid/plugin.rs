//! The fluid typing plugin.
//!
//! Its state slot holds the committed [`DecorationSet`]. After each change the
//! [`Detector`] looks for new characters. When it finds some, the plugin
//! hands the view a follow-up transaction carrying the fresh set in its
//! metadata. Every other transaction maps the committed set through its
//! changes.
//!
//! The memory starts out empty, so the first change in a document that
//! already holds text animates the first character of every text node.
//! [`FluidTyping::primed`] seeds the memory from the initial document
//! instead.

use std::any::Any;

use the_doc::{
  decoration::DecorationSet,
  document::Document,
  plugin::{
    Plugin,
    PluginKey,
  },
  state::EditorState,
  style::{
    StyleGuard,
    StyleSheet,
  },
  transaction::{
    ChangeSet,
    Transaction,
  },
};

use crate::{
  config::Config,
  detector::{
    Detection,
    Detector,
  },
  memory::ContentMemory,
  options::Options,
  style::KEYFRAMES,
};

pub const FLUID_TYPING: PluginKey = PluginKey::new("fluidTyping");

#[derive(Debug, Default)]
pub struct FluidTyping {
  detector:  Detector,
  keyframes: Option<StyleGuard>,
}

impl FluidTyping {
  pub fn configure(options: Options) -> Self {
    Self {
      detector:  Detector::new(options),
      keyframes: None,
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::configure(config.fluid_typing)
  }

  /// Remembers the text of `doc`, which must be the document the plugin is
  /// installed on, so that only characters typed afterwards animate.
  pub fn primed(mut self, doc: &Document) -> Self {
    self.detector.prime(doc);
    self
  }

  pub fn options(&self) -> &Options {
    self.detector.options()
  }

  pub fn memory(&self) -> &ContentMemory {
    self.detector.memory()
  }

  pub fn is_attached(&self) -> bool {
    self.keyframes.is_some()
  }

  /// The set committed in `state`, if the plugin is installed.
  pub fn decoration_set(state: &EditorState) -> Option<&DecorationSet> {
    state.field(FLUID_TYPING)
  }
}

fn map_or_drop(set: &DecorationSet, changes: &ChangeSet) -> DecorationSet {
  set.map(changes).unwrap_or_else(|err| {
    tracing::warn!(%err, "failed to map decorations, dropping them");
    DecorationSet::empty()
  })
}

impl Plugin for FluidTyping {
  fn key(&self) -> PluginKey {
    FLUID_TYPING
  }

  fn init(&self, _doc: &Document) -> Box<dyn Any> {
    Box::new(DecorationSet::empty())
  }

  fn apply(&self, tx: &Transaction, old: &dyn Any) -> Box<dyn Any> {
    if let Some(set) = tx.get_meta::<DecorationSet>(FLUID_TYPING) {
      // found against an older document, other follow-ups went first
      return Box::new(match tx.rebased() {
        Some(since) => map_or_drop(set, since),
        None => set.clone(),
      });
    }
    let Some(old) = old.downcast_ref::<DecorationSet>() else {
      tracing::warn!("unexpected fluid typing state, resetting");
      return Box::new(DecorationSet::empty());
    };
    if !tx.doc_changed() {
      return Box::new(old.clone());
    }
    Box::new(map_or_drop(old, tx.changes()))
  }

  fn attach(&mut self, styles: &StyleSheet) {
    if self.keyframes.is_none() {
      self.keyframes = Some(styles.inject(KEYFRAMES));
    }
  }

  fn update(&mut self, state: &EditorState, prev: &EditorState) -> Option<Transaction> {
    match self.detector.on_document_changed(prev.doc(), state.doc()) {
      Detection::Decorations(set) => Some(state.transaction().with_meta(FLUID_TYPING, set)),
      Detection::NoChange => None,
    }
  }

  fn decorations(&self, state: &EditorState) -> Option<DecorationSet> {
    Self::decoration_set(state).cloned()
  }

  fn detach(&mut self) {
    if let Some(keyframes) = self.keyframes.take() {
      keyframes.release();
    }
  }
}

#[cfg(test)]
mod tests {
  use the_doc::{
    decoration::Decoration,
    view::EditorView,
  };

  use super::*;

  fn view(text: &str) -> EditorView {
    EditorView::new(Document::from_text(text), vec![Box::new(FluidTyping::default())])
  }

  fn committed(view: &EditorView) -> Vec<std::ops::Range<usize>> {
    FluidTyping::decoration_set(view.state())
      .map(|set| set.iter().map(Decoration::range).collect())
      .unwrap_or_default()
  }

  #[test]
  fn starts_empty() {
    let view = view("");
    assert_eq!(FluidTyping::decoration_set(view.state()), Some(&DecorationSet::empty()));
    assert_eq!(view.decorations(), [DecorationSet::empty()]);
  }

  #[test]
  fn typing_commits_decorations() {
    let mut view = view("");
    let text = view.state().doc().text_nodes().next().unwrap().id;

    let mut tx = view.transaction();
    tx.insert_text(text, 0, "a").unwrap();
    view.dispatch(tx).unwrap();
    assert_eq!(committed(&view), [0..1]);

    let mut tx = view.transaction();
    tx.insert_text(text, 1, "b").unwrap();
    view.dispatch(tx).unwrap();
    assert_eq!(committed(&view), [1..2]);
  }

  #[test]
  fn keyframes_live_while_attached() {
    let mut view = view("");
    assert_eq!(view.styles().len(), 1);
    assert!(view.styles().to_css().contains("@keyframes fluidTypingFadeIn"));

    view.destroy();
    assert!(view.styles().is_empty());
    view.destroy();
    assert!(view.styles().is_empty());
  }

  #[test]
  fn instances_do_not_share_keyframes() {
    let styles = StyleSheet::new();
    let first = EditorView::with_styles(
      Document::new(),
      vec![Box::new(FluidTyping::default())],
      styles.clone(),
    );
    let second = EditorView::with_styles(
      Document::new(),
      vec![Box::new(FluidTyping::default())],
      styles.clone(),
    );
    assert_eq!(styles.len(), 2);
    drop(first);
    assert_eq!(styles.len(), 1);
    drop(second);
    assert!(styles.is_empty());
  }

  #[test]
  fn attach_is_idempotent() {
    let styles = StyleSheet::new();
    let mut plugin = FluidTyping::default();
    plugin.attach(&styles);
    plugin.attach(&styles);
    assert_eq!(styles.len(), 1);
    assert!(plugin.is_attached());
    plugin.detach();
    assert!(!plugin.is_attached());
    assert!(styles.is_empty());
  }
}
