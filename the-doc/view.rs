use std::collections::VecDeque;

use crate::{
  decoration::DecorationSet,
  document::Document,
  plugin::Plugin,
  state::EditorState,
  style::StyleSheet,
  transaction::{
    ChangeSet,
    Result,
    Transaction,
    TransactionError,
  },
};

/// Owns the current [`EditorState`] and drives the plugins.
///
/// Transactions are handled strictly in dispatch order. A follow-up
/// transaction returned from [`Plugin::update`] is queued and handled once
/// every plugin saw the current state.
pub struct EditorView {
  state:    EditorState,
  plugins:  Vec<Box<dyn Plugin>>,
  styles:   StyleSheet,
  attached: bool,
}

impl EditorView {
  pub fn new(doc: Document, plugins: Vec<Box<dyn Plugin>>) -> Self {
    Self::with_styles(doc, plugins, StyleSheet::new())
  }

  pub fn with_styles(doc: Document, mut plugins: Vec<Box<dyn Plugin>>, styles: StyleSheet) -> Self {
    let state = EditorState::new(doc, &plugins);
    for plugin in &mut plugins {
      plugin.attach(&styles);
    }
    Self {
      state,
      plugins,
      styles,
      attached: true,
    }
  }

  pub fn state(&self) -> &EditorState {
    &self.state
  }

  pub fn styles(&self) -> &StyleSheet {
    &self.styles
  }

  /// Starts a transaction on top of the current state.
  pub fn transaction(&self) -> Transaction {
    self.state.transaction()
  }

  /// Applies `tx`, then every follow-up the plugins return, in the order
  /// they were returned.
  ///
  /// A follow-up that was built against an earlier state of the same
  /// dispatch and does not edit the document is rebased onto the current
  /// state. Editing follow-ups built against an earlier state are rejected
  /// as stale. On error the transactions applied before the failing one
  /// stay applied and the rest of the queue is dropped.
  pub fn dispatch(&mut self, tx: Transaction) -> Result<()> {
    // changes applied so far, with the revision each one was applied to
    let mut history: Vec<(u64, ChangeSet)> = Vec::new();
    let mut queue = VecDeque::from([tx]);
    while let Some(tx) = queue.pop_front() {
      let tx = self.rebase(tx, &history)?;
      let revision = self.state.revision();
      let changes = tx.changes().clone();
      let state = self.state.apply(tx, &self.plugins)?;
      history.push((revision, changes));

      let prev = std::mem::replace(&mut self.state, state);
      if !self.attached {
        continue;
      }
      for plugin in &mut self.plugins {
        if let Some(follow_up) = plugin.update(&self.state, &prev) {
          queue.push_back(follow_up);
        }
      }
    }
    Ok(())
  }

  fn rebase(&self, tx: Transaction, history: &[(u64, ChangeSet)]) -> Result<Transaction> {
    let revision = self.state.revision();
    if tx.base() == revision {
      return Ok(tx);
    }
    let Some(start) = history.iter().position(|(applied_to, _)| *applied_to == tx.base()) else {
      return Err(TransactionError::Stale {
        base: tx.base(),
        revision,
      });
    };

    let mut since = ChangeSet::new(history[start].1.len());
    for (_, changes) in &history[start..] {
      since = since.compose(changes.clone())?;
    }
    tracing::trace!(base = tx.base(), revision, "rebasing follow-up transaction");
    tx.rebase(self.state.doc(), revision, since)
  }

  /// Decorations of every plugin, in plugin order.
  pub fn decorations(&self) -> Vec<DecorationSet> {
    self
      .plugins
      .iter()
      .filter_map(|plugin| plugin.decorations(&self.state))
      .collect()
  }

  /// Detaches every plugin. Later calls do nothing.
  pub fn destroy(&mut self) {
    if !self.attached {
      return;
    }
    self.attached = false;
    for plugin in self.plugins.iter_mut().rev() {
      plugin.detach();
    }
  }
}

impl Drop for EditorView {
  fn drop(&mut self) {
    self.destroy();
  }
}

#[cfg(test)]
mod tests {
  use std::{
    any::Any,
    cell::Cell,
    rc::Rc,
  };

  use super::*;
  use crate::{
    decoration::Decoration,
    plugin::PluginKey,
    style::StyleGuard,
  };

  const ECHO: PluginKey = PluginKey::new("echo");

  /// Marks the last character after every document change and records
  /// its lifecycle.
  struct Echo {
    guard:    Option<StyleGuard>,
    detached: Rc<Cell<usize>>,
  }

  impl Plugin for Echo {
    fn key(&self) -> PluginKey {
      ECHO
    }

    fn init(&self, _doc: &Document) -> Box<dyn Any> {
      Box::new(DecorationSet::empty())
    }

    fn apply(&self, tx: &Transaction, old: &dyn Any) -> Box<dyn Any> {
      if let Some(set) = tx.get_meta::<DecorationSet>(ECHO) {
        return Box::new(match tx.rebased() {
          Some(since) => set.map(since).unwrap_or_default(),
          None => set.clone(),
        });
      }
      let old = old.downcast_ref::<DecorationSet>().cloned().unwrap_or_default();
      Box::new(old.map(tx.changes()).unwrap_or_default())
    }

    fn attach(&mut self, styles: &StyleSheet) {
      self.guard = Some(styles.inject(".echo {}"));
    }

    fn update(&mut self, state: &EditorState, prev: &EditorState) -> Option<Transaction> {
      if state.doc() == prev.doc() || state.doc().size() == 0 {
        return None;
      }
      let size = state.doc().size();
      let set = DecorationSet::create(state.doc(), [Decoration::inline(size - 1, size, "echo")]);
      Some(state.transaction().with_meta(ECHO, set))
    }

    fn decorations(&self, state: &EditorState) -> Option<DecorationSet> {
      state.field::<DecorationSet>(ECHO).cloned()
    }

    fn detach(&mut self) {
      self.guard.take();
      self.detached.set(self.detached.get() + 1);
    }
  }

  const SHOUT: PluginKey = PluginKey::new("shout");

  /// Upper-cases lower-case text, which keeps the document size.
  struct Shout;

  impl Plugin for Shout {
    fn key(&self) -> PluginKey {
      SHOUT
    }

    fn init(&self, _doc: &Document) -> Box<dyn Any> {
      Box::new(())
    }

    fn apply(&self, _tx: &Transaction, _old: &dyn Any) -> Box<dyn Any> {
      Box::new(())
    }

    fn update(&mut self, state: &EditorState, _prev: &EditorState) -> Option<Transaction> {
      let node = state
        .doc()
        .text_nodes()
        .find(|node| node.text.chars().any(char::is_lowercase))?;
      let mut tx = state.transaction();
      tx.set_text(node.id, node.text.to_uppercase()).ok()?;
      Some(tx)
    }
  }

  fn echo() -> (Echo, Rc<Cell<usize>>) {
    let detached = Rc::new(Cell::new(0));
    let plugin = Echo {
      guard:    None,
      detached: detached.clone(),
    };
    (plugin, detached)
  }

  fn view() -> (EditorView, Rc<Cell<usize>>) {
    let (plugin, detached) = echo();
    (
      EditorView::new(Document::from_text("ab"), vec![Box::new(plugin)]),
      detached,
    )
  }

  #[test]
  fn follow_up_transactions_are_dispatched() {
    let (mut view, _) = view();
    let text = view.state().doc().child(view.state().doc().root(), 0).unwrap();

    let mut tx = view.transaction();
    tx.insert_text(text, 2, "c").unwrap();
    view.dispatch(tx).unwrap();

    let sets = view.decorations();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].iter().map(Decoration::range).collect::<Vec<_>>(), [2..3]);
  }

  #[test]
  fn selection_only_transactions_keep_decorations() {
    let (mut view, _) = view();
    let text = view.state().doc().child(view.state().doc().root(), 0).unwrap();

    let mut tx = view.transaction();
    tx.insert_text(text, 2, "c").unwrap();
    view.dispatch(tx).unwrap();
    view.dispatch(view.transaction().with_selection(0)).unwrap();

    assert_eq!(view.state().cursor(), 0);
    assert_eq!(view.decorations()[0].len(), 1);
  }

  #[test]
  fn destroy_detaches_once() {
    let (mut view, detached) = view();
    assert_eq!(view.styles().len(), 1);

    view.destroy();
    assert!(view.styles().is_empty());
    assert_eq!(detached.get(), 1);

    drop(view);
    assert_eq!(detached.get(), 1);
  }

  #[test]
  fn drop_detaches() {
    let (view, detached) = view();
    let styles = view.styles().clone();
    drop(view);
    assert!(styles.is_empty());
    assert_eq!(detached.get(), 1);
  }

  #[test]
  fn stale_transactions_are_rejected() {
    let (mut view, _) = view();
    let text = view.state().doc().child(view.state().doc().root(), 0).unwrap();
    let stale = view.transaction();

    let mut tx = view.transaction();
    tx.set_text(text, "xy").unwrap();
    view.dispatch(tx).unwrap();
    let revision = view.state().revision();

    assert_eq!(view.dispatch(stale).unwrap_err(), TransactionError::Stale {
      base: 0,
      revision,
    });
    assert_eq!(view.state().doc().text_content(), "xy");
    assert_eq!(view.state().revision(), revision);
  }

  #[test]
  fn follow_ups_see_each_other() {
    let (echo, _) = echo();
    let mut view = EditorView::new(Document::from_text("ab"), vec![
      Box::new(Shout),
      Box::new(echo),
    ]);
    let text = view.state().doc().child(view.state().doc().root(), 0).unwrap();

    let mut tx = view.transaction();
    tx.insert_text(text, 2, "c").unwrap();
    view.dispatch(tx).unwrap();

    // the echo queued next to the upper-casing edit must not undo it
    assert_eq!(view.state().doc().text_content(), "ABC");
    assert_eq!(
      view.decorations()[0].iter().map(Decoration::range).collect::<Vec<_>>(),
      [2..3]
    );
    // typing, shouting, the rebased echo and the echo of the shout
    assert_eq!(view.state().revision(), 4);
  }
}
