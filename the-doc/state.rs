use std::{
  any::Any,
  fmt,
};

use hashbrown::HashMap;

use crate::{
  document::Document,
  plugin::{
    Plugin,
    PluginKey,
  },
  transaction::{
    Assoc,
    Result,
    Transaction,
    TransactionError,
  },
};

/// Immutable editor state: the document, the cursor and one slot per
/// plugin.
///
/// Every applied transaction bumps the revision.
pub struct EditorState {
  doc:      Document,
  cursor:   usize,
  revision: u64,
  fields:   HashMap<PluginKey, Box<dyn Any>>,
}

impl fmt::Debug for EditorState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EditorState")
      .field("doc", &self.doc)
      .field("cursor", &self.cursor)
      .field("revision", &self.revision)
      .field("fields", &self.fields.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl EditorState {
  pub fn new(doc: Document, plugins: &[Box<dyn Plugin>]) -> Self {
    let fields = plugins
      .iter()
      .map(|plugin| (plugin.key(), plugin.init(&doc)))
      .collect();
    Self {
      doc,
      cursor: 0,
      revision: 0,
      fields,
    }
  }

  pub fn doc(&self) -> &Document {
    &self.doc
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  /// Value of a plugin's state slot.
  pub fn field<T: Any>(&self, key: PluginKey) -> Option<&T> {
    self.fields.get(&key)?.downcast_ref()
  }

  /// Starts a transaction on top of this state's document.
  pub fn transaction(&self) -> Transaction {
    Transaction::new(&self.doc).based_on(self.revision)
  }

  /// Produces the state after `tx`.
  pub fn apply(&self, tx: Transaction, plugins: &[Box<dyn Plugin>]) -> Result<Self> {
    if tx.base() != self.revision {
      return Err(TransactionError::Stale {
        base:     tx.base(),
        revision: self.revision,
      });
    }
    let expected = self.doc.size();
    if tx.changes().len() != expected {
      return Err(TransactionError::LengthMismatch {
        expected,
        actual: tx.changes().len(),
      });
    }

    let cursor = match tx.selection() {
      Some(cursor) => cursor.min(tx.doc().size()),
      None => tx.changes().map_pos(self.cursor, Assoc::After)?,
    };

    let fields = plugins
      .iter()
      .map(|plugin| {
        let key = plugin.key();
        let value = match self.fields.get(&key) {
          Some(old) => plugin.apply(&tx, old.as_ref()),
          None => plugin.init(tx.doc()),
        };
        (key, value)
      })
      .collect();

    Ok(Self {
      doc: tx.into_doc(),
      cursor,
      revision: self.revision + 1,
      fields,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::document::NodeSpec;

  struct Counter;

  const COUNTER: PluginKey = PluginKey::new("counter");

  impl Plugin for Counter {
    fn key(&self) -> PluginKey {
      COUNTER
    }

    fn init(&self, _doc: &Document) -> Box<dyn Any> {
      Box::new(0usize)
    }

    fn apply(&self, tx: &Transaction, old: &dyn Any) -> Box<dyn Any> {
      let old = old.downcast_ref::<usize>().copied().unwrap_or_default();
      Box::new(old + usize::from(tx.doc_changed()))
    }
  }

  #[test]
  fn apply_maps_cursor_and_fields() {
    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Counter)];
    let state = EditorState::new(Document::from_specs([NodeSpec::paragraph("ab")]), &plugins);
    assert_eq!(state.field::<usize>(COUNTER), Some(&0));

    let text = state.doc().child(state.doc().child(state.doc().root(), 0).unwrap(), 0).unwrap();
    let mut tx = state.transaction().with_selection(3);
    tx.insert_text(text, 2, "c").unwrap();
    let state = state.apply(tx, &plugins).unwrap();
    assert_eq!(state.cursor(), 3);
    assert_eq!(state.field::<usize>(COUNTER), Some(&1));

    let mut tx = state.transaction();
    tx.insert_text(text, 0, "x").unwrap();
    let state = state.apply(tx, &plugins).unwrap();
    assert_eq!(state.cursor(), 4);
    assert_eq!(state.doc().text_content(), "xabc");
    assert_eq!(state.field::<usize>(COUNTER), Some(&2));

    // meta only transactions leave the document alone
    let state = state.apply(state.transaction(), &plugins).unwrap();
    assert_eq!(state.field::<usize>(COUNTER), Some(&2));
    assert_eq!(state.cursor(), 4);
  }

  #[test]
  fn apply_rejects_foreign_transactions() {
    let plugins: Vec<Box<dyn Plugin>> = Vec::new();
    let state = EditorState::new(Document::from_text("abc"), &plugins);
    let stale = Transaction::new(&Document::from_text("a"));
    assert_eq!(
      state.apply(stale, &plugins).unwrap_err(),
      TransactionError::LengthMismatch {
        expected: 3,
        actual:   1,
      }
    );
  }

  #[test]
  fn apply_rejects_transactions_from_older_states() {
    let plugins: Vec<Box<dyn Plugin>> = Vec::new();
    let state = EditorState::new(Document::from_text("ab"), &plugins);
    let text = state.doc().child(state.doc().root(), 0).unwrap();
    let old = state.transaction();

    let mut tx = state.transaction();
    tx.set_text(text, "xy").unwrap();
    let state = state.apply(tx, &plugins).unwrap();
    assert_eq!(state.revision(), 1);

    // same size, but based on "ab"
    assert_eq!(state.apply(old, &plugins).unwrap_err(), TransactionError::Stale {
      base:     0,
      revision: 1,
    });
    assert_eq!(state.doc().text_content(), "xy");
  }
}
