//! Position mapping primitives for document edits.
//!
//! Every edit applied to a [`Document`](crate::document::Document) is
//! described by a [`ChangeSet`]: a sequence of [`Operation`]s over the
//! flattened document positions.
//!
//! - **Retain(n)** - Keep `n` positions unchanged
//! - **Delete(n)** - Remove `n` positions
//! - **Insert(n)** - Insert `n` positions
//!
//! Only the sizes matter here. A changeset does not carry inserted text; it
//! exists so that anything anchored to a position (cursors, decorations) can
//! be carried forward across an edit.
//!
//! # Position Mapping
//!
//! The [`Assoc`] enum controls how a position sitting exactly at an
//! insertion point is mapped:
//!
//! ```
//! use the_doc::transaction::{
//!   Assoc,
//!   ChangeSet,
//! };
//!
//! let mut cs = ChangeSet::with_capacity(3);
//! cs.retain(4);
//! cs.insert(2);
//! cs.retain(4);
//!
//! assert_eq!(cs.map_pos(4, Assoc::Before).unwrap(), 4);
//! assert_eq!(cs.map_pos(4, Assoc::After).unwrap(), 6);
//! ```
//!
//! # Composition
//!
//! Two changesets compose when the output length of the first matches the
//! input length of the second. A [`Transaction`] with several steps keeps
//! one composed changeset for all of them.

use std::{
  any::Any,
  fmt,
  iter::once,
};

use hashbrown::HashMap;
use thiserror::Error;

use crate::{
  Tendril,
  document::{
    Document,
    DocumentError,
    NodeId,
    NodeSpec,
  },
  plugin::PluginKey,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error(
    "changeset compose length mismatch: left output {left_len_after}, right input {right_len}"
  )]
  ComposeLengthMismatch {
    left_len_after: usize,
    right_len:      usize,
  },
  #[error("transaction is based on revision {base}, the state is at revision {revision}")]
  Stale { base: u64, revision: u64 },
  #[error("positions {positions:?} are out of bounds for changeset length {len}")]
  PositionsOutOfBounds {
    positions: Vec<usize>,
    len:       usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  /// Keep n positions.
  Retain(usize),

  /// Delete n positions.
  Delete(usize),

  /// Insert n positions.
  Insert(usize),
}

impl Operation {
  pub fn len(&self) -> usize {
    match self {
      Operation::Retain(n) | Operation::Delete(n) | Operation::Insert(n) => *n,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The same operation `n` positions shorter, or `None` if nothing is left.
  fn shrink(self, n: usize) -> Option<Self> {
    let rest = self.len().checked_sub(n).filter(|rest| *rest > 0)?;
    Some(match self {
      Operation::Retain(_) => Operation::Retain(rest),
      Operation::Delete(_) => Operation::Delete(rest),
      Operation::Insert(_) => Operation::Insert(rest),
    })
  }
}

/// Side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  /// Stay in front of the inserted text.
  Before,
  /// Move past the inserted text.
  After,
}

impl Assoc {
  fn insert_offset(self, inserted: usize) -> usize {
    match self {
      Assoc::After => inserted,
      Assoc::Before => 0,
    }
  }
}

/// Where a forward walk over the operations currently is.
#[derive(Debug, Default, Clone, Copy)]
struct Walk {
  index:   usize,
  old_pos: usize,
  new_pos: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  changes:   Vec<Operation>,
  /// The required document size. Mapping refuses positions past it.
  len:       usize,
  len_after: usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  /// An identity changeset over a document of `len` positions.
  #[must_use]
  pub fn new(len: usize) -> Self {
    let mut changes = Self::with_capacity(1);
    changes.retain(len);
    changes
  }

  pub fn changes(&self) -> &[Operation] {
    &self.changes
  }

  /// Returns the expected document size for this changeset.
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns the document size after this changeset is applied.
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  // Changeset builder operations: delete/insert/retain.
  //

  pub fn delete(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;

    if let Some(Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Delete(n))
    }
  }

  pub fn insert(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len_after += n;

    // inserts always come before deletes at the same point
    let new_last = match self.changes.as_mut_slice() {
      [.., Insert(prev)] | [.., Insert(prev), Delete(_)] => {
        *prev += n;
        return;
      },
      [.., last @ Delete(_)] => std::mem::replace(last, Insert(n)),
      _ => Insert(n),
    };

    self.changes.push(new_last);
  }

  pub fn retain(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;
    self.len_after += n;

    if let Some(Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Retain(n))
    }
  }

  /// Combines two changesets into one that has the effect of `self`
  /// followed by `other`.
  pub fn compose(self, other: Self) -> Result<Self> {
    use Operation::*;

    if self.len_after != other.len {
      return Err(TransactionError::ComposeLengthMismatch {
        left_len_after: self.len_after,
        right_len:      other.len,
      });
    }
    if self.changes.is_empty() {
      return Ok(other);
    }
    if other.changes.is_empty() {
      return Ok(self);
    }

    let len = self.len;
    let mut composed = Self::with_capacity(self.changes.len() + other.changes.len());
    let mut changes_a = self.changes.into_iter();
    let mut changes_b = other.changes.into_iter();
    let mut head_a = changes_a.next();
    let mut head_b = changes_b.next();

    loop {
      match (head_a, head_b) {
        (None, None) => break,
        // deletions of A never reach B
        (Some(Delete(n)), _) => {
          composed.delete(n);
          head_a = changes_a.next();
        },
        // insertions of B never touch A
        (_, Some(Insert(n))) => {
          composed.insert(n);
          head_b = changes_b.next();
        },
        (Some(a), Some(b)) => {
          let n = a.len().min(b.len());
          match (a, b) {
            (Retain(_), Retain(_)) => composed.retain(n),
            (Retain(_), Delete(_)) => composed.delete(n),
            (Insert(_), Retain(_)) => composed.insert(n),
            // B deletes what A inserted
            (Insert(_), Delete(_)) => {},
            _ => unreachable!("({a:?}, {b:?})"),
          }
          head_a = a.shrink(n).or_else(|| changes_a.next());
          head_b = b.shrink(n).or_else(|| changes_b.next());
        },
        (a, b) => unreachable!("({a:?}, {b:?})"),
      }
    }

    debug_assert_eq!(composed.len, len);
    Ok(composed)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  /// Maps positions through the changes in place.
  ///
  /// Positions are visited in ascending order, so a single forward walk over
  /// the operations serves all of them. Positions past the end of the
  /// original document are left untouched and reported together.
  pub fn update_positions<'a>(
    &self,
    positions: impl Iterator<Item = (&'a mut usize, Assoc)>,
  ) -> Result<()> {
    let mut positions: Vec<_> = positions.collect();
    positions.sort_by_key(|(pos, _)| **pos);

    let mut walk = Walk::default();
    let mut out_of_bounds = Vec::new();
    for (pos, assoc) in positions {
      match self.walk_to(&mut walk, *pos, assoc) {
        Some(mapped) => *pos = mapped,
        None => out_of_bounds.push(*pos),
      }
    }

    if out_of_bounds.is_empty() {
      Ok(())
    } else {
      Err(TransactionError::PositionsOutOfBounds {
        positions: out_of_bounds,
        len:       self.len,
      })
    }
  }

  /// Advances `walk` to the operation containing `pos` and maps it. The walk
  /// is left on that operation, since the next position may fall into it
  /// too.
  fn walk_to(&self, walk: &mut Walk, pos: usize, assoc: Assoc) -> Option<usize> {
    use Operation::*;

    loop {
      let Some(change) = self.changes.get(walk.index) else {
        return (pos == walk.old_pos).then_some(walk.new_pos);
      };
      match *change {
        Retain(n) => {
          if pos < walk.old_pos + n {
            return Some(walk.new_pos + (pos - walk.old_pos));
          }
          walk.old_pos += n;
          walk.new_pos += n;
        },
        Delete(n) => {
          if pos < walk.old_pos + n {
            return Some(walk.new_pos);
          }
          walk.old_pos += n;
        },
        // insert followed by delete replaces the deleted range
        Insert(inserted) => {
          if let Some(Delete(deleted)) = self.changes.get(walk.index + 1).copied() {
            if pos < walk.old_pos + deleted {
              return Some(if pos == walk.old_pos {
                walk.new_pos
              } else {
                walk.new_pos + assoc.insert_offset(inserted)
              });
            }
            walk.old_pos += deleted;
            walk.new_pos += inserted;
            walk.index += 2;
            continue;
          }
          if pos == walk.old_pos {
            return Some(walk.new_pos + assoc.insert_offset(inserted));
          }
          walk.new_pos += inserted;
        },
      }
      walk.index += 1;
    }
  }

  /// Map a position through the changes.
  ///
  /// `assoc` indicates which side to associate the position with. `Before`
  /// keeps the position before insertions at that point, `After` moves it
  /// past them.
  pub fn map_pos(&self, mut pos: usize, assoc: Assoc) -> Result<usize> {
    self.update_positions(once((&mut pos, assoc)))?;
    Ok(pos)
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    ChangeIterator::new(self)
  }
}

/// (from, to, inserted) replacement in old document positions.
pub type Change = (usize, usize, usize);

pub struct ChangeIterator<'a> {
  iter: std::iter::Peekable<std::slice::Iter<'a, Operation>>,
  pos:  usize,
}

impl<'a> ChangeIterator<'a> {
  fn new(changeset: &'a ChangeSet) -> Self {
    let iter = changeset.changes.iter().peekable();
    Self { iter, pos: 0 }
  }
}

impl Iterator for ChangeIterator<'_> {
  type Item = Change;

  fn next(&mut self) -> Option<Self::Item> {
    use Operation::*;

    loop {
      match self.iter.next()? {
        Retain(len) => {
          self.pos += len;
        },
        Delete(len) => {
          let start = self.pos;
          self.pos += len;
          return Some((start, self.pos, 0));
        },
        Insert(n) => {
          let start = self.pos;
          // a subsequent delete means a replace, consume it
          if let Some(Delete(len)) = self.iter.peek() {
            self.iter.next();

            self.pos += len;
            return Some((start, self.pos, *n));
          } else {
            return Some((start, start, *n));
          }
        },
      }
    }
  }
}

/// A group of edits applied on top of a document snapshot, together with
/// per-plugin metadata.
///
/// Edits are applied eagerly: after each step [`Transaction::doc`] is the
/// edited document and [`Transaction::changes`] maps positions of the
/// original document into it.
///
/// A transaction remembers the revision of the state it was started on.
/// States only accept transactions based on their own revision.
pub struct Transaction {
  doc:       Document,
  changes:   ChangeSet,
  selection: Option<usize>,
  meta:      HashMap<PluginKey, Box<dyn Any>>,
  base:      u64,
  rebased:   Option<ChangeSet>,
}

impl fmt::Debug for Transaction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Transaction")
      .field("changes", &self.changes)
      .field("selection", &self.selection)
      .field("meta", &self.meta.keys().collect::<Vec<_>>())
      .field("base", &self.base)
      .field("rebased", &self.rebased)
      .finish()
  }
}

impl Transaction {
  pub fn new(doc: &Document) -> Self {
    Self {
      changes:   ChangeSet::new(doc.size()),
      doc:       doc.clone(),
      selection: None,
      meta:      HashMap::new(),
      base:      0,
      rebased:   None,
    }
  }

  pub(crate) fn based_on(mut self, revision: u64) -> Self {
    self.base = revision;
    self
  }

  /// Revision of the state this transaction was started on.
  pub fn base(&self) -> u64 {
    self.base
  }

  /// Set when the transaction was moved onto a newer document: the changes
  /// between the document it was started on and the one it now applies to.
  /// Metadata holding positions has to be mapped through them.
  pub fn rebased(&self) -> Option<&ChangeSet> {
    self.rebased.as_ref()
  }

  /// Moves a transaction that does not edit the document onto `doc`, the
  /// document at `revision`. `since` maps the transaction's own document
  /// into `doc`. Editing transactions cannot be moved and are reported as
  /// stale.
  pub(crate) fn rebase(self, doc: &Document, revision: u64, since: ChangeSet) -> Result<Self> {
    if self.doc_changed() {
      return Err(TransactionError::Stale {
        base: self.base,
        revision,
      });
    }
    let selection = self
      .selection
      .map(|cursor| since.map_pos(cursor, Assoc::After))
      .transpose()?;
    let rebased = match self.rebased {
      Some(earlier) => earlier.compose(since)?,
      None => since,
    };
    Ok(Self {
      doc: doc.clone(),
      changes: ChangeSet::new(doc.size()),
      selection,
      meta: self.meta,
      base: revision,
      rebased: Some(rebased),
    })
  }

  /// The document with every step of this transaction applied.
  pub fn doc(&self) -> &Document {
    &self.doc
  }

  pub(crate) fn into_doc(self) -> Document {
    self.doc
  }

  /// Changes made to the document.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  pub fn doc_changed(&self) -> bool {
    !self.changes.is_empty()
  }

  /// When set, explicitly updates the cursor.
  pub fn selection(&self) -> Option<usize> {
    self.selection
  }

  pub fn with_selection(mut self, cursor: usize) -> Self {
    self.selection = Some(cursor);
    self
  }

  pub fn set_meta<T: Any>(&mut self, key: PluginKey, value: T) -> &mut Self {
    self.meta.insert(key, Box::new(value));
    self
  }

  pub fn with_meta<T: Any>(mut self, key: PluginKey, value: T) -> Self {
    self.set_meta(key, value);
    self
  }

  pub fn get_meta<T: Any>(&self, key: PluginKey) -> Option<&T> {
    self.meta.get(&key)?.downcast_ref()
  }

  fn step(&mut self, changes: ChangeSet) -> std::result::Result<&mut Self, DocumentError> {
    let composed = std::mem::take(&mut self.changes).compose(changes)?;
    self.changes = composed;
    Ok(self)
  }

  pub fn insert_text(
    &mut self,
    node: NodeId,
    at: usize,
    text: &str,
  ) -> std::result::Result<&mut Self, DocumentError> {
    let changes = self.doc.insert_text(node, at, text)?;
    self.step(changes)
  }

  pub fn delete_text(
    &mut self,
    node: NodeId,
    from: usize,
    to: usize,
  ) -> std::result::Result<&mut Self, DocumentError> {
    let changes = self.doc.delete_text(node, from, to)?;
    self.step(changes)
  }

  pub fn set_text(
    &mut self,
    node: NodeId,
    text: impl Into<Tendril>,
  ) -> std::result::Result<&mut Self, DocumentError> {
    let changes = self.doc.set_text(node, text.into())?;
    self.step(changes)
  }

  /// Inserts a new subtree and returns the id of its root node.
  pub fn insert_node(
    &mut self,
    parent: NodeId,
    index: usize,
    spec: NodeSpec,
  ) -> std::result::Result<NodeId, DocumentError> {
    let (id, changes) = self.doc.insert_node(parent, index, spec)?;
    self.step(changes)?;
    Ok(id)
  }

  pub fn remove_node(&mut self, node: NodeId) -> std::result::Result<&mut Self, DocumentError> {
    let changes = self.doc.remove_node(node)?;
    self.step(changes)
  }
}
