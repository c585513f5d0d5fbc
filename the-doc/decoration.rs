//! Inline decorations over document ranges.
//!
//! A [`DecorationSet`] is immutable. It is either built from scratch against
//! a document with [`DecorationSet::create`] or carried across an edit with
//! [`DecorationSet::map`].

use std::{
  ops::Range,
  sync::Arc,
};

use crate::{
  Tendril,
  document::Document,
  transaction::{
    Assoc,
    ChangeSet,
    Result,
    TransactionError,
  },
};

/// Inline style applied to the characters in `from..to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
  from:  usize,
  to:    usize,
  style: Tendril,
}

impl Decoration {
  pub fn inline(from: usize, to: usize, style: impl Into<Tendril>) -> Self {
    Self {
      from,
      to,
      style: style.into(),
    }
  }

  pub fn from(&self) -> usize {
    self.from
  }

  pub fn to(&self) -> usize {
    self.to
  }

  pub fn range(&self) -> Range<usize> {
    self.from..self.to
  }

  pub fn style(&self) -> &str {
    &self.style
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
  decorations: Arc<[Decoration]>,
  doc_size:    usize,
}

impl DecorationSet {
  pub fn empty() -> Self {
    Self::default()
  }

  /// Builds a set valid against `doc`. Empty decorations and decorations
  /// reaching past the end of the document are left out.
  pub fn create(doc: &Document, decorations: impl IntoIterator<Item = Decoration>) -> Self {
    let doc_size = doc.size();
    let mut decorations: Vec<_> = decorations
      .into_iter()
      .filter(|decoration| {
        let valid = decoration.from < decoration.to && decoration.to <= doc_size;
        if !valid {
          tracing::warn!(
            range = ?decoration.range(),
            doc_size,
            "dropping decoration outside of the document"
          );
        }
        valid
      })
      .collect();
    decorations.sort_by_key(|decoration| (decoration.from, decoration.to));
    Self {
      decorations: decorations.into(),
      doc_size,
    }
  }

  /// Carries the set across an edit. The start of a decoration stays after
  /// text inserted at its position and the end stays before it, so typing
  /// next to a decoration never widens it. Decorations whose whole range was
  /// deleted are dropped.
  pub fn map(&self, changes: &ChangeSet) -> Result<Self> {
    if self.decorations.is_empty() {
      return Ok(Self {
        decorations: self.decorations.clone(),
        doc_size:    changes.len_after(),
      });
    }
    if changes.len() != self.doc_size {
      return Err(TransactionError::LengthMismatch {
        expected: self.doc_size,
        actual:   changes.len(),
      });
    }

    let mut positions: Vec<(usize, usize)> = self
      .decorations
      .iter()
      .map(|decoration| (decoration.from, decoration.to))
      .collect();
    changes.update_positions(
      positions
        .iter_mut()
        .flat_map(|(from, to)| [(from, Assoc::After), (to, Assoc::Before)]),
    )?;

    let mut decorations: Vec<_> = self
      .decorations
      .iter()
      .zip(positions)
      .filter(|(_, (from, to))| from < to)
      .map(|(decoration, (from, to))| {
        Decoration {
          from,
          to,
          style: decoration.style.clone(),
        }
      })
      .collect();
    decorations.sort_by_key(|decoration| (decoration.from, decoration.to));

    Ok(Self {
      decorations: decorations.into(),
      doc_size:    changes.len_after(),
    })
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
    self.decorations.iter()
  }

  pub fn len(&self) -> usize {
    self.decorations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decorations.is_empty()
  }

  /// Size of the document this set is valid against.
  pub fn doc_size(&self) -> usize {
    self.doc_size
  }
}

impl<'a> IntoIterator for &'a DecorationSet {
  type Item = &'a Decoration;
  type IntoIter = std::slice::Iter<'a, Decoration>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
