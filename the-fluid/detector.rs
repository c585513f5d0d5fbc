//! Finds freshly typed characters.
//!
//! After every document change the [`Detector`] walks all text nodes of the
//! new document and compares each one against the text it remembers for it.
//! A node that got longer contributes a one-character decoration at the
//! insertion point. The resulting set fully replaces the previous one; older
//! decorations are never merged in.

use smallvec::SmallVec;
use the_doc::{
  decoration::{
    Decoration,
    DecorationSet,
  },
  document::Document,
};

use crate::{
  memory::{
    ContentMemory,
    MemoryKey,
    ObservedKeys,
  },
  options::{
    InsertionMode,
    Options,
  },
};

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
  /// Characters appeared. The set replaces whatever was committed before.
  Decorations(DecorationSet),
  /// Nothing to animate. The committed set should be carried forward.
  NoChange,
}

impl Detection {
  pub fn is_no_change(&self) -> bool {
    matches!(self, Self::NoChange)
  }

  pub fn into_decorations(self) -> Option<DecorationSet> {
    match self {
      Self::Decorations(set) => Some(set),
      Self::NoChange => None,
    }
  }
}

#[derive(Debug, Default)]
pub struct Detector {
  options:  Options,
  memory:   ContentMemory,
  observed: ObservedKeys,
}

impl Detector {
  pub fn new(options: Options) -> Self {
    Self {
      options,
      memory: ContentMemory::new(),
      observed: ObservedKeys::default(),
    }
  }

  pub fn options(&self) -> &Options {
    &self.options
  }

  pub fn memory(&self) -> &ContentMemory {
    &self.memory
  }

  /// Remembers every text node of `doc` without reporting anything.
  pub fn prime(&mut self, doc: &Document) {
    let identity = self.options.identity();
    self.observed.clear();
    for node in doc.text_nodes() {
      let key = MemoryKey::for_node(identity, &node);
      self.observed.insert(key);
      self.memory.set(key, node.text);
    }
    let evicted = self.memory.retain_observed(&self.observed);
    tracing::trace!(nodes = self.observed.len(), evicted, "primed content memory");
  }

  pub fn on_document_changed(&mut self, previous: &Document, current: &Document) -> Detection {
    if previous == current {
      tracing::trace!("document unchanged, skipping walk");
      return Detection::NoChange;
    }

    let style = self.options.style().to_css();
    let identity = self.options.identity();
    let insertion = self.options.insertion();
    let mut decorations = Vec::new();
    self.observed.clear();

    for node in current.text_nodes() {
      let key = MemoryKey::for_node(identity, &node);
      self.observed.insert(key);

      let len = node.text.chars().count();
      let points = insertion_points(insertion, self.memory.get(key), node.text);
      for offset in points {
        if offset >= len {
          tracing::warn!(
            ?key,
            offset,
            len,
            "insertion point outside of its text node, skipping"
          );
          continue;
        }
        let pos = node.offset + offset;
        decorations.push(Decoration::inline(pos, pos + 1, style.clone()));
      }

      self.memory.set(key, node.text);
    }

    let evicted = self.memory.retain_observed(&self.observed);
    tracing::trace!(
      nodes = self.observed.len(),
      evicted,
      found = decorations.len(),
      "walked text nodes"
    );

    if decorations.is_empty() {
      return Detection::NoChange;
    }
    let set = DecorationSet::create(current, decorations);
    tracing::debug!(count = set.len(), "animating new characters");
    Detection::Decorations(set)
  }
}

/// Character offsets, relative to the node, of the characters to animate.
fn insertion_points(mode: InsertionMode, previous: &str, current: &str) -> SmallVec<[usize; 1]> {
  let previous_len = previous.chars().count();
  let current_len = current.chars().count();
  if current_len <= previous_len {
    return SmallVec::new();
  }

  match mode {
    InsertionMode::Trailing => SmallVec::from_buf([previous_len]),
    InsertionMode::PerCharacter => {
      let prefix = previous
        .chars()
        .zip(current.chars())
        .take_while(|(a, b)| a == b)
        .count();
      let suffix = previous
        .chars()
        .rev()
        .zip(current.chars().rev())
        .take(previous_len - prefix)
        .take_while(|(a, b)| a == b)
        .count();
      (prefix..current_len - suffix).collect()
    },
  }
}
