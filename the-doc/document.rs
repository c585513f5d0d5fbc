//! Document tree with stable node identities.
//!
//! A [`Document`] is an ordered tree of block and text nodes stored in a
//! slotmap arena. Every node keeps its [`NodeId`] for as long as it lives in
//! the tree, no matter how the text around it changes. Ids of removed nodes
//! are never handed out again for a live node.
//!
//! # Positions
//!
//! Positions address the flattened document:
//!
//! - a text node occupies one position per character,
//! - a block node occupies its content plus one position for its opening and
//!   one for its closing boundary,
//! - the root block has no boundaries, its content starts at `0`.
//!
//! ```
//! use the_doc::document::{
//!   Document,
//!   NodeSpec,
//! };
//!
//! let doc = Document::from_specs([
//!   NodeSpec::block("paragraph", [NodeSpec::text("ab")]),
//!   NodeSpec::text("cd"),
//! ]);
//!
//! let offsets: Vec<_> = doc.text_nodes().map(|node| (node.offset, node.text)).collect();
//! assert_eq!(offsets, [(1, "ab"), (4, "cd")]);
//! assert_eq!(doc.size(), 6);
//! ```
//!
//! Edits are made through a [`Transaction`](crate::transaction::Transaction),
//! which records the [`ChangeSet`] of every step.

use slotmap::HopSlotMap;
use thiserror::Error;

use crate::{
  Tendril,
  transaction::{
    ChangeSet,
    TransactionError,
  },
};

slotmap::new_key_type! {
  pub struct NodeId;
}

const ROOT_NAME: &str = "doc";

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("node {0:?} does not exist")]
  NodeNotFound(NodeId),
  #[error("node {0:?} is not a text node")]
  NotText(NodeId),
  #[error("node {0:?} is not a block node")]
  NotBlock(NodeId),
  #[error("the root node cannot be removed")]
  RemoveRoot,
  #[error("offset {offset} is out of bounds for text of length {len}")]
  OffsetOutOfBounds { offset: usize, len: usize },
  #[error("invalid text range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("child index {index} is out of bounds for {len} children")]
  IndexOutOfBounds { index: usize, len: usize },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Owned description of a subtree, used to build documents and to insert
/// new nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
  Block {
    name:     Tendril,
    children: Vec<NodeSpec>,
  },
  Text(Tendril),
}

impl NodeSpec {
  pub fn text(text: impl Into<Tendril>) -> Self {
    Self::Text(text.into())
  }

  pub fn block(name: impl Into<Tendril>, children: impl IntoIterator<Item = NodeSpec>) -> Self {
    Self::Block {
      name:     name.into(),
      children: children.into_iter().collect(),
    }
  }

  pub fn paragraph(text: impl Into<Tendril>) -> Self {
    Self::block("paragraph", [Self::text(text)])
  }

  /// Number of flattened positions this subtree occupies.
  pub fn size(&self) -> usize {
    match self {
      Self::Text(text) => text.chars().count(),
      Self::Block { children, .. } => 2 + children.iter().map(NodeSpec::size).sum::<usize>(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
  Block {
    name:     Tendril,
    children: Vec<NodeId>,
  },
  Text(Tendril),
}

#[derive(Debug, Clone)]
pub struct Node {
  parent:  Option<NodeId>,
  content: Content,
}

impl Node {
  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  pub fn content(&self) -> &Content {
    &self.content
  }

  pub fn is_text(&self) -> bool {
    matches!(self.content, Content::Text(_))
  }

  pub fn text(&self) -> Option<&str> {
    match &self.content {
      Content::Text(text) => Some(text.as_str()),
      Content::Block { .. } => None,
    }
  }

  pub fn name(&self) -> Option<&str> {
    match &self.content {
      Content::Block { name, .. } => Some(name.as_str()),
      Content::Text(_) => None,
    }
  }

  pub fn children(&self) -> &[NodeId] {
    match &self.content {
      Content::Block { children, .. } => children.as_slice(),
      Content::Text(_) => &[],
    }
  }
}

/// A text node visited during a document walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextNode<'a> {
  pub id:     NodeId,
  /// Position of the first character of the node.
  pub offset: usize,
  pub text:   &'a str,
}

#[derive(Debug, Clone)]
pub struct Document {
  root:  NodeId,
  nodes: HopSlotMap<NodeId, Node>,
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  /// An empty document: a root block without children.
  pub fn new() -> Self {
    let mut nodes = HopSlotMap::with_key();
    let root = nodes.insert(Node {
      parent:  None,
      content: Content::Block {
        name:     ROOT_NAME.into(),
        children: Vec::new(),
      },
    });
    Self { root, nodes }
  }

  pub fn from_specs(children: impl IntoIterator<Item = NodeSpec>) -> Self {
    let mut doc = Self::new();
    let root = doc.root;
    let ids: Vec<NodeId> = children
      .into_iter()
      .map(|spec| doc.build(root, spec))
      .collect();
    if let Content::Block { children, .. } = &mut doc.nodes[root].content {
      *children = ids;
    }
    doc
  }

  /// A document holding a single text node directly under the root.
  pub fn from_text(text: impl Into<Tendril>) -> Self {
    Self::from_specs([NodeSpec::text(text)])
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn child(&self, parent: NodeId, index: usize) -> Option<NodeId> {
    self.nodes.get(parent)?.children().get(index).copied()
  }

  /// Number of flattened positions in the document.
  pub fn size(&self) -> usize {
    self.content_size(self.root)
  }

  /// Number of positions the node occupies, boundaries included.
  pub fn node_size(&self, id: NodeId) -> Result<usize> {
    if !self.nodes.contains_key(id) {
      return Err(DocumentError::NodeNotFound(id));
    }
    if id == self.root {
      return Ok(self.size());
    }
    Ok(self.size_of(id))
  }

  /// Position where the node starts: the first character of a text node or
  /// the opening boundary of a block.
  pub fn offset_of(&self, id: NodeId) -> Result<usize> {
    let node = self.nodes.get(id).ok_or(DocumentError::NodeNotFound(id))?;
    let Some(parent) = node.parent else {
      return Ok(0);
    };
    let mut offset = self.content_start(parent)?;
    for &sibling in self.nodes[parent].children() {
      if sibling == id {
        break;
      }
      offset += self.size_of(sibling);
    }
    Ok(offset)
  }

  /// Visits every text node in document order.
  pub fn text_nodes(&self) -> TextNodes<'_> {
    TextNodes {
      doc:    self,
      stack:  vec![self.nodes[self.root].children().iter()],
      offset: 0,
    }
  }

  /// Concatenated text of all text nodes.
  pub fn text_content(&self) -> String {
    self.text_nodes().map(|node| node.text).collect()
  }

  fn size_of(&self, id: NodeId) -> usize {
    match &self.nodes[id].content {
      Content::Text(text) => text.chars().count(),
      Content::Block { .. } => 2 + self.content_size(id),
    }
  }

  fn content_size(&self, id: NodeId) -> usize {
    self.nodes[id]
      .children()
      .iter()
      .map(|&child| self.size_of(child))
      .sum()
  }

  fn content_start(&self, block: NodeId) -> Result<usize> {
    if block == self.root {
      Ok(0)
    } else {
      Ok(self.offset_of(block)? + 1)
    }
  }

  fn build(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
    match spec {
      NodeSpec::Text(text) => {
        self.nodes.insert(Node {
          parent:  Some(parent),
          content: Content::Text(text),
        })
      },
      NodeSpec::Block { name, children } => {
        let id = self.nodes.insert(Node {
          parent:  Some(parent),
          content: Content::Block {
            name,
            children: Vec::with_capacity(children.len()),
          },
        });
        let ids: Vec<NodeId> = children
          .into_iter()
          .map(|child| self.build(id, child))
          .collect();
        if let Content::Block { children, .. } = &mut self.nodes[id].content {
          *children = ids;
        }
        id
      },
    }
  }

  fn text_mut(&mut self, id: NodeId) -> Result<&mut Tendril> {
    match self.nodes.get_mut(id) {
      Some(Node {
        content: Content::Text(text),
        ..
      }) => Ok(text),
      Some(_) => Err(DocumentError::NotText(id)),
      None => Err(DocumentError::NodeNotFound(id)),
    }
  }

  /// Builds the changeset for replacing `deleted` positions at `at` with
  /// `inserted` new ones, for a document of `len` positions.
  fn replace_changes(len: usize, at: usize, deleted: usize, inserted: usize) -> ChangeSet {
    let mut changes = ChangeSet::with_capacity(4);
    changes.retain(at);
    changes.insert(inserted);
    changes.delete(deleted);
    changes.retain(len - at - deleted);
    changes
  }

  pub(crate) fn insert_text(&mut self, id: NodeId, at: usize, fragment: &str) -> Result<ChangeSet> {
    let len = self.size();
    let offset = self.offset_of(id)?;
    let text = self.text_mut(id)?;
    let chars = text.chars().count();
    if at > chars {
      return Err(DocumentError::OffsetOutOfBounds { offset: at, len: chars });
    }
    let byte = byte_index(text, at);
    text.insert_str(byte, fragment);
    Ok(Self::replace_changes(
      len,
      offset + at,
      0,
      fragment.chars().count(),
    ))
  }

  pub(crate) fn delete_text(&mut self, id: NodeId, from: usize, to: usize) -> Result<ChangeSet> {
    if from > to {
      return Err(DocumentError::InvalidRange { from, to });
    }
    let len = self.size();
    let offset = self.offset_of(id)?;
    let text = self.text_mut(id)?;
    let chars = text.chars().count();
    if to > chars {
      return Err(DocumentError::OffsetOutOfBounds { offset: to, len: chars });
    }
    let range = byte_index(text, from)..byte_index(text, to);
    text.replace_range(range, "");
    Ok(Self::replace_changes(len, offset + from, to - from, 0))
  }

  /// Replaces the whole text of a node. The changeset only covers the part
  /// between the common prefix and suffix of the old and new text.
  pub(crate) fn set_text(&mut self, id: NodeId, new_text: Tendril) -> Result<ChangeSet> {
    let len = self.size();
    let offset = self.offset_of(id)?;
    let text = self.text_mut(id)?;

    let prefix = text
      .chars()
      .zip(new_text.chars())
      .take_while(|(a, b)| a == b)
      .count();
    let old_chars = text.chars().count();
    let new_chars = new_text.chars().count();
    let suffix = text
      .chars()
      .rev()
      .zip(new_text.chars().rev())
      .take(old_chars.min(new_chars) - prefix)
      .take_while(|(a, b)| a == b)
      .count();

    *text = new_text;
    Ok(Self::replace_changes(
      len,
      offset + prefix,
      old_chars - prefix - suffix,
      new_chars - prefix - suffix,
    ))
  }

  pub(crate) fn insert_node(
    &mut self,
    parent: NodeId,
    index: usize,
    spec: NodeSpec,
  ) -> Result<(NodeId, ChangeSet)> {
    let node = self
      .nodes
      .get(parent)
      .ok_or(DocumentError::NodeNotFound(parent))?;
    if node.is_text() {
      return Err(DocumentError::NotBlock(parent));
    }
    let siblings = node.children().len();
    if index > siblings {
      return Err(DocumentError::IndexOutOfBounds {
        index,
        len: siblings,
      });
    }

    let len = self.size();
    let at = self.content_start(parent)?
      + self.nodes[parent].children()[..index]
        .iter()
        .map(|&child| self.size_of(child))
        .sum::<usize>();
    let inserted = spec.size();

    let id = self.build(parent, spec);
    if let Content::Block { children, .. } = &mut self.nodes[parent].content {
      children.insert(index, id);
    }
    Ok((id, Self::replace_changes(len, at, 0, inserted)))
  }

  pub(crate) fn remove_node(&mut self, id: NodeId) -> Result<ChangeSet> {
    if id == self.root {
      return Err(DocumentError::RemoveRoot);
    }
    let len = self.size();
    let at = self.offset_of(id)?;
    let removed = self.size_of(id);

    let parent = self.nodes[id].parent;
    if let Some(parent) = parent {
      if let Content::Block { children, .. } = &mut self.nodes[parent].content {
        children.retain(|&child| child != id);
      }
    }

    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
      if let Some(node) = self.nodes.remove(next) {
        stack.extend_from_slice(node.children());
      }
    }

    Ok(Self::replace_changes(len, at, removed, 0))
  }
}

/// Two documents are equal when their trees have the same shape, block
/// names and text. Node ids are not compared.
impl PartialEq for Document {
  fn eq(&self, other: &Self) -> bool {
    let mut stack = vec![(self.root, other.root)];
    while let Some((a, b)) = stack.pop() {
      match (&self.nodes[a].content, &other.nodes[b].content) {
        (Content::Text(a), Content::Text(b)) => {
          if a != b {
            return false;
          }
        },
        (
          Content::Block {
            name: name_a,
            children: children_a,
          },
          Content::Block {
            name: name_b,
            children: children_b,
          },
        ) => {
          if name_a != name_b || children_a.len() != children_b.len() {
            return false;
          }
          stack.extend(children_a.iter().copied().zip(children_b.iter().copied()));
        },
        _ => return false,
      }
    }
    true
  }
}

impl Eq for Document {}

pub struct TextNodes<'a> {
  doc:    &'a Document,
  stack:  Vec<std::slice::Iter<'a, NodeId>>,
  offset: usize,
}

impl<'a> Iterator for TextNodes<'a> {
  type Item = TextNode<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let frame = self.stack.last_mut()?;
      let Some(&id) = frame.next() else {
        self.stack.pop();
        // closing boundary of a non-root block
        if !self.stack.is_empty() {
          self.offset += 1;
        }
        continue;
      };

      match &self.doc.nodes[id].content {
        Content::Text(text) => {
          let offset = self.offset;
          self.offset += text.chars().count();
          return Some(TextNode {
            id,
            offset,
            text: text.as_str(),
          });
        },
        Content::Block { children, .. } => {
          // opening boundary
          self.offset += 1;
          self.stack.push(children.iter());
        },
      }
    }
  }
}

fn byte_index(text: &str, char_idx: usize) -> usize {
  text
    .char_indices()
    .nth(char_idx)
    .map_or(text.len(), |(byte, _)| byte)
}
