//! Last observed text of every text node.

use foldhash::fast::RandomState;
use hashbrown::{
  HashMap,
  HashSet,
};
use the_doc::{
  Tendril,
  document::{
    NodeId,
    TextNode,
  },
};

use crate::options::NodeIdentity;

/// How a text node is looked up in [`ContentMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryKey {
  Node(NodeId),
  Offset(usize),
}

impl MemoryKey {
  pub fn for_node(identity: NodeIdentity, node: &TextNode<'_>) -> Self {
    match identity {
      NodeIdentity::Stable => Self::Node(node.id),
      NodeIdentity::Offset => Self::Offset(node.offset),
    }
  }
}

pub type ObservedKeys = HashSet<MemoryKey, RandomState>;

#[derive(Debug, Clone, Default)]
pub struct ContentMemory {
  entries: HashMap<MemoryKey, Tendril, RandomState>,
}

impl ContentMemory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Text remembered for `key`, empty if the key was never observed.
  pub fn get(&self, key: MemoryKey) -> &str {
    self.entries.get(&key).map_or("", Tendril::as_str)
  }

  pub fn contains(&self, key: MemoryKey) -> bool {
    self.entries.contains_key(&key)
  }

  pub fn set(&mut self, key: MemoryKey, text: &str) {
    match self.entries.get_mut(&key) {
      Some(entry) => {
        entry.clear();
        entry.push_str(text);
      },
      None => {
        self.entries.insert(key, Tendril::from(text));
      },
    }
  }

  /// Forgets every key not in `observed`. Returns how many were forgotten.
  pub fn retain_observed(&mut self, observed: &ObservedKeys) -> usize {
    let before = self.entries.len();
    self.entries.retain(|key, _| observed.contains(key));
    before - self.entries.len()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
