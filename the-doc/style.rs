//! Stylesheet shared by everything rendered in one view.
//!
//! Plugins inject rules with [`StyleSheet::inject`] and keep the returned
//! [`StyleGuard`] for as long as the rules are needed. Dropping the guard
//! removes the rule, so each injection is released exactly once no matter
//! how the owner is torn down.

use std::{
  cell::RefCell,
  rc::{
    Rc,
    Weak,
  },
};

use slotmap::SlotMap;

use crate::Tendril;

slotmap::new_key_type! {
  pub struct StyleId;
}

type Rules = RefCell<SlotMap<StyleId, Tendril>>;

#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
  rules: Rc<Rules>,
}

impl StyleSheet {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use = "the rule is removed as soon as the guard is dropped"]
  pub fn inject(&self, css: impl Into<Tendril>) -> StyleGuard {
    let id = self.rules.borrow_mut().insert(css.into());
    tracing::trace!(?id, "injected style rule");
    StyleGuard {
      rules: Rc::downgrade(&self.rules),
      id,
    }
  }

  pub fn contains(&self, id: StyleId) -> bool {
    self.rules.borrow().contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.rules.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.borrow().is_empty()
  }

  /// All rules joined into one stylesheet.
  pub fn to_css(&self) -> String {
    self
      .rules
      .borrow()
      .values()
      .map(Tendril::as_str)
      .collect::<Vec<_>>()
      .join("\n")
  }
}

/// Keeps an injected rule alive.
#[derive(Debug)]
pub struct StyleGuard {
  rules: Weak<Rules>,
  id:    StyleId,
}

impl StyleGuard {
  pub fn id(&self) -> StyleId {
    self.id
  }

  /// Removes the rule now.
  pub fn release(self) {}
}

impl Drop for StyleGuard {
  fn drop(&mut self) {
    // the sheet may already be gone together with its view
    if let Some(rules) = self.rules.upgrade() {
      rules.borrow_mut().remove(self.id);
      tracing::trace!(id = ?self.id, "released style rule");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guard_removes_rule_once() {
    let sheet = StyleSheet::new();
    let first = sheet.inject("a {}");
    let second = sheet.inject("b {}");
    assert_eq!(sheet.len(), 2);
    assert_eq!(sheet.to_css(), "a {}\nb {}");

    let id = first.id();
    first.release();
    assert!(!sheet.contains(id));
    assert!(sheet.contains(second.id()));
    assert_eq!(sheet.to_css(), "b {}");

    drop(second);
    assert!(sheet.is_empty());
  }

  #[test]
  fn guard_outliving_sheet() {
    let sheet = StyleSheet::new();
    let guard = sheet.inject("a {}");
    drop(sheet);
    drop(guard);
  }

  #[test]
  fn sheets_are_independent() {
    let a = StyleSheet::new();
    let b = StyleSheet::new();
    let guard_a = a.inject("x {}");
    let _guard_b = b.inject("x {}");
    drop(guard_a);
    assert!(a.is_empty());
    assert_eq!(b.len(), 1);
  }
}
