//! Non-owning back-references.
//!
//! An [`Anchor`] models "relation and lookup, never ownership": a slot that
//! holds either nothing or a weak reference to a value owned by someone
//! else. Dereferencing an empty or dangling anchor is a recoverable
//! [`AnchorError`], not undefined behavior, and dropping every anchor never
//! frees the referent.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::AnchorError;

/// A non-owning reference cell.
///
/// The referent must be held behind an [`Arc`] by its owner; the anchor
/// keeps only a [`Weak`] handle and therefore never participates in
/// lifetime management.
pub struct Anchor<T: ?Sized> {
    target: Option<Weak<T>>,
}

impl<T: ?Sized> Anchor<T> {
    /// An anchor referring to nothing.
    pub fn unbound() -> Self {
        Self { target: None }
    }

    /// An anchor referring to `target`.
    pub fn bound(target: &Arc<T>) -> Self {
        Self {
            target: Some(Arc::downgrade(target)),
        }
    }

    /// Points the anchor at `target`, replacing any previous binding.
    pub fn bind(&mut self, target: &Arc<T>) {
        self.target = Some(Arc::downgrade(target));
    }

    /// Clears the binding, making the anchor empty.
    pub fn reset(&mut self) {
        self.target = None;
    }

    /// True when the anchor refers to a value that is still alive.
    pub fn is_bound(&self) -> bool {
        matches!(&self.target, Some(weak) if weak.strong_count() > 0)
    }

    /// Obtains the referent.
    ///
    /// Fails with [`AnchorError`] when the anchor is empty or the referent
    /// has been dropped.
    pub fn get(&self) -> Result<Arc<T>, AnchorError> {
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(AnchorError)
    }

    /// True when the anchor refers to exactly `target`.
    pub fn refers_to(&self, target: &Arc<T>) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(target)))
    }
}

impl<T: ?Sized> Clone for Anchor<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: ?Sized> Default for Anchor<T> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<T: ?Sized> fmt::Debug for Anchor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_anchor_reports_error() {
        let anchor: Anchor<u32> = Anchor::unbound();
        assert!(!anchor.is_bound());
        assert_eq!(anchor.get(), Err(AnchorError));
    }

    #[test]
    fn bound_anchor_resolves_to_the_referent() {
        let value = Arc::new(42u32);
        let anchor = Anchor::bound(&value);
        assert!(anchor.is_bound());
        assert!(anchor.refers_to(&value));
        assert_eq!(*anchor.get().unwrap(), 42);
    }

    #[test]
    fn reset_clears_the_binding() {
        let value = Arc::new(1u32);
        let mut anchor = Anchor::bound(&value);
        anchor.reset();
        assert!(!anchor.is_bound());
        assert_eq!(anchor.get(), Err(AnchorError));
    }

    #[test]
    fn anchor_does_not_keep_the_referent_alive() {
        let value = Arc::new(String::from("owned elsewhere"));
        let anchor = Anchor::bound(&value);
        drop(value);
        assert!(!anchor.is_bound());
        assert_eq!(anchor.get(), Err(AnchorError));
    }

    #[test]
    fn clones_share_the_target() {
        let value = Arc::new(7u32);
        let anchor = Anchor::bound(&value);
        let copy = anchor.clone();
        assert!(copy.refers_to(&value));
        assert_eq!(*copy.get().unwrap(), 7);
    }

    #[test]
    fn rebinding_moves_the_anchor() {
        let first = Arc::new(1u32);
        let second = Arc::new(2u32);
        let mut anchor = Anchor::bound(&first);
        anchor.bind(&second);
        assert!(!anchor.refers_to(&first));
        assert_eq!(*anchor.get().unwrap(), 2);
    }
}
