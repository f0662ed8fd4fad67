//! The identity primitive shared by every loadable unit.
//!
//! An [`Extension`] gives a unit a runtime type name and a non-owning
//! back-reference to whatever owns it. The owner binding happens at
//! construction and is never rebound; the identity lives behind an [`Arc`]
//! so children can anchor to it without extending anyone's lifetime.

use std::any;
use std::sync::Arc;

use crate::anchor::Anchor;

/// The shared identity record an [`Extension`] exposes to its children.
#[derive(Debug)]
pub struct ExtensionIdentity {
    name: &'static str,
    owner: Anchor<ExtensionIdentity>,
}

impl ExtensionIdentity {
    /// Runtime type name of the unit.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Back-reference to the owner's identity; unbound for roots.
    pub fn owner(&self) -> &Anchor<ExtensionIdentity> {
        &self.owner
    }
}

/// Identity held by a loadable unit.
#[derive(Debug)]
pub struct Extension {
    identity: Arc<ExtensionIdentity>,
}

impl Extension {
    /// Identity for a unit of type `T`, owned by `owner`.
    ///
    /// The name is captured from `T` at construction, mirroring how the
    /// most-derived type decides the display name.
    pub fn of<T: ?Sized>(owner: Anchor<ExtensionIdentity>) -> Self {
        Self {
            identity: Arc::new(ExtensionIdentity {
                name: any::type_name::<T>(),
                owner,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.identity.name
    }

    pub fn owner(&self) -> &Anchor<ExtensionIdentity> {
        &self.identity.owner
    }

    pub fn identity(&self) -> &Arc<ExtensionIdentity> {
        &self.identity
    }

    /// A non-owning handle to this identity, for binding children.
    pub fn anchor(&self) -> Anchor<ExtensionIdentity> {
        Anchor::bound(&self.identity)
    }
}
