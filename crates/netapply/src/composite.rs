//! Composite-membership filter.
//!
//! Bridge and bond members often share a hardware address with their
//! parent or siblings, so they are never renamed.

use tracing::debug;

use crate::declared::CompositeSpec;

/// Answers whether an interface belongs to any declared bridge or bond.
#[derive(Debug, Clone, Copy)]
pub struct CompositeFilter<'a> {
    composites: &'a [CompositeSpec],
}

impl<'a> CompositeFilter<'a> {
    pub fn new(composites: &'a [CompositeSpec]) -> Self {
        Self { composites }
    }

    /// The first composite listing `name` as a member.
    pub fn parent_of(&self, name: &str) -> Option<&'a CompositeSpec> {
        self.composites.iter().find(|c| c.members.contains(name))
    }

    pub fn is_member(&self, name: &str) -> bool {
        match self.parent_of(name) {
            Some(parent) => {
                debug!("{} is a member of {}", name, parent.id);
                true
            }
            None => false,
        }
    }
}
