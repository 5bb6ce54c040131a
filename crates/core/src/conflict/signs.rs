//! Sign descriptors for rendering conflict regions.
//!
//! The presenter derives one descriptor per side of every region and keeps
//! the last applied set so a refresh only reports what actually changed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::region::{ConflictRegion, RegionId};
use super::registry::ConflictRegistry;

/// Which side of a conflict a sign belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignCategory {
    Ours,
    Base,
    Theirs,
}

impl std::fmt::Display for SignCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Base => write!(f, "base"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// A rendered side of a conflict region. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignDescriptor {
    pub region_id: RegionId,
    pub category: SignCategory,
    pub start_line: usize,
    pub end_line: usize,
}

/// The change between two applied descriptor sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignDelta {
    pub added: Vec<SignDescriptor>,
    pub removed: Vec<SignDescriptor>,
}

impl SignDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Holds the last applied descriptor set for one document.
#[derive(Debug, Clone, Default)]
pub struct SignPresenter {
    current: Vec<SignDescriptor>,
}

impl SignPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors for `regions`, in document order.
    ///
    /// The ours sign covers the start marker, the theirs sign covers the end
    /// marker, and the base sign covers the base marker. The separator line
    /// belongs to no sign.
    pub fn derive(regions: &[ConflictRegion]) -> Vec<SignDescriptor> {
        let mut signs = Vec::with_capacity(regions.len() * 2);
        for region in regions {
            let m = region.markers;
            signs.push(SignDescriptor {
                region_id: region.id,
                category: SignCategory::Ours,
                start_line: m.start,
                end_line: m.base.unwrap_or(m.separator) - 1,
            });
            if let Some(base) = m.base {
                signs.push(SignDescriptor {
                    region_id: region.id,
                    category: SignCategory::Base,
                    start_line: base,
                    end_line: m.separator - 1,
                });
            }
            signs.push(SignDescriptor {
                region_id: region.id,
                category: SignCategory::Theirs,
                start_line: m.separator + 1,
                end_line: m.end,
            });
        }
        signs
    }

    /// Recompute descriptors from `registry` and apply them.
    pub fn refresh(&mut self, registry: &ConflictRegistry) -> SignDelta {
        let next = Self::derive(registry.regions());
        let delta = SignDelta {
            added: next
                .iter()
                .filter(|s| !self.current.contains(s))
                .cloned()
                .collect(),
            removed: self
                .current
                .iter()
                .filter(|s| !next.contains(s))
                .cloned()
                .collect(),
        };
        debug!(
            added = delta.added.len(),
            removed = delta.removed.len(),
            "refreshed conflict signs"
        );
        self.current = next;
        delta
    }

    /// Remove every sign, e.g. when the document closes.
    pub fn clear(&mut self) -> SignDelta {
        SignDelta {
            added: Vec::new(),
            removed: std::mem::take(&mut self.current),
        }
    }

    pub fn current(&self) -> &[SignDescriptor] {
        &self.current
    }
}
