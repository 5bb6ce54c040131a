//! Per-document registry of conflict regions.

use tracing::debug;

use super::region::{ConflictRegion, RegionId};
use crate::errors::RegionError;

/// Ordered set of conflict regions for a single open document.
///
/// The region set is only ever swapped wholesale, so lookups never observe a
/// partially rebuilt set.
#[derive(Debug, Default)]
pub struct ConflictRegistry {
    regions: Vec<ConflictRegion>,
    generation: u64,
}

impl ConflictRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every region with the result of a fresh scan.
    pub fn replace_all(&mut self, regions: Vec<ConflictRegion>) {
        self.regions = regions;
        self.generation += 1;
        debug!(
            count = self.regions.len(),
            generation = self.generation,
            "replaced conflict regions"
        );
    }

    /// The region whose block (marker lines included) covers `line`.
    pub fn find_at(&self, line: usize) -> Option<&ConflictRegion> {
        self.regions.iter().find(|r| r.contains(line))
    }

    pub fn find_by_id(&self, id: RegionId) -> Option<&ConflictRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Drop a region. Remaining ids are left as they are.
    pub fn remove(&mut self, id: RegionId) -> Result<ConflictRegion, RegionError> {
        let index = self
            .regions
            .iter()
            .position(|r| r.id == id)
            .ok_or(RegionError::NotFound(id))?;
        Ok(self.regions.remove(index))
    }

    pub fn regions(&self) -> &[ConflictRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of `replace_all` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::scanner::MarkerScanner;

    fn registry_with_two() -> ConflictRegistry {
        let text = "\
<<<<<<< HEAD
a
=======
b
>>>>>>> x
between
<<<<<<< HEAD
c
=======
d
>>>>>>> x";
        let lines: Vec<&str> = text.lines().collect();
        let mut registry = ConflictRegistry::new();
        registry.replace_all(MarkerScanner::scan(&lines).unwrap());
        registry
    }

    #[test]
    fn test_find_at() {
        let registry = registry_with_two();
        assert_eq!(registry.find_at(1).map(|r| r.id), Some(RegionId(1)));
        assert_eq!(registry.find_at(3).map(|r| r.id), Some(RegionId(1)));
        assert_eq!(registry.find_at(5).map(|r| r.id), Some(RegionId(1)));
        assert!(registry.find_at(6).is_none());
        assert_eq!(registry.find_at(10).map(|r| r.id), Some(RegionId(2)));
        assert!(registry.find_at(42).is_none());
    }

    #[test]
    fn test_remove_keeps_ids_stable() {
        let mut registry = registry_with_two();
        let removed = registry.remove(RegionId(1)).unwrap();
        assert_eq!(removed.id, RegionId(1));
        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_id(RegionId(2)).is_some());
        assert_eq!(
            registry.remove(RegionId(1)),
            Err(RegionError::NotFound(RegionId(1)))
        );
    }

    #[test]
    fn test_replace_all_swaps_everything() {
        let mut registry = registry_with_two();
        assert_eq!(registry.generation(), 1);
        registry.replace_all(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.find_by_id(RegionId(2)).is_none());
        assert_eq!(registry.generation(), 2);
    }
}
