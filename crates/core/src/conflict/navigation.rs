//! Next/previous conflict lookup with wrap-around.

use super::region::ConflictRegion;

/// Stateless navigation over an ordered region list.
pub struct NavigationController;

impl NavigationController {
    /// First region starting after `from_line`, wrapping to the first region.
    pub fn next(regions: &[ConflictRegion], from_line: usize) -> Option<&ConflictRegion> {
        regions
            .iter()
            .filter(|r| r.markers.start > from_line)
            .min_by_key(|r| r.markers.start)
            .or_else(|| regions.iter().min_by_key(|r| r.markers.start))
    }

    /// Last region starting before `from_line`, wrapping to the last region.
    pub fn prev(regions: &[ConflictRegion], from_line: usize) -> Option<&ConflictRegion> {
        regions
            .iter()
            .filter(|r| r.markers.start < from_line)
            .max_by_key(|r| r.markers.start)
            .or_else(|| regions.iter().max_by_key(|r| r.markers.start))
    }
}
