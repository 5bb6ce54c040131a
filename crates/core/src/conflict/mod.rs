//! Conflict marker scanning, tracking, and resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Scanning** -- turning `<<<<<<<` / `|||||||` / `=======` / `>>>>>>>`
//!    blocks into addressable regions.
//! 2. **Tracking** -- keeping the ordered region set of each document.
//! 3. **Resolution** -- rewriting a block to one side, both, or nothing.
//! 4. **Presentation** -- navigation targets and sign descriptors.

pub mod navigation;
pub mod region;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod signs;

pub use navigation::NavigationController;
pub use region::{ConflictMarkers, ConflictRegion, LineSpan, RegionId, RegionStatus};
pub use registry::ConflictRegistry;
pub use resolver::{ActionKind, RegionSelector, RepeatableAction, Resolution, ResolutionExecutor};
pub use scanner::MarkerScanner;
pub use signs::{SignCategory, SignDelta, SignDescriptor, SignPresenter};
