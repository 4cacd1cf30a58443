//! Local library bookkeeping: file naming, what is on disk, what is missing.

pub mod catalog;
pub mod diff;
pub mod inventory;
pub mod paths;

pub use catalog::load_catalog;
pub use diff::{PendingSeries, build_filters, count_episodes, missing_episodes};
pub use inventory::{Inventory, local_inventory, write_skip_file};
pub use paths::LibraryPaths;
