mod backup;
mod overview;
mod state;

pub use backup::{BackupEntry, BackupHistory};
pub use overview::{Affordances, SyncSnapshot};
pub use state::{Phase, SyncState};
