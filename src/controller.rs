mod completion;
mod confirm;
mod notify;
mod sync_status;

pub use completion::{AuthorizationCompletion, AuthorizationUrl, CompletionSender};
pub use confirm::{AutoConfirm, Confirm, ConfirmAction};
pub use notify::{NoticeLevel, Notifier};
pub use sync_status::{
    AuthorizationRequest, AuthorizationWait, Outcome, SyncStatusController,
    BACKUP_RETENTION_DAYS,
};
