#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives user-facing messages from the controller.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Local data was replaced by a download or restore; views should reload.
    fn local_data_replaced(&self) {}
}
