/// How the pipeline talks to the user.
pub trait Notifier: Send + Sync {
    /// A short-lived message, e.g. the reason a run was aborted.
    fn notice(&self, message: &str);

    /// Shows an in-progress indicator until [`end_progress`](Self::end_progress).
    fn begin_progress(&self, message: &str);

    /// Dismisses the in-progress indicator, if one is showing.
    fn end_progress(&self);
}
