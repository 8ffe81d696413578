use crate::Status;

/// One status transition of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange<'a> {
    /// Node kind, e.g. `"Sequence"`.
    pub kind: &'static str,
    pub name: &'a str,
    pub old: Status,
    pub new: Status,
}

/// Receives diagnostics from ticking nodes.
///
/// Only called while [`crate::Context::debug_enabled`] is set. Nothing an
/// observer does can change what a node returns.
pub trait StatusObserver {
    fn status_changed(&mut self, change: &StatusChange);

    /// Free-text output from debug leaves.
    fn message(&mut self, _node: &str, _message: &str) {}
}

/// Forwards everything to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn status_changed(&mut self, change: &StatusChange) {
        tracing::debug!(
            target: "agent_behavior_tree::status",
            kind = change.kind,
            name = change.name,
            old = ?change.old,
            new = ?change.new,
            "status changed"
        );
    }

    fn message(&mut self, node: &str, message: &str) {
        tracing::debug!(target: "agent_behavior_tree::debug", name = node, "{message}");
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn status_changed(&mut self, _change: &StatusChange) {}
}
