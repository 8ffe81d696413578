use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AddChildError {
    #[error("Attempted to add too many nodes to {node:?} (at most {max})")]
    TooManyNodes { node: String, max: usize },
}

pub type AddChildResult = Result<(), AddChildError>;

/// Why a typed blackboard lookup came back empty.
///
/// [`crate::Blackboard::try_get`] folds both cases into `None`; use
/// [`crate::Blackboard::lookup`] when the distinction matters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlackboardError {
    #[error("Blackboard variable {0:?} does not exist")]
    Missing(String),
    #[error("Blackboard variable {key:?} holds {found}, not {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EventError {
    /// Broadcasting is not fault isolated: the first failing listener stops delivery.
    #[error("Listener for {event} failed: {source}")]
    Listener {
        event: &'static str,
        #[source]
        source: ListenerError,
    },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("Syntax error in tree source near {0:?}")]
    Syntax(String),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("The main tree does not exist")]
    MissingTree,
    #[error("Node type or subtree name not found {0:?}")]
    MissingNode(String),
    #[error("Subtree {node:?} refers to itself")]
    InfiniteRecursion { node: String },
    #[error("Subtree reference {node:?} cannot have children of its own")]
    SubtreeChildren { node: String },
    #[error("Node {node:?} requires parameter {param:?}")]
    MissingParam { node: String, param: &'static str },
    #[error("Parameter {param:?} of node {node:?} is invalid: {reason}")]
    InvalidParam {
        node: String,
        param: String,
        reason: String,
    },
    #[error("Guard {0:?} is neither a registered condition nor a tree")]
    UnknownGuard(String),
    #[error("Callback {0:?} is not registered")]
    UnknownCallback(String),
    #[error("{source} while loading {node}")]
    AddChild {
        #[source]
        source: AddChildError,
        node: String,
    },
}
