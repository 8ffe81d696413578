use crate::{
    error::AddChildResult,
    node::{Node, NodeKind},
    Context, Status,
};
use std::fmt::{self, Display, Formatter};

/// The root of a behavior tree and the only thing an outside driver ticks.
///
/// A tree conventionally holds one top-level child and passes each tick on to
/// it. An empty tree succeeds without doing anything.
pub struct BehaviorTree {
    root: Node,
}

impl Default for BehaviorTree {
    fn default() -> Self {
        Self::new("Root")
    }
}

impl BehaviorTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: Node::new(name, NodeKind::Root),
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.root.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: Node) -> AddChildResult {
        self.root.add_child(child)
    }

    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        self.root.remove_child(index)
    }

    pub fn remove_children(&mut self) {
        self.root.remove_children();
    }

    pub fn tick(&mut self, ctx: &mut Context) -> Status {
        self.root.tick(ctx)
    }

    pub fn reset(&mut self) {
        self.root.reset();
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn status(&self) -> Status {
        self.root.status()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn children(&self) -> &[Node] {
        self.root.children()
    }

    pub fn find(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.root.find_mut(name)
    }

    /// Turn the tree into a plain node, e.g. to nest it in another tree.
    pub fn into_node(self) -> Node {
        self.root
    }

    /// Outline of the tree, one node per line, each name prefixed by one `-`
    /// per level of depth.
    ///
    /// ```
    /// # use agent_behavior_tree::{BehaviorTree, Node};
    /// let tree = BehaviorTree::new("Root").with_child(
    ///     Node::sequence("Patrol")
    ///         .with_children([Node::leaf("GoToA"), Node::leaf("GoToB")])
    ///         .unwrap(),
    /// );
    /// assert_eq!(tree.render(), "Root\n-Patrol\n--GoToA\n--GoToB\n");
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(0, &self.root)];
        while let Some((depth, node)) = stack.pop() {
            out.push_str(&"-".repeat(depth));
            out.push_str(node.name());
            out.push('\n');
            stack.extend(node.children().iter().rev().map(|child| (depth + 1, child)));
        }
        out
    }

    pub fn log_tree(&self) {
        tracing::info!(tree = self.name(), "\n{}", self.render());
    }
}

impl From<Node> for BehaviorTree {
    fn from(node: Node) -> Self {
        if matches!(node.kind, NodeKind::Root) {
            Self { root: node }
        } else {
            Self::default().with_child(node)
        }
    }
}

impl Display for BehaviorTree {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(&self.render())
    }
}

impl fmt::Debug for BehaviorTree {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_tuple("BehaviorTree").field(&self.root).finish()
    }
}
