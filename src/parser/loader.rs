use super::nom_parser::{ParamValue, TreeDef, TreeRootDef, TreeSource};
use crate::{
    error::LoadError,
    node::{Node, NodeKind},
    nodes::{DynamicPriorities, Guard, MessageFn},
    BehaviorTree, Context, Registry,
};
use std::time::Duration;

/// Instantiate the tree named `main` from the AST of a tree source.
///
/// Node kinds are resolved in this order: the built-in kinds (`Sequence`,
/// `Selector`, `Wait`, ...), then the leaves in `registry`, then the other
/// trees in `tree_source`, which are nested as subtrees.
pub fn load(tree_source: &TreeSource, registry: &Registry) -> Result<BehaviorTree, LoadError> {
    let main = tree_source.find("main").ok_or(LoadError::MissingTree)?;

    let top = TreeStack {
        name: "main",
        parent: None,
    };

    instantiate_tree(main, main.name, registry, tree_source, &top)
}

/// A mechanism to detect infinite recursion. It is a linked list in call stack.
/// You can traverse the link back to enumerate all the subtree names (which is effectively function names)
/// and check if a subtree name to be inserted is already there.
///
/// Subtrees are instantiated eagerly, so a tree that contains itself could
/// never finish loading. Recursive references are rejected instead.
struct TreeStack<'a, 'src> {
    name: &'src str,
    parent: Option<&'a TreeStack<'a, 'src>>,
}

impl<'a, 'src> TreeStack<'a, 'src> {
    fn find(&self, name: &str) -> bool {
        if self.name == name {
            true
        } else if let Some(parent) = self.parent {
            parent.find(name)
        } else {
            false
        }
    }
}

fn instantiate_tree(
    tree: &TreeRootDef,
    name: &str,
    registry: &Registry,
    tree_source: &TreeSource,
    stack: &TreeStack,
) -> Result<BehaviorTree, LoadError> {
    let root = load_recurse(&tree.root, registry, tree_source, stack)?;
    Ok(BehaviorTree::new(name).with_child(root))
}

/// Look up `name` as a subtree, refusing one that is already being loaded further up.
fn load_subtree(
    name: &str,
    display_name: &str,
    registry: &Registry,
    tree_source: &TreeSource,
    parent_stack: &TreeStack,
) -> Result<Option<BehaviorTree>, LoadError> {
    let Some(tree) = tree_source.find(name) else {
        return Ok(None);
    };

    // Prevent infinite recursion
    if parent_stack.find(tree.name) {
        return Err(LoadError::InfiniteRecursion {
            node: name.to_owned(),
        });
    }
    let tree_stack = TreeStack {
        name: tree.name,
        parent: Some(parent_stack),
    };
    instantiate_tree(tree, display_name, registry, tree_source, &tree_stack).map(Some)
}

fn load_recurse(
    def: &TreeDef,
    registry: &Registry,
    tree_source: &TreeSource,
    parent_stack: &TreeStack,
) -> Result<Node, LoadError> {
    let params = Params(def);
    let name = params.text("name")?.unwrap_or(def.ty);

    let mut node = if let Some(node) = builtin(def, &params, name, registry, tree_source, parent_stack)? {
        node
    } else if let Some(node) = registry.build(def.ty, name, params.index("index")?.unwrap_or(0)) {
        node
    } else if let Some(tree) = load_subtree(def.ty, name, registry, tree_source, parent_stack)? {
        // A subtree only runs its own root, so extra children would never be ticked.
        if !def.children.is_empty() {
            return Err(LoadError::SubtreeChildren {
                node: def.ty.to_owned(),
            });
        }
        tree.into_node()
    } else {
        return Err(LoadError::MissingNode(def.ty.to_owned()));
    };

    if let Some(priority) = params.priority("priority")? {
        node.set_priority(priority);
    }

    for child in &def.children {
        let child_node = load_recurse(child, registry, tree_source, parent_stack)?;
        node.add_child(child_node).map_err(|source| LoadError::AddChild {
            source,
            node: def.ty.to_owned(),
        })?;
    }

    Ok(node)
}

fn builtin(
    def: &TreeDef,
    params: &Params,
    name: &str,
    registry: &Registry,
    tree_source: &TreeSource,
    parent_stack: &TreeStack,
) -> Result<Option<Node>, LoadError> {
    let node = match def.ty {
        "Sequence" => Node::sequence(name),
        "Selector" => Node::selector(name),
        "PrioritisingSelector" => Node::prioritising_selector(name),
        "DynamicPrioritisingSelector" => {
            let defaults = DynamicPriorities::default();
            let priorities = DynamicPriorities {
                on_success: params.priority("on_success")?.unwrap_or(defaults.on_success),
                on_failure: params.priority("on_failure")?.unwrap_or(defaults.on_failure),
            };
            Node::dynamic_prioritising_selector_with(name, priorities)
        }
        "RandomSelector" => match params.integer("seed")? {
            Some(seed) => {
                let seed = u64::try_from(seed).map_err(|_| params.invalid("seed", "must not be negative"))?;
                Node::random_selector_seeded(name, seed)
            }
            None => Node::random_selector(name),
        },
        "Inverter" => Node::inverter(name),
        "Wait" => {
            let seconds = params.required_number("duration")?;
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|e| params.invalid("duration", &e.to_string()))?;
            Node::wait(name, duration)
        }
        "Debug" => match params.text("message")? {
            Some(message) => {
                let f: MessageFn = match registry.message(message) {
                    Some(f) => f,
                    None => {
                        let text = message.to_owned();
                        Box::new(move |_: &Context| text.clone())
                    }
                };
                Node::new(name, NodeKind::Debug(Some(f)))
            }
            None => Node::debug(name),
        },
        "DependencySequence" => {
            let guard = load_guard(params.required_text("guard")?, registry, tree_source, parent_stack)?;
            let on_fail = params
                .text("on_fail")?
                .map(|callback| {
                    registry
                        .on_fail(callback)
                        .ok_or_else(|| LoadError::UnknownCallback(callback.to_owned()))
                })
                .transpose()?;
            Node::new(name, NodeKind::DependencySequence { guard, on_fail })
        }
        "Loop" => {
            let guard = load_guard(params.required_text("guard")?, registry, tree_source, parent_stack)?;
            Node::loop_while(name, guard)
        }
        _ => return Ok(None),
    };
    Ok(Some(node))
}

/// A guard names either a registered condition or another tree.
fn load_guard(
    name: &str,
    registry: &Registry,
    tree_source: &TreeSource,
    parent_stack: &TreeStack,
) -> Result<Guard, LoadError> {
    if let Some(condition) = registry.build_condition(name) {
        return Ok(condition.into());
    }
    load_subtree(name, name, registry, tree_source, parent_stack)?
        .map(Guard::from)
        .ok_or_else(|| LoadError::UnknownGuard(name.to_owned()))
}

struct Params<'a, 'src>(&'a TreeDef<'src>);

impl<'a, 'src> Params<'a, 'src> {
    fn invalid(&self, param: &str, reason: &str) -> LoadError {
        LoadError::InvalidParam {
            node: self.0.ty.to_owned(),
            param: param.to_owned(),
            reason: reason.to_owned(),
        }
    }

    fn text(&self, key: &str) -> Result<Option<&'a str>, LoadError> {
        match self.0.param(key) {
            None => Ok(None),
            Some(ParamValue::Ident(s)) => Ok(Some(*s)),
            Some(ParamValue::Literal(s)) => Ok(Some(s.as_str())),
            Some(ParamValue::Number(_)) => Err(self.invalid(key, "expected a name or a string")),
        }
    }

    fn required_text(&self, key: &'static str) -> Result<&'a str, LoadError> {
        self.text(key)?.ok_or_else(|| LoadError::MissingParam {
            node: self.0.ty.to_owned(),
            param: key,
        })
    }

    fn number(&self, key: &str) -> Result<Option<f64>, LoadError> {
        match self.0.param(key) {
            None => Ok(None),
            Some(ParamValue::Number(n)) => Ok(Some(*n)),
            Some(_) => Err(self.invalid(key, "expected a number")),
        }
    }

    fn required_number(&self, key: &'static str) -> Result<f64, LoadError> {
        self.number(key)?.ok_or_else(|| LoadError::MissingParam {
            node: self.0.ty.to_owned(),
            param: key,
        })
    }

    fn integer(&self, key: &str) -> Result<Option<i64>, LoadError> {
        match self.number(key)? {
            None => Ok(None),
            Some(n) if n.fract() == 0. && n.abs() <= i64::MAX as f64 => Ok(Some(n as i64)),
            Some(_) => Err(self.invalid(key, "expected an integer")),
        }
    }

    fn priority(&self, key: &str) -> Result<Option<i32>, LoadError> {
        self.integer(key)?
            .map(|n| i32::try_from(n).map_err(|_| self.invalid(key, "out of range")))
            .transpose()
    }

    fn index(&self, key: &str) -> Result<Option<usize>, LoadError> {
        self.integer(key)?
            .map(|n| usize::try_from(n).map_err(|_| self.invalid(key, "must not be negative")))
            .transpose()
    }
}
