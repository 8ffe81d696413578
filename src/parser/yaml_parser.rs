use super::{
    loader::load,
    nom_parser::{Param, ParamValue, TreeDef, TreeRootDef, TreeSource},
};
use crate::{error::LoadError, BehaviorTree, Registry};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct YamlDocument {
    trees: BTreeMap<String, YamlNode>,
}

#[derive(Debug, Deserialize)]
struct YamlNode {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    children: Vec<YamlNode>,
    /// Every other key is a node parameter.
    #[serde(flatten)]
    params: BTreeMap<String, Value>,
}

fn convert_node(node: &YamlNode) -> Result<TreeDef, LoadError> {
    let mut def = TreeDef::new(&node.ty);

    for (key, value) in &node.params {
        let value = match value {
            Value::Number(n) => n.as_f64().map(ParamValue::Number),
            Value::String(s) => Some(ParamValue::Literal(s.clone())),
            Value::Bool(b) => Some(ParamValue::Ident(if *b { "true" } else { "false" })),
            _ => None,
        }
        .ok_or_else(|| LoadError::InvalidParam {
            node: node.ty.clone(),
            param: key.clone(),
            reason: "expected a number or a string".to_owned(),
        })?;
        def.params.push(Param {
            key: key.as_str(),
            value,
        });
    }

    def.children = node
        .children
        .iter()
        .map(convert_node)
        .collect::<Result<_, _>>()?;

    Ok(def)
}

/// Build the tree named `main` from a YAML document of the form
///
/// ```yaml
/// trees:
///   main:
///     type: Sequence
///     children:
///       - type: Wait
///         duration: 0.5
///       - type: patrol
///   patrol:
///     type: GoTo
///     index: 1
/// ```
///
/// Kinds, parameters and subtrees mean the same as in the text format.
pub fn load_yaml(yaml: &str, registry: &Registry) -> Result<BehaviorTree, LoadError> {
    let document: YamlDocument = serde_yaml::from_str(yaml)?;

    let tree_defs = document
        .trees
        .iter()
        .map(|(name, root)| {
            Ok(TreeRootDef {
                name: name.as_str(),
                root: convert_node(root)?,
            })
        })
        .collect::<Result<_, LoadError>>()?;

    load(&TreeSource { tree_defs }, registry)
}
