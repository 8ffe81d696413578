mod loader;
mod nom_parser;
mod yaml_parser;

pub use self::{
    loader::load,
    nom_parser::{parse_file, parse_source, Param, ParamValue, TreeDef, TreeRootDef, TreeSource},
    yaml_parser::load_yaml,
};
