use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{
        alpha1, alphanumeric1, char, multispace0, newline, one_of, space0, space1,
    },
    combinator::{map, opt, recognize, value},
    multi::{many0, many1, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::LoadError;

#[derive(Debug, PartialEq, Clone)]
pub enum ParamValue<'src> {
    Number(f64),
    Ident(&'src str),
    /// Literal value could have escapes decoded, so it is an owned string.
    Literal(String),
}

impl<'src> ParamValue<'src> {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ident(s) => Some(*s),
            Self::Literal(s) => Some(s.as_str()),
            Self::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Param<'src> {
    pub(crate) key: &'src str,
    pub(crate) value: ParamValue<'src>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TreeDef<'src> {
    pub(crate) ty: &'src str,
    pub(crate) params: Vec<Param<'src>>,
    pub(crate) children: Vec<TreeDef<'src>>,
}

impl<'src> TreeDef<'src> {
    pub(crate) fn new(ty: &'src str) -> Self {
        Self {
            ty,
            params: vec![],
            children: vec![],
        }
    }

    fn inverted(child: TreeDef<'src>) -> Self {
        Self {
            ty: "Inverter",
            params: vec![],
            children: vec![child],
        }
    }

    pub fn ty(&self) -> &'src str {
        self.ty
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue<'src>> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .map(|param| &param.value)
    }

    pub fn children(&self) -> &[TreeDef<'src>] {
        &self.children
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TreeRootDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) root: TreeDef<'src>,
}

impl<'src> TreeRootDef<'src> {
    pub fn name(&self) -> &'src str {
        self.name
    }

    pub fn root(&self) -> &TreeDef<'src> {
        &self.root
    }
}

#[derive(Debug, PartialEq, Default, Clone)]
pub struct TreeSource<'src> {
    pub tree_defs: Vec<TreeRootDef<'src>>,
}

impl<'src> TreeSource<'src> {
    pub fn find(&self, name: &str) -> Option<&TreeRootDef<'src>> {
        self.tree_defs.iter().find(|tree| tree.name == name)
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn newlines(i: &str) -> IResult<&str, ()> {
    delimited(space0, many1(one_of("\r\n")), space0)(i).map(|(rest, _)| (rest, ()))
}

fn open_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('('), multispace0))(i)
}

fn close_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(multispace0, char(')'), space0))(i)
}

fn open_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('{'), space0))(i)
}

fn close_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('}'), space0))(i)
}

fn line_comment<T>(i: &str) -> IResult<&str, Option<T>> {
    let (i, _) = tuple((space0, char('#'), opt(is_not("\n\r"))))(i)?;

    Ok((i, None))
}

fn some<I, R>(f: impl Fn(I) -> IResult<I, R>) -> impl Fn(I) -> IResult<I, Option<R>> {
    move |i| {
        let (i, res) = f(i)?;
        Ok((i, Some(res)))
    }
}

/// A double-quoted string. `\\`, `\"` and `\n` are decoded in a single pass.
fn str_literal(input: &str) -> IResult<&str, ParamValue> {
    let (r, val) = delimited(
        preceded(multispace0, char('\"')),
        opt(escaped_transform(
            is_not("\\\""),
            '\\',
            alt((
                value("\\", char('\\')),
                value("\"", char('"')),
                value("\n", char('n')),
            )),
        )),
        terminated(char('"'), space0),
    )(input)?;
    Ok((r, ParamValue::Literal(val.unwrap_or_default())))
}

fn param_value(i: &str) -> IResult<&str, ParamValue> {
    alt((
        str_literal,
        map(identifier, ParamValue::Ident),
        map(double, ParamValue::Number),
    ))(i)
}

fn param(i: &str) -> IResult<&str, Param> {
    let (i, key) = delimited(space0, identifier, space0)(i)?;

    let (i, _) = char('=')(i)?;

    let (i, value) = delimited(space0, param_value, space0)(i)?;

    Ok((i, Param { key, value }))
}

fn params(i: &str) -> IResult<&str, Vec<Param>> {
    separated_list0(delimited(multispace0, char(','), multispace0), param)(i)
}

fn tree_children(i: &str) -> IResult<&str, Vec<TreeDef>> {
    let (i, _) = many0(newlines)(i)?;

    let (i, v) = many0(delimited(
        space0,
        alt((line_comment, some(parse_tree_elem))),
        many0(newlines),
    ))(i)?;

    let (i, _) = many0(newlines)(i)?;

    Ok((i, v.into_iter().flatten().collect()))
}

fn parse_tree_node(i: &str) -> IResult<&str, TreeDef> {
    let (i, ty) = delimited(space0, identifier, space0)(i)?;

    let (i, params) = opt(delimited(open_paren, params, close_paren))(i)?;

    let (i, children) = opt(delimited(open_brace, tree_children, close_brace))(i)?;

    let (i, _) = opt(line_comment::<()>)(i)?;

    Ok((
        i,
        TreeDef {
            ty,
            params: params.unwrap_or_default(),
            children: children.unwrap_or_default(),
        },
    ))
}

/// A node, or `!node` for the inversion of one.
fn parse_tree_elem(i: &str) -> IResult<&str, TreeDef> {
    let (i, excl) = opt(delimited(space0, char('!'), space0))(i)?;

    if excl.is_some() {
        let (i, res) = parse_tree_elem(i)?;

        Ok((i, TreeDef::inverted(res)))
    } else {
        parse_tree_node(i)
    }
}

fn parse_tree(i: &str) -> IResult<&str, TreeRootDef> {
    let (i, _) = delimited(multispace0, tag("tree"), space1)(i)?;

    let (i, name) = delimited(space0, identifier, space0)(i)?;

    let (i, _) = delimited(space0, char('='), space0)(i)?;

    let (i, root) = parse_tree_elem(i)?;

    Ok((i, TreeRootDef { name, root }))
}

/// Parse every tree definition in `i`, returning whatever input could not be
/// consumed alongside the trees.
pub fn parse_file(i: &str) -> IResult<&str, TreeSource> {
    let (i, stmts) = many0(alt((
        delimited(multispace0, line_comment, opt(newline)),
        some(parse_tree),
    )))(i)?;

    // Eat up trailing newlines to indicate that the input was thoroughly consumed
    let (i, _) = multispace0(i)?;

    Ok((
        i,
        TreeSource {
            tree_defs: stmts.into_iter().flatten().collect(),
        },
    ))
}

/// Like [`parse_file`], but anything left unparsed is a [`LoadError::Syntax`].
pub fn parse_source(src: &str) -> Result<TreeSource, LoadError> {
    match parse_file(src) {
        Ok(("", source)) => Ok(source),
        Ok((rest, _)) => Err(LoadError::Syntax(first_line(rest))),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(LoadError::Syntax(first_line(e.input))),
        Err(nom::Err::Incomplete(_)) => Err(LoadError::Syntax("unexpected end of input".to_owned())),
    }
}

fn first_line(rest: &str) -> String {
    rest.lines().next().unwrap_or_default().trim().to_owned()
}
