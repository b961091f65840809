//! Compiled template representation consumed by the render visitors.
//! Produced by a template compiler (see `from_json` for the wire form) and
//! read-only afterwards.

use crate::value::Value;
use std::rc::Rc;

/// Named arguments in source order, duplicates preserved.
/// Evaluation collapses duplicates with last-write-wins.
pub type HashPairs = Vec<(String, Expr)>;

/// A node that evaluates to a value and never touches a morph's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Any non-tuple value. Evaluates to itself.
    Literal(Value),
    /// `["get", path]`
    Get { path: String },
    /// `["subexpr", path, params, hash]`
    Subexpr {
        path: String,
        params: Vec<Expr>,
        hash: HashPairs,
    },
    /// `["concat", parts]`
    Concat { parts: Vec<Expr> },
}

/// `["block", path, params, hash, templateId, inverseId]`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub path: String,
    pub params: Vec<Expr>,
    pub hash: HashPairs,
    pub template_id: Option<usize>,
    pub inverse_id: Option<usize>,
}

/// `["inline", path, params, hash]`
#[derive(Debug, Clone, PartialEq)]
pub struct InlineStatement {
    pub path: String,
    pub params: Vec<Expr>,
    pub hash: HashPairs,
}

/// `["content", path]`
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStatement {
    pub path: String,
}

/// `["element", path, params, hash]`
#[derive(Debug, Clone, PartialEq)]
pub struct ElementStatement {
    pub path: String,
    pub params: Vec<Expr>,
    pub hash: HashPairs,
}

/// `["attribute", name, value]`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStatement {
    pub name: String,
    pub value: Expr,
}

/// `["component", path, attrs, templateId]`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStatement {
    pub path: String,
    pub attrs: HashPairs,
    pub template_id: Option<usize>,
}

/// A node bound to a morph.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(BlockStatement),
    Inline(InlineStatement),
    Content(ContentStatement),
    Element(ElementStatement),
    Attribute(AttributeStatement),
    Component(ComponentStatement),
}

/// Anything that can appear in a template's statement list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expr(Expr),
    Statement(Statement),
}

/// A compiled template: its statements plus the nested templates that
/// `block`/`component` statements refer to by index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub statements: Vec<Node>,
    pub templates: Vec<Rc<Template>>,
}

impl Expr {
    pub fn tag(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Get { .. } => "get",
            Expr::Subexpr { .. } => "subexpr",
            Expr::Concat { .. } => "concat",
        }
    }

    pub fn get(path: &str) -> Self {
        Expr::Get {
            path: path.to_string(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }
}

impl Statement {
    pub fn tag(&self) -> &'static str {
        match self {
            Statement::Block(_) => "block",
            Statement::Inline(_) => "inline",
            Statement::Content(_) => "content",
            Statement::Element(_) => "element",
            Statement::Attribute(_) => "attribute",
            Statement::Component(_) => "component",
        }
    }
}

impl Node {
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Expr(e) => e.tag(),
            Node::Statement(s) => s.tag(),
        }
    }
}

impl From<Statement> for Node {
    fn from(statement: Statement) -> Self {
        Node::Statement(statement)
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Node::Expr(expr)
    }
}

impl Template {
    pub fn new(statements: Vec<Node>) -> Self {
        Template {
            statements,
            templates: Vec::new(),
        }
    }

    pub fn with_templates(statements: Vec<Node>, templates: Vec<Template>) -> Self {
        Template {
            statements,
            templates: templates.into_iter().map(Rc::new).collect(),
        }
    }

    /// Resolve an optional nested template id. `None` never indexes.
    pub fn nested(&self, id: Option<usize>) -> Result<Option<&Rc<Template>>, crate::RenderError> {
        match id {
            None => Ok(None),
            Some(id) => self
                .templates
                .get(id)
                .map(Some)
                .ok_or(crate::RenderError::MissingTemplate(id)),
        }
    }
}
