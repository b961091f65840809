//! A DOM-less `Environment` that renders morphs to strings.
//!
//! Scope resolution, helpers and the `if`/`unless`/`each`/`with` keywords
//! live here rather than in the visitors, which only dispatch.

use crate::ast::Template;
use crate::env::Environment;
use crate::error::RenderError;
use crate::render::render_template;
use crate::tree::{LastRender, Morph, TextMorph};
use crate::value::{Hash, Params, Value};
use crate::visitor::StatementVisitor;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;

/// Paths the block and inline hooks handle themselves.
pub const KEYWORDS: &[&str] = &["if", "unless", "each", "with"];

pub type Helper = Box<dyn Fn(&Params, &Hash) -> Result<Value, RenderError>>;

/// The values a template is rendered against.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    /// What `this` refers to, and the fallback for unbound names.
    pub self_value: Value,
    pub locals: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new(self_value: Value) -> Self {
        Scope {
            self_value,
            locals: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.locals.insert(name.to_string(), value);
    }

    /// Resolve a dotted path. The head is looked up as `this`, then in the
    /// locals, then on `self_value`. Missing segments resolve to `Null`.
    pub fn resolve(&self, path: &str) -> Value {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let mut current = if head == "this" {
            Some(&self.self_value)
        } else if let Some(local) = self.locals.get(head) {
            Some(local)
        } else {
            self.self_value.lookup(head)
        };
        for segment in segments {
            current = current.and_then(|value| value.lookup(segment));
        }
        current.cloned().unwrap_or_default()
    }

    /// A scope for a nested template: same locals, new `this`.
    fn with_self(&self, self_value: Value) -> Scope {
        Scope {
            self_value,
            locals: self.locals.clone(),
        }
    }
}

pub struct TextEnvironment {
    helpers: BTreeMap<String, Helper>,
    /// When set, every statement's evaluated arguments are linked on its
    /// morph after the first render.
    link_arguments: bool,
}

impl TextEnvironment {
    pub fn new() -> Self {
        TextEnvironment {
            helpers: BTreeMap::new(),
            link_arguments: false,
        }
    }

    /// An environment with `eq`, `not`, `upper`, `lower` and `join`.
    pub fn with_builtin_helpers() -> Self {
        let mut env = Self::new();
        env.register_helper("eq", |params, _| {
            Ok(Value::Boolean(params.first() == params.get(1)))
        });
        env.register_helper("not", |params, _| {
            Ok(Value::Boolean(
                !params.first().map(Value::is_truthy).unwrap_or(false),
            ))
        });
        env.register_helper("upper", |params, _| {
            Ok(Value::String(first_text(params).to_uppercase()))
        });
        env.register_helper("lower", |params, _| {
            Ok(Value::String(first_text(params).to_lowercase()))
        });
        env.register_helper("join", |params, hash| {
            let separator = hash
                .get("separator")
                .map(Value::to_string)
                .unwrap_or_else(|| ",".to_string());
            let items: Vec<String> = match params.first() {
                Some(Value::Array(items)) => items.iter().map(Value::to_string).collect(),
                _ => params.iter().map(Value::to_string).collect(),
            };
            Ok(Value::String(items.join(&separator)))
        });
        env
    }

    pub fn register_helper<F>(&mut self, name: &str, helper: F)
    where
        F: Fn(&Params, &Hash) -> Result<Value, RenderError> + 'static,
    {
        self.helpers.insert(name.to_string(), Box::new(helper));
    }

    pub fn set_link_arguments(&mut self, link: bool) {
        self.link_arguments = link;
    }

    fn call_helper(&self, path: &str, params: &Params, hash: &Hash) -> Result<Value, RenderError> {
        match self.helpers.get(path) {
            Some(helper) => helper(params, hash),
            None => Err(RenderError::MissingHelper(path.to_string())),
        }
    }

    /// Render `template` into `morph`'s children.
    ///
    /// Children are reused positionally when the same template was rendered
    /// last time. If the scope changed they are all marked dirty first; a
    /// different template starts over with fresh morphs.
    pub fn yield_template(
        &mut self,
        morph: &mut TextMorph,
        template: &Rc<Template>,
        scope: Scope,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        match &morph.last_render {
            Some(last) if Rc::ptr_eq(&last.template, template) => {
                if last.scope != scope {
                    for child in &mut morph.children {
                        child.invalidate(true);
                    }
                }
            }
            _ => {
                morph.children.clear();
            }
        }
        render_template(template, &mut morph.children, self, &scope, visitor)?;
        morph.refresh_output();
        morph.last_render = Some(LastRender {
            template: Rc::clone(template),
            scope,
        });
        Ok(())
    }

    fn yield_optional(
        &mut self,
        morph: &mut TextMorph,
        template: Option<&Rc<Template>>,
        scope: Scope,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        match template {
            Some(template) => self.yield_template(morph, template, scope, visitor),
            None => {
                morph.clear();
                Ok(())
            }
        }
    }

    /// One wrapper row per item, each rendering `template` with `this` bound
    /// to the item and `@index` to its position.
    fn yield_rows(
        &mut self,
        morph: &mut TextMorph,
        items: &[Value],
        template: &Rc<Template>,
        scope: &Scope,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        if morph.last_render.is_some() {
            morph.clear();
        }
        morph.children.truncate(items.len());
        morph.children.resize_with(items.len(), TextMorph::new);
        for (index, (row, item)) in morph.children.iter_mut().zip(items).enumerate() {
            let mut row_scope = scope.with_self(item.clone());
            row_scope.bind("@index", Value::Number(index as f64));
            self.yield_template(row, template, row_scope, visitor)?;
            row.set_dirty(false);
        }
        morph.refresh_output();
        Ok(())
    }
}

impl Default for TextEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

fn first_text(params: &Params) -> String {
    params.first().map(Value::to_string).unwrap_or_default()
}

fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

impl Environment for TextEnvironment {
    type Morph = TextMorph;
    type Scope = Scope;

    fn get(&mut self, scope: &Scope, path: &str) -> Result<Value, RenderError> {
        Ok(scope.resolve(path))
    }

    fn subexpr(
        &mut self,
        _scope: &Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
    ) -> Result<Value, RenderError> {
        self.call_helper(path, params, hash)
    }

    fn concat(&mut self, parts: &Params) -> Result<Value, RenderError> {
        Ok(Value::String(parts.iter().map(Value::to_string).collect()))
    }

    fn block(
        &mut self,
        morph: &mut TextMorph,
        scope: &Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        template: Option<&Rc<Template>>,
        inverse: Option<&Rc<Template>>,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        trace!(path, "block");
        let first = params.first().cloned().unwrap_or_default();
        match path {
            "if" | "unless" => {
                let chosen = if first.is_truthy() == (path == "if") {
                    template
                } else {
                    inverse
                };
                self.yield_optional(morph, chosen, scope.clone(), visitor)
            }
            "with" => {
                if first.is_truthy() {
                    self.yield_optional(morph, template, scope.with_self(first), visitor)
                } else {
                    self.yield_optional(morph, inverse, scope.clone(), visitor)
                }
            }
            "each" => match (first.as_array(), template) {
                (Some(items), Some(template)) if !items.is_empty() => {
                    self.yield_rows(morph, items, template, scope, visitor)
                }
                _ => self.yield_optional(morph, inverse, scope.clone(), visitor),
            },
            _ => {
                let chosen = if self.call_helper(path, params, hash)?.is_truthy() {
                    template
                } else {
                    inverse
                };
                self.yield_optional(morph, chosen, scope.clone(), visitor)
            }
        }
    }

    fn inline(
        &mut self,
        morph: &mut TextMorph,
        scope: &Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        _visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        let value = match path {
            "if" | "unless" => {
                let truthy = params.first().map(Value::is_truthy).unwrap_or(false);
                let index = if truthy == (path == "if") { 1 } else { 2 };
                params.get(index).cloned().unwrap_or_default()
            }
            _ if self.helpers.contains_key(path) => self.call_helper(path, params, hash)?,
            _ if params.is_empty() && hash.is_empty() => scope.resolve(path),
            _ => return Err(RenderError::MissingHelper(path.to_string())),
        };
        self.range(morph, scope, &value)
    }

    fn range(&mut self, morph: &mut TextMorph, _scope: &Scope, value: &Value) -> Result<(), RenderError> {
        morph.output = value.to_string();
        Ok(())
    }

    fn element(
        &mut self,
        _morph: &mut TextMorph,
        _scope: &Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        _visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        self.call_helper(path, params, hash).map(|_| ())
    }

    fn attribute(
        &mut self,
        morph: &mut TextMorph,
        _scope: &Scope,
        name: &str,
        value: &Value,
    ) -> Result<(), RenderError> {
        morph.output = match value {
            Value::Null | Value::Boolean(false) => String::new(),
            _ => format!("{}=\"{}\"", name, escape_attribute(&value.to_string())),
        };
        Ok(())
    }

    fn component(
        &mut self,
        morph: &mut TextMorph,
        _scope: &Scope,
        path: &str,
        hash: &Hash,
        template: Option<&Rc<Template>>,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        trace!(path, "component");
        let scope = Scope::new(Value::Object(hash.clone()));
        self.yield_optional(morph, template, scope, visitor)
    }

    fn has_helper(&mut self, _scope: &Scope, path: &str) -> bool {
        self.helpers.contains_key(path)
    }

    fn is_keyword(&self, path: &str) -> bool {
        KEYWORDS.contains(&path)
    }

    fn validate_child_morphs(
        &mut self,
        morph: &mut TextMorph,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        if morph.children.is_empty() {
            return Ok(());
        }
        match &morph.last_render {
            Some(last) => {
                render_template(&last.template, &mut morph.children, self, &last.scope, visitor)?
            }
            None => {
                for row in &mut morph.children {
                    self.validate_child_morphs(row, visitor)?;
                }
            }
        }
        morph.refresh_output();
        Ok(())
    }

    fn link_render_node(
        &mut self,
        _morph: &TextMorph,
        _scope: &Scope,
        _path: &str,
        _params: &Params,
        _hash: Option<&Hash>,
    ) -> bool {
        self.link_arguments
    }
}
