use crate::ast::*;
use crate::env::Environment;
use crate::error::RenderError;
use crate::evaluate::{evaluate, evaluate_params_and_hash};
use crate::tree::Morph;
use crate::value::{Hash, Params, Value};
use tracing::{debug, trace};

/// Linking key for a `content` statement's single resolved value.
pub const RANGE_LINK_KEY: &str = "@range";
/// Linking key for an `attribute` statement's single value.
pub const ATTRIBUTE_LINK_KEY: &str = "@attribute";

/// One method per statement kind.
///
/// `visitor` is the visitor driving the current pass. It is handed on to
/// hooks that render nested templates, so a delegating visitor must pass
/// it through rather than substituting itself.
pub trait StatementVisitor<E: Environment> {
    fn block(
        &self,
        node: &BlockStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError>;

    fn inline(
        &self,
        node: &InlineStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError>;

    fn content(
        &self,
        node: &ContentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError>;

    fn element(
        &self,
        node: &ElementStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError>;

    fn attribute(
        &self,
        node: &AttributeStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
    ) -> Result<(), RenderError>;

    fn component(
        &self,
        node: &ComponentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError>;
}

/// Dispatch a node bound to `morph`.
///
/// Expressions are evaluated and their value returned; statements are
/// handed to `visitor` and yield `None`.
pub fn accept<E: Environment>(
    node: &Node,
    morph: &mut E::Morph,
    env: &mut E,
    scope: &E::Scope,
    template: &Template,
    visitor: &dyn StatementVisitor<E>,
) -> Result<Option<Value>, RenderError> {
    trace!(tag = node.tag(), "accept");
    match node {
        Node::Expr(expr) => evaluate(expr, env, scope).map(Some),
        Node::Statement(statement) => {
            accept_statement(statement, morph, env, scope, template, visitor)?;
            Ok(None)
        }
    }
}

fn accept_statement<E: Environment>(
    statement: &Statement,
    morph: &mut E::Morph,
    env: &mut E,
    scope: &E::Scope,
    template: &Template,
    visitor: &dyn StatementVisitor<E>,
) -> Result<(), RenderError> {
    match statement {
        Statement::Block(node) => visitor.block(node, morph, env, scope, template, visitor),
        Statement::Inline(node) => visitor.inline(node, morph, env, scope, visitor),
        Statement::Content(node) => visitor.content(node, morph, env, scope, visitor),
        Statement::Element(node) => visitor.element(node, morph, env, scope, visitor),
        Statement::Attribute(node) => visitor.attribute(node, morph, env, scope),
        Statement::Component(node) => {
            visitor.component(node, morph, env, scope, template, visitor)
        }
    }
}

/// A path renders as a helper call when it is a keyword or a known helper.
pub fn is_helper<E: Environment>(env: &mut E, scope: &E::Scope, path: &str) -> bool {
    env.is_keyword(path) || env.has_helper(scope, path)
}

/// `content` rendering shared by the unconditional visitor and the default
/// `Environment::content` hook.
pub fn render_content<E: Environment>(
    path: &str,
    morph: &mut E::Morph,
    env: &mut E,
    scope: &E::Scope,
    visitor: &dyn StatementVisitor<E>,
) -> Result<(), RenderError> {
    if is_helper(env, scope, path) {
        return env.inline(morph, scope, path, &Params::new(), &Hash::new(), visitor);
    }

    let params = match morph.linked_params() {
        Some(linked) => linked.params.clone(),
        None => vec![env.get(scope, path)?],
    };
    env.link_params(scope, morph, RANGE_LINK_KEY, &params, None)?;
    let value = params.into_iter().next().unwrap_or_default();
    env.range(morph, scope, &value)
}

// ── Unconditional visitor ───────────────────────────────────────────

/// Renders every statement it visits, ignoring the dirty flag.
/// Used for first renders and forced re-renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconditionalVisitor;

impl<E: Environment> StatementVisitor<E> for UnconditionalVisitor {
    fn block(
        &self,
        node: &BlockStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        let (params, hash) = evaluate_params_and_hash(
            env,
            scope,
            morph,
            &node.path,
            Some(node.params.as_slice()),
            Some(&node.hash),
        )?;
        let body = template.nested(node.template_id)?;
        let inverse = template.nested(node.inverse_id)?;
        env.block(morph, scope, &node.path, &params, &hash, body, inverse, visitor)
    }

    fn inline(
        &self,
        node: &InlineStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        let (params, hash) = evaluate_params_and_hash(
            env,
            scope,
            morph,
            &node.path,
            Some(node.params.as_slice()),
            Some(&node.hash),
        )?;
        env.inline(morph, scope, &node.path, &params, &hash, visitor)
    }

    fn content(
        &self,
        node: &ContentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        render_content(&node.path, morph, env, scope, visitor)
    }

    fn element(
        &self,
        node: &ElementStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        let (params, hash) = evaluate_params_and_hash(
            env,
            scope,
            morph,
            &node.path,
            Some(node.params.as_slice()),
            Some(&node.hash),
        )?;
        env.element(morph, scope, &node.path, &params, &hash, visitor)
    }

    fn attribute(
        &self,
        node: &AttributeStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
    ) -> Result<(), RenderError> {
        let (params, _) = evaluate_params_and_hash(
            env,
            scope,
            morph,
            ATTRIBUTE_LINK_KEY,
            Some(std::slice::from_ref(&node.value)),
            None,
        )?;
        let value = params.into_iter().next().unwrap_or_default();
        env.attribute(morph, scope, &node.name, &value)
    }

    fn component(
        &self,
        node: &ComponentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        let (_, hash) =
            evaluate_params_and_hash(env, scope, morph, &node.path, None, Some(&node.attrs))?;
        let body = template.nested(node.template_id)?;
        env.component(morph, scope, &node.path, &hash, body, visitor)
    }
}

// ── Incremental visitor ─────────────────────────────────────────────

/// Re-renders a statement only when its morph is dirty, then marks it
/// clean. Clean morphs are skipped and only their children are revisited.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalVisitor {
    unconditional: UnconditionalVisitor,
}

impl IncrementalVisitor {
    pub fn new() -> Self {
        IncrementalVisitor {
            unconditional: UnconditionalVisitor,
        }
    }
}

/// Run `render` if the morph is dirty and reset the flag once it succeeds.
/// Otherwise walk the morph's children. A failed render leaves the morph
/// dirty.
fn dirty_check<E, F>(
    tag: &'static str,
    morph: &mut E::Morph,
    env: &mut E,
    visitor: &dyn StatementVisitor<E>,
    render: F,
) -> Result<(), RenderError>
where
    E: Environment,
    F: FnOnce(&mut E::Morph, &mut E) -> Result<(), RenderError>,
{
    if morph.is_dirty() {
        render(morph, env)?;
        morph.set_dirty(false);
        debug!(tag, "re-rendered dirty morph");
    } else {
        trace!(tag, "skipping clean morph");
        env.validate_child_morphs(morph, visitor)?;
    }
    Ok(())
}

impl<E: Environment> StatementVisitor<E> for IncrementalVisitor {
    fn block(
        &self,
        node: &BlockStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        dirty_check("block", morph, env, visitor, |morph, env| {
            self.unconditional
                .block(node, morph, env, scope, template, visitor)
        })
    }

    fn inline(
        &self,
        node: &InlineStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        dirty_check("inline", morph, env, visitor, |morph, env| {
            self.unconditional.inline(node, morph, env, scope, visitor)
        })
    }

    /// Dirty content goes straight to the environment's `content` hook.
    fn content(
        &self,
        node: &ContentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        dirty_check("content", morph, env, visitor, |morph, env| {
            env.content(morph, scope, &node.path, visitor)
        })
    }

    fn element(
        &self,
        node: &ElementStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        dirty_check("element", morph, env, visitor, |morph, env| {
            self.unconditional.element(node, morph, env, scope, visitor)
        })
    }

    /// Attributes have no children, so a clean attribute is left alone.
    fn attribute(
        &self,
        node: &AttributeStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
    ) -> Result<(), RenderError> {
        if morph.is_dirty() {
            StatementVisitor::<E>::attribute(&self.unconditional, node, morph, env, scope)?;
            morph.set_dirty(false);
            debug!(tag = "attribute", "re-rendered dirty morph");
        }
        Ok(())
    }

    fn component(
        &self,
        node: &ComponentStatement,
        morph: &mut E::Morph,
        env: &mut E,
        scope: &E::Scope,
        template: &Template,
        visitor: &dyn StatementVisitor<E>,
    ) -> Result<(), RenderError> {
        dirty_check("component", morph, env, visitor, |morph, env| {
            self.unconditional
                .component(node, morph, env, scope, template, visitor)
        })
    }
}
