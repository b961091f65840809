use crate::ast::Template;
use crate::error::RenderError;
use crate::tree::{LinkedParams, Morph};
use crate::value::{Hash, Params, Value};
use crate::visitor::{self, StatementVisitor};
use std::rc::Rc;
use tracing::debug;

/// The hooks the visitors call to resolve values and mutate output.
///
/// Every hook is a required method; the only defaults are `content`,
/// `link_params` and `link_render_node`, which are expressed in terms of
/// the other hooks. Hook errors are returned to the caller unchanged.
pub trait Environment: Sized {
    type Morph: Morph;
    type Scope;

    fn get(&mut self, scope: &Self::Scope, path: &str) -> Result<Value, RenderError>;

    fn subexpr(
        &mut self,
        scope: &Self::Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
    ) -> Result<Value, RenderError>;

    fn concat(&mut self, parts: &Params) -> Result<Value, RenderError>;

    #[allow(clippy::too_many_arguments)]
    fn block(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        template: Option<&Rc<Template>>,
        inverse: Option<&Rc<Template>>,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError>;

    fn inline(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError>;

    /// Called by the incremental visitor when a dirty `content` statement
    /// re-renders. The default behaves exactly like the unconditional
    /// visitor's `content`: helper paths become a zero-argument `inline`,
    /// anything else is resolved and written through `range`.
    fn content(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        path: &str,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError> {
        visitor::render_content(path, morph, self, scope, visitor)
    }

    fn range(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        value: &Value,
    ) -> Result<(), RenderError>;

    fn element(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        path: &str,
        params: &Params,
        hash: &Hash,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError>;

    fn attribute(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        name: &str,
        value: &Value,
    ) -> Result<(), RenderError>;

    fn component(
        &mut self,
        morph: &mut Self::Morph,
        scope: &Self::Scope,
        path: &str,
        hash: &Hash,
        template: Option<&Rc<Template>>,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError>;

    fn has_helper(&mut self, scope: &Self::Scope, path: &str) -> bool;

    /// Presence test against the keyword table.
    fn is_keyword(&self, path: &str) -> bool;

    /// Give the already-rendered children of a skipped morph a chance to
    /// re-render through `visitor` if they are dirty themselves.
    fn validate_child_morphs(
        &mut self,
        morph: &mut Self::Morph,
        visitor: &dyn StatementVisitor<Self>,
    ) -> Result<(), RenderError>;

    /// Whether a node's evaluated arguments should be cached on its morph.
    fn link_render_node(
        &mut self,
        _morph: &Self::Morph,
        _scope: &Self::Scope,
        _path: &str,
        _params: &Params,
        _hash: Option<&Hash>,
    ) -> bool {
        false
    }

    /// Called after every params/hash evaluation. The return value of the
    /// evaluation is never affected by what this decides.
    fn link_params(
        &mut self,
        scope: &Self::Scope,
        morph: &mut Self::Morph,
        path: &str,
        params: &Params,
        hash: Option<&Hash>,
    ) -> Result<(), RenderError> {
        if morph.linked_params().is_some() {
            return Ok(());
        }
        if self.link_render_node(morph, scope, path, params, hash) {
            debug!(path, params = params.len(), "linking params");
            morph.set_linked_params(LinkedParams {
                params: params.clone(),
                hash: hash.cloned().unwrap_or_default(),
            });
        }
        Ok(())
    }
}
