use crate::ast::Template;
use crate::env::Environment;
use crate::error::RenderError;
use crate::text::{Scope, TextEnvironment};
use crate::tree::TextMorph;
use crate::value::Value;
use crate::visitor::{accept, IncrementalVisitor, StatementVisitor, UnconditionalVisitor};
use std::rc::Rc;
use tracing::debug;

/// Dispatch every statement of `template` against the morph at the same
/// position in `morphs`. Missing morphs are created (dirty) and extra ones
/// dropped.
pub fn render_template<E>(
    template: &Template,
    morphs: &mut Vec<E::Morph>,
    env: &mut E,
    scope: &E::Scope,
    visitor: &dyn StatementVisitor<E>,
) -> Result<(), RenderError>
where
    E: Environment,
    E::Morph: Default,
{
    morphs.truncate(template.statements.len());
    morphs.resize_with(template.statements.len(), Default::default);
    for (node, morph) in template.statements.iter().zip(morphs.iter_mut()) {
        accept(node, morph, env, scope, template, visitor)?;
    }
    Ok(())
}

/// A template rendered into a `TextMorph` tree, kept around for re-renders.
pub struct Renderer {
    template: Rc<Template>,
    env: TextEnvironment,
    scope: Scope,
    root: TextMorph,
}

impl Renderer {
    pub fn new(template: Template, env: TextEnvironment, context: Value) -> Self {
        Renderer {
            template: Rc::new(template),
            env,
            scope: Scope::new(context),
            root: TextMorph::new(),
        }
    }

    /// Render every statement, dirty or not, and leave the whole tree clean
    /// so the next `rerender` only revisits what `update` invalidates.
    pub fn render(&mut self) -> Result<&str, RenderError> {
        self.run(&UnconditionalVisitor)?;
        self.root.mark_clean(true);
        Ok(&self.root.output)
    }

    /// Re-render only dirty morphs, revisiting the children of clean ones.
    pub fn rerender(&mut self) -> Result<&str, RenderError> {
        self.run(&IncrementalVisitor::new())
    }

    /// Swap the root context and mark the whole tree dirty.
    pub fn update(&mut self, context: Value) {
        debug!(morphs = self.root.count(), "invalidating morph tree");
        self.scope.self_value = context;
        self.root.invalidate(true);
    }

    pub fn output(&self) -> &str {
        &self.root.output
    }

    pub fn root(&self) -> &TextMorph {
        &self.root
    }

    pub fn env_mut(&mut self) -> &mut TextEnvironment {
        &mut self.env
    }

    fn run(&mut self, visitor: &dyn StatementVisitor<TextEnvironment>) -> Result<&str, RenderError> {
        self.env
            .yield_template(&mut self.root, &self.template, self.scope.clone(), visitor)?;
        self.root.is_dirty = false;
        Ok(&self.root.output)
    }
}
