//! Statement dispatch and incremental re-rendering for compiled templates.
//!
//! A compiled template is a list of tagged nodes (`ast`). Each statement is
//! bound to a morph (`tree::Morph`), a mutable handle on a region of output.
//! `visitor::accept` dispatches a node to a `StatementVisitor`:
//! `UnconditionalVisitor` always re-renders, `IncrementalVisitor` only
//! re-renders dirty morphs and otherwise revisits their children. All value
//! resolution and output mutation goes through `env::Environment` hooks;
//! `text::TextEnvironment` is a string-rendering implementation of them.

pub mod ast;
pub mod env;
pub mod error;
pub mod evaluate;
pub mod from_json;
pub mod json;
pub mod render;
pub mod text;
pub mod tree;
pub mod validate;
pub mod value;
pub mod visitor;

pub use ast::{Node, Template};
pub use env::Environment;
pub use error::{DecodeError, RenderError};
pub use render::{render_template, Renderer};
pub use text::{Scope, TextEnvironment};
pub use tree::{LinkedParams, Morph, TextMorph};
pub use validate::{validate_template, ValidationError};
pub use value::{Hash, Params, Value};
pub use visitor::{accept, IncrementalVisitor, StatementVisitor, UnconditionalVisitor};

/// Decode a compiled template and render it once against `context` using
/// a `TextEnvironment` with the builtin helpers.
pub fn render_json(template: &str, context: &serde_json::Value) -> Result<String, RenderError> {
    let template = from_json::template_from_json(template)?;
    let mut renderer = Renderer::new(
        template,
        TextEnvironment::with_builtin_helpers(),
        Value::from(context.clone()),
    );
    let output = renderer.render()?.to_string();
    Ok(output)
}
