use crate::ast::Template;
use crate::text::Scope;
use crate::value::{Hash, Params};
use std::rc::Rc;

/// Arguments cached on a morph. While present, the visitors hand these to
/// the hooks verbatim instead of re-evaluating the node's expressions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkedParams {
    pub params: Params,
    pub hash: Hash,
}

/// The mutable state of a rendered region that the visitors read and write.
///
/// A morph tree must only be walked by one render pass at a time.
pub trait Morph {
    fn is_dirty(&self) -> bool;

    /// The visitors only ever call this with `false`. Marking a morph dirty
    /// is left to whoever invalidates the tree.
    fn set_dirty(&mut self, dirty: bool);

    fn linked_params(&self) -> Option<&LinkedParams>;

    fn set_linked_params(&mut self, linked: LinkedParams);
}

/// The template and scope a morph's children were last rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct LastRender {
    pub template: Rc<Template>,
    pub scope: Scope,
}

/// A morph that renders to a string, used by `TextEnvironment`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMorph {
    pub is_dirty: bool,
    pub linked_params: Option<LinkedParams>,
    pub output: String,
    pub children: Vec<TextMorph>,
    /// Set when `children` are positionally bound to `template.statements`.
    /// Wrapper morphs (one row per `each` item) leave this unset and keep a
    /// `LastRender` on each row instead.
    pub last_render: Option<LastRender>,
}

impl TextMorph {
    /// New morphs start dirty so their first pass always renders.
    pub fn new() -> Self {
        TextMorph {
            is_dirty: true,
            linked_params: None,
            output: String::new(),
            children: Vec::new(),
            last_render: None,
        }
    }

    /// Mark this morph dirty, and with `deep` every descendant as well.
    pub fn invalidate(&mut self, deep: bool) {
        self.is_dirty = true;
        if deep {
            for child in &mut self.children {
                child.invalidate(true);
            }
        }
    }

    /// Clear the dirty flag on this morph, and with `deep` on every
    /// descendant as well.
    pub fn mark_clean(&mut self, deep: bool) {
        self.is_dirty = false;
        if deep {
            for child in &mut self.children {
                child.mark_clean(true);
            }
        }
    }

    /// Rebuild `output` as the concatenation of the children's output.
    pub fn refresh_output(&mut self) {
        let mut output = String::new();
        for child in &self.children {
            output.push_str(&child.output);
        }
        self.output = output;
    }

    /// Drop rendered children and output.
    pub fn clear(&mut self) {
        self.children.clear();
        self.last_render = None;
        self.output.clear();
    }

    /// Number of morphs in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TextMorph::count).sum::<usize>()
    }
}

impl Default for TextMorph {
    fn default() -> Self {
        Self::new()
    }
}

impl Morph for TextMorph {
    fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.is_dirty = dirty;
    }

    fn linked_params(&self) -> Option<&LinkedParams> {
        self.linked_params.as_ref()
    }

    fn set_linked_params(&mut self, linked: LinkedParams) {
        self.linked_params = Some(linked);
    }
}
