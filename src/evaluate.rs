use crate::ast::{Expr, HashPairs};
use crate::env::Environment;
use crate::error::RenderError;
use crate::tree::Morph;
use crate::value::{Hash, Params, Value};

/// Evaluate an expression node. Literals evaluate to themselves.
///
/// Arguments of nested `subexpr`/`concat` nodes are always evaluated: a
/// morph's linked params belong to the statement bound to it, not to the
/// expressions inside that statement's arguments.
pub fn evaluate<E: Environment>(
    expr: &Expr,
    env: &mut E,
    scope: &E::Scope,
) -> Result<Value, RenderError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Get { path } => env.get(scope, path),
        Expr::Subexpr { path, params, hash } => {
            let params = evaluate_each(params, env, scope)?;
            let hash = evaluate_pairs(hash, env, scope)?;
            env.subexpr(scope, path, &params, &hash)
        }
        Expr::Concat { parts } => {
            let parts = evaluate_each(parts, env, scope)?;
            env.concat(&parts)
        }
    }
}

/// Evaluate positional arguments, or return the morph's linked params
/// unchanged when it has any. Cached params are not checked against `nodes`.
pub fn evaluate_params<E: Environment>(
    nodes: &[Expr],
    morph: &E::Morph,
    env: &mut E,
    scope: &E::Scope,
) -> Result<Params, RenderError> {
    if let Some(linked) = morph.linked_params() {
        return Ok(linked.params.clone());
    }
    evaluate_each(nodes, env, scope)
}

/// Evaluate named arguments, or return the morph's linked hash unchanged.
/// Later duplicate keys overwrite earlier ones.
pub fn evaluate_hash<E: Environment>(
    pairs: &HashPairs,
    morph: &E::Morph,
    env: &mut E,
    scope: &E::Scope,
) -> Result<Hash, RenderError> {
    if let Some(linked) = morph.linked_params() {
        return Ok(linked.hash.clone());
    }
    evaluate_pairs(pairs, env, scope)
}

/// Evaluate a statement's arguments and hand them to `link_params`.
///
/// Absent params or hash evaluate to empty. The values evaluated in this
/// call are returned whatever `link_params` stores for the next pass.
pub fn evaluate_params_and_hash<E: Environment>(
    env: &mut E,
    scope: &E::Scope,
    morph: &mut E::Morph,
    path: &str,
    params: Option<&[Expr]>,
    hash: Option<&HashPairs>,
) -> Result<(Params, Hash), RenderError> {
    let evaluated_params = match params {
        Some(nodes) => evaluate_params(nodes, morph, env, scope)?,
        None => Params::new(),
    };
    let evaluated_hash = match hash {
        Some(pairs) => evaluate_hash(pairs, morph, env, scope)?,
        None => Hash::new(),
    };
    env.link_params(scope, morph, path, &evaluated_params, Some(&evaluated_hash))?;
    Ok((evaluated_params, evaluated_hash))
}

fn evaluate_each<E: Environment>(
    nodes: &[Expr],
    env: &mut E,
    scope: &E::Scope,
) -> Result<Params, RenderError> {
    nodes.iter().map(|node| evaluate(node, env, scope)).collect()
}

fn evaluate_pairs<E: Environment>(
    pairs: &HashPairs,
    env: &mut E,
    scope: &E::Scope,
) -> Result<Hash, RenderError> {
    let mut hash = Hash::new();
    for (key, node) in pairs {
        let value = evaluate(node, env, scope)?;
        hash.insert(key.clone(), value);
    }
    Ok(hash)
}
