use crate::ast::*;
use crate::error::DecodeError;
use crate::value::Value;
use serde_json::Value as Json;
use std::rc::Rc;

/// Decode a compiled template from its JSON form.
///
/// A template is `{"statements": [...], "templates": [...]}`; a bare array
/// is accepted as a template with no nested templates. Nodes are arrays
/// tagged by their first element, anything else is a literal.
pub fn template_from_json(input: &str) -> Result<Template, DecodeError> {
    let json: Json = serde_json::from_str(input)
        .map_err(|e| DecodeError::new("invalid-json", e.to_string(), ""))?;
    template_from_value(&json)
}

pub fn template_from_value(json: &Json) -> Result<Template, DecodeError> {
    decode_template(json, "")
}

/// Decode a single node, e.g. `["content", "name"]`.
pub fn node_from_value(json: &Json) -> Result<Node, DecodeError> {
    decode_node(json, "")
}

fn decode_template(json: &Json, loc: &str) -> Result<Template, DecodeError> {
    let (statements, templates) = match json {
        Json::Array(_) => (Some(json), None),
        Json::Object(map) => (map.get("statements"), map.get("templates")),
        _ => {
            return Err(DecodeError::new(
                "invalid-template",
                "Expected a template object or a statement array",
                loc,
            ))
        }
    };

    let statements = match statements {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Array(items)) => {
            let base = if json.is_array() {
                loc.to_string()
            } else {
                format!("{}/statements", loc)
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_node(item, &format!("{}/{}", base, i)))
                .collect::<Result<Vec<Node>, _>>()?
        }
        Some(_) => {
            return Err(DecodeError::new(
                "invalid-template",
                "\"statements\" must be an array",
                &format!("{}/statements", loc),
            ))
        }
    };

    let templates = match templates {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                decode_template(item, &format!("{}/templates/{}", loc, i)).map(Rc::new)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DecodeError::new(
                "invalid-template",
                "\"templates\" must be an array",
                &format!("{}/templates", loc),
            ))
        }
    };

    Ok(Template {
        statements,
        templates,
    })
}

/// Split a tagged tuple into its tag and fields, checking the arity.
fn tagged<'a>(json: &'a Json, loc: &str) -> Result<Option<(&'a str, &'a [Json])>, DecodeError> {
    let items = match json {
        Json::Array(items) => items,
        _ => return Ok(None),
    };
    let tag = match items.first() {
        Some(Json::String(tag)) => tag.as_str(),
        _ => {
            return Err(DecodeError::new(
                "invalid-node",
                "Expected a tag string as the first element",
                loc,
            ))
        }
    };
    let expected = match tag {
        "get" | "concat" | "content" => 2,
        "attribute" => 3,
        "subexpr" | "inline" | "element" | "component" => 4,
        "block" => 6,
        _ => {
            return Err(DecodeError::new(
                "unknown-tag",
                format!("Unknown node tag \"{}\"", tag),
                loc,
            ))
        }
    };
    if items.len() != expected {
        return Err(DecodeError::new(
            "wrong-arity",
            format!(
                "\"{}\" takes {} fields, found {}",
                tag,
                expected - 1,
                items.len() - 1
            ),
            loc,
        ));
    }
    Ok(Some((tag, &items[1..])))
}

fn decode_node(json: &Json, loc: &str) -> Result<Node, DecodeError> {
    let (tag, fields) = match tagged(json, loc)? {
        Some(t) => t,
        None => return Ok(Node::Expr(Expr::Literal(Value::from(json.clone())))),
    };
    let field = |i: usize| format!("{}/{}", loc, i + 1);

    let statement = match tag {
        "get" | "subexpr" | "concat" => return decode_expr(json, loc).map(Node::Expr),
        "block" => Statement::Block(BlockStatement {
            path: decode_path(&fields[0], &field(0))?,
            params: decode_params(&fields[1], &field(1))?,
            hash: decode_hash(&fields[2], &field(2))?,
            template_id: decode_template_id(&fields[3], &field(3))?,
            inverse_id: decode_template_id(&fields[4], &field(4))?,
        }),
        "inline" => Statement::Inline(InlineStatement {
            path: decode_path(&fields[0], &field(0))?,
            params: decode_params(&fields[1], &field(1))?,
            hash: decode_hash(&fields[2], &field(2))?,
        }),
        "content" => Statement::Content(ContentStatement {
            path: decode_path(&fields[0], &field(0))?,
        }),
        "element" => Statement::Element(ElementStatement {
            path: decode_path(&fields[0], &field(0))?,
            params: decode_params(&fields[1], &field(1))?,
            hash: decode_hash(&fields[2], &field(2))?,
        }),
        "attribute" => Statement::Attribute(AttributeStatement {
            name: decode_path(&fields[0], &field(0))?,
            value: decode_expr(&fields[1], &field(1))?,
        }),
        "component" => Statement::Component(ComponentStatement {
            path: decode_path(&fields[0], &field(0))?,
            attrs: decode_hash(&fields[1], &field(1))?,
            template_id: decode_template_id(&fields[2], &field(2))?,
        }),
        _ => {
            return Err(DecodeError::new(
                "unknown-tag",
                format!("Unknown node tag \"{}\"", tag),
                loc,
            ))
        }
    };
    Ok(Node::Statement(statement))
}

fn decode_expr(json: &Json, loc: &str) -> Result<Expr, DecodeError> {
    let (tag, fields) = match tagged(json, loc)? {
        Some(t) => t,
        None => return Ok(Expr::Literal(Value::from(json.clone()))),
    };
    let field = |i: usize| format!("{}/{}", loc, i + 1);

    match tag {
        "get" => Ok(Expr::Get {
            path: decode_path(&fields[0], &field(0))?,
        }),
        "subexpr" => Ok(Expr::Subexpr {
            path: decode_path(&fields[0], &field(0))?,
            params: decode_params(&fields[1], &field(1))?,
            hash: decode_hash(&fields[2], &field(2))?,
        }),
        "concat" => Ok(Expr::Concat {
            parts: decode_params(&fields[0], &field(0))?,
        }),
        _ => Err(DecodeError::new(
            "statement-in-expression",
            format!("\"{}\" cannot be used as an expression", tag),
            loc,
        )),
    }
}

fn decode_path(json: &Json, loc: &str) -> Result<String, DecodeError> {
    match json {
        Json::String(s) => Ok(s.clone()),
        _ => Err(DecodeError::new("invalid-path", "Expected a string", loc)),
    }
}

fn decode_params(json: &Json, loc: &str) -> Result<Vec<Expr>, DecodeError> {
    match json {
        Json::Null => Ok(Vec::new()),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_expr(item, &format!("{}/{}", loc, i)))
            .collect(),
        _ => Err(DecodeError::new(
            "invalid-params",
            "Expected an array of expressions",
            loc,
        )),
    }
}

/// `[key0, value0, key1, value1, ...]`
fn decode_hash(json: &Json, loc: &str) -> Result<HashPairs, DecodeError> {
    let items = match json {
        Json::Null => return Ok(HashPairs::new()),
        Json::Array(items) => items,
        _ => {
            return Err(DecodeError::new(
                "invalid-hash",
                "Expected a flat array of key/value pairs",
                loc,
            ))
        }
    };
    if items.len() % 2 != 0 {
        return Err(DecodeError::new(
            "invalid-hash",
            format!("Hash has an odd number of elements ({})", items.len()),
            loc,
        ));
    }
    let mut pairs = HashPairs::with_capacity(items.len() / 2);
    for (i, pair) in items.chunks(2).enumerate() {
        let key = match &pair[0] {
            Json::String(key) => key.clone(),
            _ => {
                return Err(DecodeError::new(
                    "invalid-hash",
                    "Hash keys must be strings",
                    &format!("{}/{}", loc, i * 2),
                ))
            }
        };
        let value = decode_expr(&pair[1], &format!("{}/{}", loc, i * 2 + 1))?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn decode_template_id(json: &Json, loc: &str) -> Result<Option<usize>, DecodeError> {
    match json {
        Json::Null => Ok(None),
        Json::Number(n) => match n.as_u64() {
            Some(id) => Ok(Some(id as usize)),
            None => Err(DecodeError::new(
                "invalid-template-id",
                format!("Template id must be a non-negative integer, found {}", n),
                loc,
            )),
        },
        _ => Err(DecodeError::new(
            "invalid-template-id",
            "Template id must be an integer or null",
            loc,
        )),
    }
}
