//! Projection from the untyped syntax tree to scene data.
//!
//! Every statement becomes either a property or a child object, decided by
//! the rule that produced it. Blocks merge their properties into
//! `attributes` and keep nested blocks as `children`.

use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::{
    scene::{self, Document, Object, Specifier, Statement, Value},
    usda::{
        syntax::{Node, Rule},
        token::Token,
    },
};

/// Projects a tree rooted at [Rule::Start].
///
/// Layer metadata is parsed but not projected.
pub fn project(root: &Node) -> Result<Document> {
    if root.rule != Rule::Start {
        bail!("Expected {} node, got {}", Rule::Start, root.rule);
    }

    let statements = root
        .nodes()
        .filter(|node| node.rule == Rule::Statement)
        .map(statement)
        .collect::<Result<Vec<_>>>()?;

    let (attributes, children) = scene::partition(statements);

    log::debug!(
        "Projected {} root objects and {} root properties",
        children.len(),
        attributes.len()
    );

    Ok(Document { attributes, children })
}

fn statement(node: &Node) -> Result<Statement> {
    let Some(inner) = node.nodes().next() else {
        bail!("Empty {} node", node.rule);
    };

    let statement = match inner.rule {
        Rule::Assignment => assignment(inner)?,
        Rule::Block => Statement::Child(block(inner)?),
        rule => bail!("Unexpected {} node inside of statement", rule),
    };

    Ok(statement)
}

/// `prepend custom uniform type[] key = value` becomes `key: value`.
///
/// Qualifiers, type and array marker don't affect the result.
fn assignment(node: &Node) -> Result<Statement> {
    let key = node
        .tokens()
        .filter_map(|token| token.try_as_name())
        .last()
        .context("Assignment without a property name")?;

    let value = match node.find(Rule::Value) {
        Some(value_node) => value(value_node).with_context(|| format!("Unable to project value of {}", key))?,
        None => Value::Null,
    };

    Ok(Statement::Property(key.to_string(), value))
}

const INHERITS: &str = "inherits";

fn block(node: &Node) -> Result<Object> {
    let mut tokens = node.tokens();

    let specifier = match tokens.next() {
        Some(Token::Def) => Specifier::Def,
        Some(Token::Class) => Specifier::Class,
        Some(Token::Over) => Specifier::Over,
        other => bail!("Unexpected prim specifier: {:?}", other),
    };

    // Only a bare identifier declares a type, quoted ones are dropped.
    let type_name = node.tokens().find_map(|token| token.try_as_name()).map(str::to_string);

    let name = node
        .tokens()
        .filter_map(|token| token.try_as_string())
        .last()
        .context("Prim name expected")?;

    let mut object = Object::new(specifier, type_name, name);

    if let Some(metadata) = node.find(Rule::Metadata) {
        object.inherits = inherits(metadata).with_context(|| format!("Unable to read metadata of {}", name))?;
    }

    let scope = node.find(Rule::Scope).context("Prim body expected")?;
    let statements = scope
        .nodes()
        .map(statement)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Unable to project prim {}", name))?;

    (object.attributes, object.children) = scene::partition(statements);

    Ok(object)
}

/// Inheritance paths from the first `inherits` metadata entry.
///
/// Other keys such as `references` or `specializes` are ignored. An
/// `inherits` value that isn't a reference or a list of references yields
/// nothing.
fn inherits(metadata: &Node) -> Result<Vec<String>> {
    for entry in metadata.nodes().filter(|node| node.rule == Rule::Statement) {
        let Statement::Property(key, value) = statement(entry)? else {
            continue;
        };

        if key != INHERITS {
            continue;
        }

        let paths = reference_paths(&value);
        if paths.is_none() {
            log::debug!("Metadata entry {} doesn't hold inheritance paths, ignoring", key);
        }

        return Ok(paths.unwrap_or_default());
    }

    Ok(Vec::new())
}

fn reference_paths(value: &Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };

    items
        .iter()
        .map(|item| item.as_reference().map(str::to_string))
        .collect()
}

fn value(node: &Node) -> Result<Value> {
    match node.children.first().map(|child| (child.as_token(), child.as_node())) {
        Some((Some(token), _)) => literal(token),
        Some((_, Some(array))) if array.rule == Rule::Array => {
            let items = array.nodes().map(value).collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
        _ => bail!("Malformed {} node", node.rule),
    }
}

fn literal(token: Token) -> Result<Value> {
    let value = match token {
        Token::String(str) => Value::String(str.to_string()),
        Token::Number(number) => number_value(number)?,
        Token::Reference(path) => Value::Reference(path.to_string()),
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
        _ => bail!("Unexpected literal token: {:?}", token),
    };

    Ok(value)
}

/// Numbers with a fraction or exponent are floats, the rest integers.
///
/// Integers too large for `i64` keep their digits.
fn number_value(number: &str) -> Result<Value> {
    if !number.contains(['.', 'e', 'E']) {
        let value = match i64::from_str(number) {
            Ok(int) => Value::Int(int),
            Err(_) => Value::BigInt(number.to_string()),
        };

        return Ok(value);
    }

    let float = f64::from_str(number).with_context(|| format!("Failed to parse number from '{}'", number))?;
    Ok(Value::Float(float))
}
