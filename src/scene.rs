//! Projected scene data: what a usda file turns into before serialization.

use indexmap::IndexMap;
use strum::{Display, EnumString};

/// Properties of a block, in declaration order.
pub type Attributes = IndexMap<String, Value>;

/// Literal value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Declared without `=`.
    Null,
    Bool(bool),
    Int(i64),
    /// Integer literal outside of `i64` range, kept as written.
    BigInt(String),
    Float(f64),
    String(String),
    /// Path reference, angle brackets included (e.g. `</World/Looks>`).
    Reference(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Value::Reference(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Prim specifier.
///
/// Possible options are:
///   def - a concrete, defined prim.
///   over - a speculative override.
///   class - prims from which other prims inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Specifier {
    Def,
    Class,
    Over,
}

/// A projected `def`/`class`/`over` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub specifier: Specifier,
    /// Declared type, absent for typeless prims.
    pub type_name: Option<String>,
    pub name: String,
    pub inherits: Vec<String>,
    pub attributes: Attributes,
    pub children: Vec<Object>,
}

impl Object {
    pub fn new(specifier: Specifier, type_name: Option<String>, name: impl Into<String>) -> Self {
        Self {
            specifier,
            type_name,
            name: name.into(),
            inherits: Vec::new(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Direct child by prim name.
    pub fn child(&self, name: &str) -> Option<&Object> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Root of a projected file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    /// Root level property assignments, not part of the JSON output.
    pub attributes: Attributes,
    pub children: Vec<Object>,
}

/// Result of projecting a single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Property(String, Value),
    Child(Object),
}

/// Splits statements into merged properties and child objects.
///
/// Later assignments to the same key overwrite earlier ones but keep the
/// position of the first.
pub fn partition(statements: impl IntoIterator<Item = Statement>) -> (Attributes, Vec<Object>) {
    let mut attributes = Attributes::new();
    let mut children = Vec::new();

    for statement in statements {
        match statement {
            Statement::Property(key, value) => {
                attributes.insert(key, value);
            }
            Statement::Child(object) => children.push(object),
        }
    }

    (attributes, children)
}
