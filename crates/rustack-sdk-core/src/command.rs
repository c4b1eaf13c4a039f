//! Commands: a named operation plus its parameters.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::body::Body;

/// A single command parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A JSON-representable value.
    Value(Value),
    /// A payload, typically bound to the operation's streaming member.
    Body(Body),
}

impl Param {
    /// The JSON value, if this is not a payload.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Body(_) => None,
        }
    }

    /// The payload, if this is one.
    #[must_use]
    pub fn as_body(&self) -> Option<&Body> {
        match self {
            Self::Body(b) => Some(b),
            Self::Value(_) => None,
        }
    }

    /// The string value, if this is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Whether this is a JSON `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Body> for Param {
    fn from(b: Body) -> Self {
        Self::Body(b)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_owned()))
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

/// Ordered command parameters.
///
/// Iteration follows insertion order. Overwriting a key keeps its original
/// position; removing a key keeps the relative order of the others.
pub type Params = IndexMap<String, Param>;

/// A named operation and its mutable parameter bag.
///
/// The name is fixed at construction. Parameters may be changed by any
/// middleware that runs before the request is built.
#[derive(Clone, PartialEq)]
pub struct Command {
    name: String,
    params: Params,
}

impl Command {
    /// A command with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    /// A command with the given parameters.
    pub fn with_params(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// A command whose parameters are the members of a JSON object.
    ///
    /// Non-object values produce a command without parameters.
    pub fn from_json(name: impl Into<String>, value: Value) -> Self {
        let params = match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, Param::Value(v))).collect(),
            _ => Params::new(),
        };
        Self::with_params(name, params)
    }

    /// Builder-style parameter insertion.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.set(key, value);
        self
    }

    /// The operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.params.get(key)
    }

    /// Look up a JSON parameter.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Param::as_value)
    }

    /// Whether a parameter is present (even if null).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Set a parameter, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Param>) -> Option<Param> {
        self.params.insert(key.into(), value.into())
    }

    /// Remove a parameter, returning it.
    pub fn remove(&mut self, key: &str) -> Option<Param> {
        self.params.shift_remove(key)
    }

    /// All parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Mutable access to all parameters.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Iterate over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish()
    }
}
