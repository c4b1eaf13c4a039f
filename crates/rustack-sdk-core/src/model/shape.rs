//! Shape definitions of a JSON service model.

use indexmap::IndexMap;
use serde::Deserialize;

/// A reference to a named shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShapeRef {
    /// Name of the referenced shape.
    pub shape: String,
}

/// A shape in the service model, tagged by its `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// An object with named members.
    Structure(StructureShape),
    /// An ordered sequence of one member shape.
    List(ListShape),
    /// A string-keyed map.
    Map(MapShape),
    /// A string, optionally constrained.
    String(StringShape),
    /// A 32-bit integer.
    Integer(NumberShape),
    /// A 64-bit integer.
    Long(NumberShape),
    /// A single-precision float.
    Float(NumberShape),
    /// A double-precision float.
    Double(NumberShape),
    /// A boolean.
    Boolean,
    /// Binary data, sent base64-encoded or as a payload.
    Blob(BlobShape),
    /// A point in time, as an ISO-8601 string or epoch seconds.
    Timestamp,
}

impl Shape {
    /// Short name of the JSON type this shape accepts.
    #[must_use]
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::Structure(_) | Self::Map(_) => "object",
            Self::List(_) => "array",
            Self::String(_) => "string",
            Self::Integer(_) | Self::Long(_) => "integer",
            Self::Float(_) | Self::Double(_) => "number",
            Self::Boolean => "boolean",
            Self::Blob(_) => "blob",
            Self::Timestamp => "timestamp",
        }
    }
}

/// Members of a structure, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructureShape {
    /// Member names that must be present and non-null.
    #[serde(default)]
    pub required: Vec<String>,
    /// Member name to shape reference.
    #[serde(default)]
    pub members: IndexMap<String, ShapeRef>,
}

impl StructureShape {
    /// Whether the structure declares `name`.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Whether `name` is required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// A list and its length bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListShape {
    /// Shape of each element.
    pub member: ShapeRef,
    /// Minimum number of elements.
    pub min: Option<u64>,
    /// Maximum number of elements.
    pub max: Option<u64>,
}

/// A map and its size bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapShape {
    /// Shape of the keys (always strings on the wire).
    pub key: ShapeRef,
    /// Shape of the values.
    pub value: ShapeRef,
    /// Minimum number of entries.
    pub min: Option<u64>,
    /// Maximum number of entries.
    pub max: Option<u64>,
}

/// String constraints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StringShape {
    /// Minimum length in characters.
    pub min: Option<u64>,
    /// Maximum length in characters.
    pub max: Option<u64>,
    /// Regular expression the value must match somewhere.
    pub pattern: Option<String>,
    /// The allowed values.
    #[serde(rename = "enum")]
    pub allowed: Option<Vec<String>>,
}

/// Numeric bounds, inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NumberShape {
    /// Smallest allowed value.
    pub min: Option<f64>,
    /// Largest allowed value.
    pub max: Option<f64>,
}

/// Blob length bounds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlobShape {
    /// Minimum length in bytes.
    pub min: Option<u64>,
    /// Maximum length in bytes.
    pub max: Option<u64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_deserialize_tagged_shapes() {
        let shape: Shape = serde_json::from_value(json!({
            "type": "structure",
            "required": ["TableName"],
            "members": {
                "TableName": {"shape": "TableName"},
                "Limit": {"shape": "PositiveInteger"}
            }
        }))
        .unwrap();

        let Shape::Structure(structure) = shape else {
            panic!("expected a structure");
        };
        assert!(structure.has_member("Limit"));
        assert!(structure.is_required("TableName"));
        assert!(!structure.is_required("Limit"));
        assert_eq!(
            structure.members.keys().collect::<Vec<_>>(),
            ["TableName", "Limit"]
        );
    }

    #[test]
    fn test_should_deserialize_constraints() {
        let shape: Shape = serde_json::from_value(json!({
            "type": "string",
            "min": 3,
            "max": 255,
            "pattern": "[a-zA-Z0-9_.-]+",
            "enum": ["A", "B"]
        }))
        .unwrap();
        assert_eq!(
            shape,
            Shape::String(StringShape {
                min: Some(3),
                max: Some(255),
                pattern: Some("[a-zA-Z0-9_.-]+".to_owned()),
                allowed: Some(vec!["A".to_owned(), "B".to_owned()]),
            })
        );

        let boolean: Shape = serde_json::from_value(json!({"type": "boolean"})).unwrap();
        assert_eq!(boolean.json_type(), "boolean");
    }
}
