//! The API model: operations, their HTTP bindings, and input shapes.
//!
//! Models are loaded from the JSON service description format:
//!
//! ```json
//! {
//!   "metadata": {"serviceId": "DynamoDB", "signingName": "dynamodb",
//!                "targetPrefix": "DynamoDB_20120810", "jsonVersion": "1.0",
//!                "protocol": "json"},
//!   "operations": {
//!     "GetItem": {"name": "GetItem", "http": {"method": "POST", "requestUri": "/"},
//!                 "input": {"shape": "GetItemInput"}}
//!   },
//!   "shapes": {"GetItemInput": {"type": "structure", "members": {}}}
//! }
//! ```

mod shape;
mod validator;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

pub use shape::{
    BlobShape, ListShape, MapShape, NumberShape, Shape, ShapeRef, StringShape, StructureShape,
};
pub use validator::{ParamValidator, Validator};

/// Service-wide model metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// Service identifier, e.g. `DynamoDB`.
    pub service_id: String,
    /// Name used in the SigV4 credential scope.
    #[serde(default)]
    pub signing_name: Option<String>,
    /// Prefix of the `X-Amz-Target` header for JSON services.
    #[serde(default)]
    pub target_prefix: Option<String>,
    /// JSON protocol version (`1.0` or `1.1`).
    #[serde(default)]
    pub json_version: Option<String>,
    /// Wire protocol name.
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "json".to_owned()
}

/// HTTP binding of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpBinding {
    /// HTTP method.
    pub method: String,
    /// Request path template.
    pub request_uri: String,
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self {
            method: "POST".to_owned(),
            request_uri: "/".to_owned(),
        }
    }
}

/// One operation entry of the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Operation {
    /// Operation name.
    pub name: String,
    /// HTTP binding.
    #[serde(default)]
    pub http: HttpBinding,
    /// Input shape, if the operation takes parameters.
    #[serde(default)]
    pub input: Option<ShapeRef>,
}

/// A service description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceModel {
    /// Service-wide metadata.
    pub metadata: ServiceMetadata,
    #[serde(default)]
    operations: IndexMap<String, Operation>,
    #[serde(default)]
    shapes: HashMap<String, Shape>,
}

impl ServiceModel {
    /// Parse a model from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid description.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<OperationShape<'_>> {
        self.operations.get(name).map(|operation| OperationShape {
            model: self,
            operation,
        })
    }

    /// Look up a shape by name.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    /// Names of every operation, in model order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// The signing name, falling back to the lowercased service id.
    #[must_use]
    pub fn signing_name(&self) -> String {
        self.metadata
            .signing_name
            .clone()
            .unwrap_or_else(|| self.metadata.service_id.to_lowercase())
    }
}

/// An operation together with the model that defines its shapes.
#[derive(Debug, Clone, Copy)]
pub struct OperationShape<'a> {
    model: &'a ServiceModel,
    operation: &'a Operation,
}

impl<'a> OperationShape<'a> {
    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.operation.name
    }

    /// HTTP binding.
    #[must_use]
    pub fn http(&self) -> &'a HttpBinding {
        &self.operation.http
    }

    /// The model defining this operation.
    #[must_use]
    pub fn model(&self) -> &'a ServiceModel {
        self.model
    }

    /// The input structure; `None` for operations without input or whose
    /// input is not a structure.
    #[must_use]
    pub fn input(&self) -> Option<&'a StructureShape> {
        let input = self.operation.input.as_ref()?;
        match self.model.shape(&input.shape)? {
            Shape::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    /// Whether the input shape declares `member`.
    #[must_use]
    pub fn has_member(&self, member: &str) -> bool {
        self.input().is_some_and(|input| input.has_member(member))
    }

    /// The shape of an input member.
    #[must_use]
    pub fn member_shape(&self, member: &str) -> Option<&'a Shape> {
        let reference = self.input()?.members.get(member)?;
        self.model.shape(&reference.shape)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::storage_model;
    use super::*;

    #[test]
    fn test_should_load_model_from_json() {
        let model = storage_model();
        assert_eq!(model.metadata.service_id, "Storage");
        assert_eq!(model.signing_name(), "storage");
        assert_eq!(
            model.operation_names().collect::<Vec<_>>(),
            ["PutObject", "ListObjects", "TagObject", "Ping"]
        );
    }

    #[test]
    fn test_should_answer_member_queries() {
        let model = storage_model();
        let put = model.operation("PutObject").unwrap();
        assert_eq!(put.name(), "PutObject");
        assert_eq!(put.http().method, "PUT");
        assert!(put.has_member("Body"));
        assert!(!put.has_member("SourceFile"));
        assert!(matches!(put.member_shape("Body"), Some(Shape::Blob(_))));

        let ping = model.operation("Ping").unwrap();
        assert_eq!(ping.http(), &HttpBinding::default());
        assert!(ping.input().is_none());
        assert!(!ping.has_member("Body"));

        assert!(model.operation("DeleteObject").is_none());
    }
}
