//! Parameter validation against an operation's input shape.

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{OperationShape, ServiceModel, Shape, StructureShape};
use crate::command::{Param, Params};
use crate::error::{Rule, ValidationError, Violation};

/// Checks command parameters against an operation's declared input.
pub trait Validator: Send + Sync {
    /// Validate `params` for `operation`.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    fn validate(
        &self,
        operation: &OperationShape<'_>,
        params: &Params,
    ) -> Result<(), ValidationError>;
}

/// The model-driven validator.
///
/// Checks required members, JSON types, string and collection lengths,
/// numeric ranges, patterns and enums, collecting every violation before
/// failing. Members the model does not declare are ignored. Compiled patterns
/// are cached across calls.
#[derive(Debug, Default)]
pub struct ParamValidator {
    patterns: DashMap<String, Regex>,
}

impl ParamValidator {
    /// A validator with an empty pattern cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&self, pattern: &str) -> Option<Regex> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Some(regex.clone());
        }
        match Regex::new(pattern) {
            Ok(regex) => {
                self.patterns.insert(pattern.to_owned(), regex.clone());
                Some(regex)
            }
            Err(err) => {
                debug!(pattern, error = %err, "skipping uncompilable model pattern");
                None
            }
        }
    }
}

impl Validator for ParamValidator {
    fn validate(
        &self,
        operation: &OperationShape<'_>,
        params: &Params,
    ) -> Result<(), ValidationError> {
        let Some(input) = operation.input() else {
            return Ok(());
        };

        let mut walk = Walk {
            validator: self,
            model: operation.model(),
            violations: Vec::new(),
        };
        for (name, reference) in &input.members {
            match params.get(name) {
                None => walk.check_required(input, name, name),
                Some(param) if param.is_null() => walk.check_required(input, name, name),
                Some(Param::Body(_)) => {
                    let shape = walk.model.shape(&reference.shape);
                    if !matches!(shape, Some(Shape::Blob(_) | Shape::String(_))) {
                        walk.violate(name, Rule::Type {
                            expected: shape.map_or("value", Shape::json_type),
                        });
                    }
                }
                Some(Param::Value(value)) => walk.value(&reference.shape, value, name),
            }
        }

        if walk.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                operation: operation.name().to_owned(),
                violations: walk.violations,
            })
        }
    }
}

struct Walk<'a> {
    validator: &'a ParamValidator,
    model: &'a ServiceModel,
    violations: Vec<Violation>,
}

impl Walk<'_> {
    fn violate(&mut self, path: &str, rule: Rule) {
        self.violations.push(Violation {
            path: path.to_owned(),
            rule,
        });
    }

    fn check_required(&mut self, structure: &StructureShape, member: &str, path: &str) {
        if structure.is_required(member) {
            self.violate(path, Rule::Required);
        }
    }

    fn value(&mut self, shape_name: &str, value: &Value, path: &str) {
        if value.is_null() {
            return;
        }
        let Some(shape) = self.model.shape(shape_name) else {
            debug!(shape = shape_name, "shape missing from model; not validated");
            return;
        };

        match shape {
            Shape::Structure(structure) => {
                let Some(object) = value.as_object() else {
                    return self.violate(path, Rule::Type { expected: "object" });
                };
                for (name, reference) in &structure.members {
                    let child = format!("{path}.{name}");
                    match object.get(name) {
                        None | Some(Value::Null) => self.check_required(structure, name, &child),
                        Some(member) => self.value(&reference.shape, member, &child),
                    }
                }
            }
            Shape::List(list) => {
                let Some(items) = value.as_array() else {
                    return self.violate(path, Rule::Type { expected: "array" });
                };
                self.length(path, "length", items.len(), list.min, list.max);
                for (index, item) in items.iter().enumerate() {
                    self.value(&list.member.shape, item, &format!("{path}[{index}]"));
                }
            }
            Shape::Map(map) => {
                let Some(entries) = value.as_object() else {
                    return self.violate(path, Rule::Type { expected: "object" });
                };
                self.length(path, "size", entries.len(), map.min, map.max);
                for (key, entry) in entries {
                    self.value(&map.value.shape, entry, &format!("{path}[{key}]"));
                }
            }
            Shape::String(string) => {
                let Some(s) = value.as_str() else {
                    return self.violate(path, Rule::Type { expected: "string" });
                };
                self.length(path, "length", s.chars().count(), string.min, string.max);
                if let Some(pattern) = &string.pattern {
                    if self
                        .validator
                        .pattern(pattern)
                        .is_some_and(|regex| !regex.is_match(s))
                    {
                        self.violate(path, Rule::Pattern(pattern.clone()));
                    }
                }
                if let Some(allowed) = &string.allowed {
                    if !allowed.iter().any(|a| a == s) {
                        self.violate(path, Rule::Enum(allowed.clone()));
                    }
                }
            }
            Shape::Integer(number) | Shape::Long(number) => {
                if !(value.is_i64() || value.is_u64()) {
                    return self.violate(path, Rule::Type { expected: "integer" });
                }
                if let Some(actual) = value.as_f64() {
                    self.range(path, actual, number.min, number.max);
                }
            }
            Shape::Float(number) | Shape::Double(number) => {
                let Some(actual) = value.as_f64() else {
                    return self.violate(path, Rule::Type { expected: "number" });
                };
                self.range(path, actual, number.min, number.max);
            }
            Shape::Boolean => {
                if !value.is_boolean() {
                    self.violate(path, Rule::Type { expected: "boolean" });
                }
            }
            Shape::Blob(blob) => {
                let Some(s) = value.as_str() else {
                    return self.violate(path, Rule::Type { expected: "blob" });
                };
                self.length(path, "length", s.len(), blob.min, blob.max);
            }
            Shape::Timestamp => {
                if !(value.is_string() || value.is_number()) {
                    self.violate(path, Rule::Type { expected: "timestamp" });
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn length(
        &mut self,
        path: &str,
        measure: &'static str,
        actual: usize,
        min: Option<u64>,
        max: Option<u64>,
    ) {
        let actual = actual as u64;
        let too_short = min.is_some_and(|min| actual < min);
        let too_long = max.is_some_and(|max| actual > max);
        if too_short || too_long {
            self.violate(path, Rule::Range {
                measure,
                min: min.map(|m| m as f64),
                max: max.map(|m| m as f64),
                actual: actual as f64,
            });
        }
    }

    fn range(&mut self, path: &str, actual: f64, min: Option<f64>, max: Option<f64>) {
        let too_small = min.is_some_and(|min| actual < min);
        let too_large = max.is_some_and(|max| actual > max);
        if too_small || too_large {
            self.violate(path, Rule::Range {
                measure: "value",
                min,
                max,
                actual,
            });
        }
    }
}
