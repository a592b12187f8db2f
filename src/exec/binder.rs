//! Argument binding — JSON object → ordered argument list.
//!
//! Binding is all-or-nothing: either every declared parameter resolves (from
//! the arguments object, a default, or the cancellation signal) or the whole
//! bind fails with one aggregate report naming every failing parameter. No
//! partial application, and the callable is never invoked on failure.

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::registry::ToolDef;
use crate::schema::{validate, IssueKind, ValidationIssue, ValidationReport};
use crate::types::{Error, Result};

// =============================================================================
// Bound arguments
// =============================================================================

/// One bound argument position.
#[derive(Debug, Clone)]
pub enum Argument {
    /// JSON value taken from the arguments object (or a default).
    Json(Value),
    /// The pipeline's cancellation signal, injected into a cancellation slot.
    Cancel(CancellationToken),
}

/// Ordered argument list matching the declared parameter order exactly.
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    args: Vec<Argument>,
}

impl BoundArgs {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.args.get(index)
    }

    /// JSON value at a position.
    ///
    /// # Errors
    ///
    /// Fails if the position is out of range or holds the cancellation
    /// signal. Both indicate a handler bug, not caller input.
    pub fn json(&self, index: usize) -> Result<&Value> {
        match self.args.get(index) {
            Some(Argument::Json(value)) => Ok(value),
            Some(Argument::Cancel(_)) => Err(Error::execution(format!(
                "argument {} is the cancellation slot",
                index
            ))),
            None => Err(Error::execution(format!(
                "argument {} out of range ({} bound)",
                index,
                self.args.len()
            ))),
        }
    }

    /// Cancellation token at a position.
    pub fn cancel(&self, index: usize) -> Result<CancellationToken> {
        match self.args.get(index) {
            Some(Argument::Cancel(token)) => Ok(token.clone()),
            Some(Argument::Json(_)) => Err(Error::execution(format!(
                "argument {} is not the cancellation slot",
                index
            ))),
            None => Err(Error::execution(format!(
                "argument {} out of range ({} bound)",
                index,
                self.args.len()
            ))),
        }
    }

    /// Deserialize the JSON value at a position into a concrete type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.json(index)?;
        serde_json::from_value(value.clone()).map_err(Error::from)
    }
}

// =============================================================================
// Binding
// =============================================================================

/// Bind a JSON arguments object onto a tool's declared parameter list.
pub fn bind(
    def: &ToolDef,
    arguments: &Map<String, Value>,
    cancel: &CancellationToken,
) -> Result<BoundArgs> {
    let wrap_param = single_wrap_target(def, arguments);

    let mut args = Vec::with_capacity(def.params().len());
    let mut issues: Vec<ValidationIssue> = Vec::new();

    for param in def.params() {
        let spec = param.spec();
        if spec.is_cancellation() {
            args.push(Argument::Cancel(cancel.clone()));
            continue;
        }

        let supplied = if wrap_param == Some(spec.name.as_str()) {
            // The model passed the parameter's object directly.
            Some(Value::Object(arguments.clone()))
        } else {
            arguments.get(&spec.name).cloned()
        };

        let value = match supplied {
            None | Some(Value::Null) => {
                if let Some(default) = &spec.default {
                    default.clone()
                } else if spec.ty.is_optional() {
                    Value::Null
                } else {
                    issues.push(ValidationIssue {
                        parameter: spec.name.clone(),
                        path: spec.name.clone(),
                        message: format!("missing required parameter '{}'", spec.name),
                        kind: IssueKind::Missing,
                    });
                    continue;
                }
            }
            Some(present) => {
                if let Some(schema) = param.schema() {
                    issues.extend(validate(schema, &present, &spec.name, &spec.name));
                }
                present
            }
        };
        args.push(Argument::Json(value));
    }

    if !issues.is_empty() {
        return Err(Error::Validation(ValidationReport::new(issues)));
    }
    Ok(BoundArgs { args })
}

/// Single-parameter wrapping heuristic.
///
/// Applies when exactly one non-cancellation parameter remains, its type is
/// not primitive/simple, and the arguments object has no key matching its
/// name. The whole object is then the value for that parameter.
fn single_wrap_target<'a>(
    def: &'a ToolDef,
    arguments: &Map<String, Value>,
) -> Option<&'a str> {
    let mut data_params = def
        .params()
        .iter()
        .filter(|p| !p.spec().is_cancellation());
    let only = data_params.next()?;
    if data_params.next().is_some() {
        return None;
    }
    let spec = only.spec();
    if spec.ty.is_simple() || arguments.contains_key(&spec.name) {
        return None;
    }
    Some(spec.name.as_str())
}
