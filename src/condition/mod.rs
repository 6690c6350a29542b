//! Conditional rules
//!
//! A [`Condition`] is a predicate attached to a rule together with an explicit,
//! ordered parameter schema. At check time the binder walks the schema and
//! assembles the arguments: role and resource parameters receive the identity
//! objects of the query, other parameters are looked up by name in the caller's
//! [`Parameters`].
//!
//! ## Example
//!
//! ```rust
//! use authz_acl::{Condition, ValueKind};
//!
//! let under_limit = Condition::new(|args| {
//!     args.f64("amount").is_some_and(|amount| amount < 1000.0)
//! })
//! .param("amount", ValueKind::Number);
//!
//! assert_eq!(under_limit.required_count(), 1);
//! ```

pub mod binder;

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{AclError, Result};
use crate::identity::{ResourceAware, RoleAware};

pub(crate) use binder::{bind_and_evaluate, BindingContext};

/// Expected JSON shape of a value parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Any,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Bool => value.is_boolean(),
            ValueKind::Number => value.is_number(),
            ValueKind::String => value.is_string(),
            ValueKind::Array => value.is_array(),
            ValueKind::Object => value.is_object(),
        }
    }

    pub(crate) fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Any => "any",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Declared kind of a condition parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Receives the role identity object of the query
    Role,
    /// Receives the resource identity object of the query
    Resource,
    /// Receives a caller-supplied value
    Value(ValueKind),
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Role => f.write_str("role"),
            ParamKind::Resource => f.write_str("resource"),
            ParamKind::Value(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionParam {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

type Predicate = dyn Fn(&ConditionArgs) -> bool + Send + Sync;

/// Runtime predicate attached to a rule
///
/// Cloning is cheap; the predicate is shared.
#[derive(Clone)]
pub struct Condition {
    params: Vec<ConditionParam>,
    predicate: Arc<Predicate>,
}

impl Condition {
    /// Creates a condition with no declared parameters
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ConditionArgs) -> bool + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            predicate: Arc::new(predicate),
        }
    }

    /// Declares a required value parameter
    #[must_use]
    pub fn param(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.declare(name, ParamKind::Value(kind), true)
    }

    /// Declares an optional value parameter
    #[must_use]
    pub fn optional_param(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.declare(name, ParamKind::Value(kind), false)
    }

    /// Declares a required parameter bound to the role identity object
    #[must_use]
    pub fn role_param(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Role, true)
    }

    /// Declares a required parameter bound to the resource identity object
    #[must_use]
    pub fn resource_param(self, name: impl Into<String>) -> Self {
        self.declare(name, ParamKind::Resource, true)
    }

    fn declare(mut self, name: impl Into<String>, kind: ParamKind, required: bool) -> Self {
        self.params.push(ConditionParam {
            name: name.into(),
            kind,
            required,
        });
        self
    }

    pub fn params(&self) -> &[ConditionParam] {
        &self.params
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    pub(crate) fn call(&self, args: &ConditionArgs) -> bool {
        (self.predicate)(args)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A caller-supplied or bound argument
#[derive(Clone)]
pub enum Argument {
    Value(Value),
    Role(Arc<dyn RoleAware>),
    Resource(Arc<dyn ResourceAware>),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Argument::Value(value) => ValueKind::describe(value),
            Argument::Role(_) => "role",
            Argument::Resource(_) => "resource",
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Argument::Role(role) => f.debug_tuple("Role").field(&role.role_name()).finish(),
            Argument::Resource(resource) => f
                .debug_tuple("Resource")
                .field(&resource.resource_name())
                .finish(),
        }
    }
}

/// Named bag of values offered to a rule's condition
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    entries: IndexMap<String, Argument>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from a JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                entries: map
                    .into_iter()
                    .map(|(name, value)| (name, Argument::Value(value)))
                    .collect(),
            }),
            other => Err(AclError::InvalidArgument(format!(
                "parameters must be a JSON object, got {}",
                ValueKind::describe(&other)
            ))),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Argument::Value(value.into()));
        self
    }

    #[must_use]
    pub fn with_role(mut self, name: impl Into<String>, role: Arc<dyn RoleAware>) -> Self {
        self.insert(name, Argument::Role(role));
        self
    }

    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, resource: Arc<dyn ResourceAware>) -> Self {
        self.insert(name, Argument::Resource(resource));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        self.entries.insert(name.into(), argument);
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Arguments bound for one condition invocation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ConditionArgs {
    bound: Vec<(String, Argument)>,
}

impl ConditionArgs {
    pub(crate) fn push(&mut self, name: &str, argument: Argument) {
        self.bound.push((name.to_string(), argument));
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.bound
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, argument)| argument)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Argument::as_value)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_i64)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    /// First bound role object
    pub fn role(&self) -> Option<&Arc<dyn RoleAware>> {
        self.bound.iter().find_map(|(_, argument)| match argument {
            Argument::Role(role) => Some(role),
            _ => None,
        })
    }

    /// First bound resource object
    pub fn resource(&self) -> Option<&Arc<dyn ResourceAware>> {
        self.bound.iter().find_map(|(_, argument)| match argument {
            Argument::Resource(resource) => Some(resource),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
