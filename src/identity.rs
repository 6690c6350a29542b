//! Role and resource identities
//!
//! Callers may refer to a role or resource either by plain name or through an
//! object that carries its own name. Both forms are normalized once, at the API
//! boundary, into a canonical string key; internal structures store strings only.
//! The object form is kept alongside so conditions can receive it as an argument.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Capability of an object that acts as a role
pub trait RoleAware: Send + Sync {
    /// Canonical role name
    fn role_name(&self) -> &str;

    /// Optional human readable description
    fn role_description(&self) -> Option<&str> {
        None
    }
}

/// Capability of an object that acts as a resource
pub trait ResourceAware: Send + Sync {
    /// Canonical resource name
    fn resource_name(&self) -> &str;

    /// Optional human readable description
    fn resource_description(&self) -> Option<&str> {
        None
    }
}

/// A registered role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl RoleAware for Role {
    fn role_name(&self) -> &str {
        &self.name
    }

    fn role_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A registered resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ResourceAware for Resource {
    fn resource_name(&self) -> &str {
        &self.name
    }

    fn resource_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Reference to a role: a plain name or a role-capable object
#[derive(Clone)]
pub enum RoleRef {
    Named(String),
    Capability(Arc<dyn RoleAware>),
}

impl RoleRef {
    /// Canonical key
    pub fn name(&self) -> &str {
        match self {
            RoleRef::Named(name) => name,
            RoleRef::Capability(handle) => handle.role_name(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            RoleRef::Named(_) => None,
            RoleRef::Capability(handle) => handle.role_description(),
        }
    }

    /// Object handle, if the role was supplied as one
    pub fn handle(&self) -> Option<&Arc<dyn RoleAware>> {
        match self {
            RoleRef::Named(_) => None,
            RoleRef::Capability(handle) => Some(handle),
        }
    }

    pub fn capability(handle: Arc<dyn RoleAware>) -> Self {
        RoleRef::Capability(handle)
    }

    pub(crate) fn to_role(&self) -> Role {
        Role {
            name: self.name().to_string(),
            description: self.description().map(str::to_string),
        }
    }
}

impl fmt::Debug for RoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            RoleRef::Capability(handle) => f.debug_tuple("Capability").field(&handle.role_name()).finish(),
        }
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Named(name.to_string())
    }
}

impl From<String> for RoleRef {
    fn from(name: String) -> Self {
        RoleRef::Named(name)
    }
}

impl From<&String> for RoleRef {
    fn from(name: &String) -> Self {
        RoleRef::Named(name.clone())
    }
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        RoleRef::Capability(Arc::new(role))
    }
}

impl<T: RoleAware + 'static> From<Arc<T>> for RoleRef {
    fn from(handle: Arc<T>) -> Self {
        RoleRef::Capability(handle)
    }
}

/// Reference to a resource: a plain name or a resource-capable object
#[derive(Clone)]
pub enum ResourceRef {
    Named(String),
    Capability(Arc<dyn ResourceAware>),
}

impl ResourceRef {
    /// Canonical key
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::Named(name) => name,
            ResourceRef::Capability(handle) => handle.resource_name(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ResourceRef::Named(_) => None,
            ResourceRef::Capability(handle) => handle.resource_description(),
        }
    }

    /// Object handle, if the resource was supplied as one
    pub fn handle(&self) -> Option<&Arc<dyn ResourceAware>> {
        match self {
            ResourceRef::Named(_) => None,
            ResourceRef::Capability(handle) => Some(handle),
        }
    }

    pub fn capability(handle: Arc<dyn ResourceAware>) -> Self {
        ResourceRef::Capability(handle)
    }

    pub(crate) fn to_resource(&self) -> Resource {
        Resource {
            name: self.name().to_string(),
            description: self.description().map(str::to_string),
        }
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ResourceRef::Capability(handle) => f
                .debug_tuple("Capability")
                .field(&handle.resource_name())
                .finish(),
        }
    }
}

impl From<&str> for ResourceRef {
    fn from(name: &str) -> Self {
        ResourceRef::Named(name.to_string())
    }
}

impl From<String> for ResourceRef {
    fn from(name: String) -> Self {
        ResourceRef::Named(name)
    }
}

impl From<&String> for ResourceRef {
    fn from(name: &String) -> Self {
        ResourceRef::Named(name.clone())
    }
}

impl From<Resource> for ResourceRef {
    fn from(resource: Resource) -> Self {
        ResourceRef::Capability(Arc::new(resource))
    }
}

impl<T: ResourceAware + 'static> From<Arc<T>> for ResourceRef {
    fn from(handle: Arc<T>) -> Self {
        ResourceRef::Capability(handle)
    }
}
