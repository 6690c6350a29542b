//! Role and resource registries
//!
//! Holds the known role names, resource names and the set of valid actions per
//! resource. Insertion order is preserved so listings and wildcard-role
//! expansion are deterministic.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::error::{AclError, Result};
use crate::identity::{Resource, Role};
use crate::types::{Names, WILDCARD};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    roles: IndexMap<String, Role>,
    resources: IndexMap<String, Resource>,
    actions: IndexMap<String, IndexSet<String>>,
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AclError::InvalidArgument(format!("{} name cannot be empty", kind)));
    }
    if name == WILDCARD {
        return Err(AclError::InvalidArgument(format!(
            "{} name cannot be '{}'",
            kind, WILDCARD
        )));
    }
    Ok(())
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a role. Returns `false` if it already exists.
    pub fn add_role(&mut self, role: Role) -> Result<bool> {
        validate_name("Role", &role.name)?;

        if self.roles.contains_key(&role.name) {
            debug!(role = %role.name, "role already registered");
            return Ok(false);
        }

        info!(role = %role.name, "registering role");
        self.roles.insert(role.name.clone(), role);
        Ok(true)
    }

    /// Registers a resource. Returns `false` if it already exists.
    pub fn add_resource(&mut self, resource: Resource) -> Result<bool> {
        validate_name("Resource", &resource.name)?;

        if self.resources.contains_key(&resource.name) {
            return Ok(false);
        }

        info!(resource = %resource.name, "registering resource");
        self.actions.insert(resource.name.clone(), IndexSet::new());
        self.resources.insert(resource.name.clone(), resource);
        Ok(true)
    }

    /// Adds actions to a registered resource. Already present actions are kept as is.
    pub fn add_resource_access(&mut self, resource: &str, actions: &Names) -> Result<bool> {
        let actions = actions.validated("Access list")?;

        let Some(valid) = self.actions.get_mut(resource) else {
            if resource == WILDCARD {
                return Err(AclError::InvalidArgument(format!(
                    "Resource '{}' only accepts the '{}' action",
                    WILDCARD, WILDCARD
                )));
            }
            return Err(AclError::unknown_resource(resource));
        };

        for action in actions {
            if valid.insert(action.clone()) {
                debug!(resource, action = %action, "registered resource access");
            }
        }
        Ok(true)
    }

    /// Removes actions from a resource. Missing entries are ignored.
    pub fn drop_resource_access(&mut self, resource: &str, actions: &Names) {
        let Some(valid) = self.actions.get_mut(resource) else {
            return;
        };

        for action in actions.iter() {
            if valid.shift_remove(action) {
                debug!(resource, action, "dropped resource access");
            }
        }
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn is_resource_access(&self, resource: &str, action: &str) -> bool {
        self.actions
            .get(resource)
            .is_some_and(|valid| valid.contains(action))
    }

    /// Fails unless the role is registered
    pub fn require_role(&self, name: &str) -> Result<()> {
        if self.is_role(name) {
            Ok(())
        } else {
            Err(AclError::unknown_role(name))
        }
    }

    /// Fails unless the resource is registered or is the wildcard pseudo-resource
    pub fn require_resource(&self, name: &str) -> Result<()> {
        if name == WILDCARD || self.is_resource(name) {
            Ok(())
        } else {
            Err(AclError::unknown_resource(name))
        }
    }

    /// Fails unless `action` is the wildcard or a registered action of `resource`
    pub fn require_action(&self, resource: &str, action: &str) -> Result<()> {
        if action == WILDCARD || self.is_resource_access(resource, action) {
            Ok(())
        } else {
            Err(AclError::UnknownAction {
                resource: resource.to_string(),
                action: action.to_string(),
            })
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Registered actions of a resource, in registration order
    pub fn resource_actions(&self, resource: &str) -> Vec<String> {
        self.actions
            .get(resource)
            .map(|valid| valid.iter().cloned().collect())
            .unwrap_or_default()
    }
}
