//! ACL engine
//!
//! Orchestrates the registry, inheritance graph, rule table and condition
//! binder behind a reader-writer lock.
//!
//! # Architecture
//!
//! ```text
//! is_allowed → identity → before hooks → registry → rule tiers (role, then ancestors) → after hooks → condition
//! allow/deny → registry checks → rule table
//! add_inherit → registry checks → inheritance graph (cycle check) → ancestor cache reset
//! ```
//!
//! Mutators take the write lock; queries take the read lock. Hooks and
//! conditions run after the state lock is released.

pub mod decision;

pub use decision::{AccessDecision, DecisionReason};

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::condition::{bind_and_evaluate, BindingContext, Condition, Parameters};
use crate::config::AclConfig;
use crate::error::{AclError, Result};
use crate::graph::{EdgeInsert, InheritanceGraph};
use crate::hooks::{ActiveAccess, HookOutcome, Hooks};
use crate::identity::{Resource, ResourceRef, Role, RoleRef};
use crate::registry::Registry;
use crate::rules::{Rule, RuleTable};
use crate::types::{Access, AccessKey, Names, WILDCARD};

#[derive(Debug, Default)]
struct AclState {
    registry: Registry,
    graph: InheritanceGraph,
    rules: RuleTable,
    config: AclConfig,
}

/// In-memory access control list
///
/// # Examples
///
/// ```rust
/// use authz_acl::Acl;
///
/// # fn example() -> authz_acl::Result<()> {
/// let acl = Acl::new();
/// acl.add_role("users", None)?;
/// acl.add_role("guests", None)?;
/// acl.add_resource("invoices", ["index", "profile"])?;
///
/// acl.allow("users", "invoices", "index", None)?;
///
/// assert!(acl.is_allowed("users", "invoices", "index", None)?);
/// assert!(!acl.is_allowed("guests", "invoices", "index", None)?);
/// assert!(!acl.is_allowed("users", "invoices", "profile", None)?);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct Acl {
    state: RwLock<AclState>,
    hooks: RwLock<Hooks>,
    /// role -> breadth-first ancestors; reset on every new inheritance edge
    ancestor_cache: DashMap<String, Arc<[String]>>,
}

impl Acl {
    /// Creates an engine denying everything by default
    pub fn new() -> Self {
        Self::with_config(AclConfig::default())
    }

    pub fn with_config(config: AclConfig) -> Self {
        Self {
            state: RwLock::new(AclState {
                config,
                ..AclState::default()
            }),
            hooks: RwLock::new(Hooks::default()),
            ancestor_cache: DashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn set_default_action(&self, access: Access) {
        self.state.write().config.default_action = access;
    }

    pub fn get_default_action(&self) -> Access {
        self.state.read().config.default_action
    }

    pub fn set_no_arguments_default_action(&self, access: Access) {
        self.state.write().config.no_arguments_default_action = access;
    }

    pub fn get_no_arguments_default_action(&self) -> Access {
        self.state.read().config.no_arguments_default_action
    }

    pub fn config(&self) -> AclConfig {
        self.state.read().config
    }

    // ------------------------------------------------------------------
    // Roles and inheritance
    // ------------------------------------------------------------------

    /// Registers a role, optionally inheriting from existing roles
    ///
    /// Returns `Ok(false)` if the role already exists. Parents other than
    /// the role itself are checked before the role is registered, so an
    /// unknown parent leaves the engine unchanged. Listing the new role as
    /// its own parent registers it and returns `Ok(false)`, like
    /// [`add_inherit`](Self::add_inherit) does.
    pub fn add_role(&self, role: impl Into<RoleRef>, inherits: Option<Names>) -> Result<bool> {
        let role = role.into();
        let mut state = self.state.write();

        if state.registry.is_role(role.name()) {
            debug!(role = role.name(), "role already registered");
            return Ok(false);
        }

        if let Some(parents) = &inherits {
            for parent in parents.validated("Inherited roles")? {
                if parent != role.name() {
                    state.registry.require_role(parent)?;
                }
            }
        }

        state.registry.add_role(role.to_role())?;

        match inherits {
            Some(parents) => self.inherit(&mut state, role.name(), &parents),
            None => Ok(true),
        }
    }

    /// Makes `role` inherit the rules of each parent, in order
    ///
    /// Parents are processed one at a time and edges already written stay in
    /// place. Reaching `role` itself in the list returns `Ok(false)`; a parent
    /// that would make `role` its own ancestor fails with `InheritanceCycle`.
    pub fn add_inherit(&self, role: &str, parents: impl Into<Names>) -> Result<bool> {
        let parents = parents.into();
        let mut state = self.state.write();
        self.inherit(&mut state, role, &parents)
    }

    fn inherit(&self, state: &mut AclState, role: &str, parents: &Names) -> Result<bool> {
        state.registry.require_role(role)?;

        for parent in parents.validated("Inherited roles")? {
            state.registry.require_role(parent)?;
            if parent == role {
                debug!(role, "ignoring self inheritance");
                return Ok(false);
            }

            match state.graph.insert_edge(role, parent) {
                EdgeInsert::Added => {
                    info!(role, parent = %parent, "role inherits");
                    self.ancestor_cache.clear();
                }
                EdgeInsert::Exists => continue,
                EdgeInsert::Cycle => {
                    return Err(AclError::InheritanceCycle {
                        role: role.to_string(),
                        parent: parent.to_string(),
                    })
                }
            }
        }

        Ok(true)
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.state.read().registry.is_role(name)
    }

    pub fn get_roles(&self) -> Vec<Role> {
        self.state.read().registry.roles().cloned().collect()
    }

    /// Direct parents of a role, in the order they were added
    pub fn get_inherited_roles(&self, role: &str) -> Vec<String> {
        self.state.read().graph.direct_parents(role)
    }

    /// Every ancestor of a role in the breadth-first order used for rule precedence
    pub fn ancestors(&self, role: &str) -> Vec<String> {
        let state = self.state.read();
        if !state.registry.is_role(role) {
            return Vec::new();
        }
        self.cached_ancestors(&state.graph, role).to_vec()
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// Registers a resource if new and adds the given actions to it
    pub fn add_resource(&self, resource: impl Into<ResourceRef>, actions: impl Into<Names>) -> Result<bool> {
        let resource = resource.into();
        let actions = actions.into();
        let mut state = self.state.write();

        actions.validated("Access list")?;
        state.registry.add_resource(resource.to_resource())?;
        state.registry.add_resource_access(resource.name(), &actions)
    }

    pub fn add_resource_access(&self, resource: &str, actions: impl Into<Names>) -> Result<bool> {
        let actions = actions.into();
        self.state.write().registry.add_resource_access(resource, &actions)
    }

    /// Removes actions from a resource's valid set
    ///
    /// Rules already written for those actions are left in place.
    pub fn drop_resource_access(&self, resource: &str, actions: impl Into<Names>) {
        let actions = actions.into();
        self.state.write().registry.drop_resource_access(resource, &actions);
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.state.read().registry.is_resource(name)
    }

    pub fn is_resource_access(&self, resource: &str, action: &str) -> bool {
        self.state.read().registry.is_resource_access(resource, action)
    }

    pub fn get_resources(&self) -> Vec<Resource> {
        self.state.read().registry.resources().cloned().collect()
    }

    pub fn get_resource_actions(&self, resource: &str) -> Vec<String> {
        self.state.read().registry.resource_actions(resource)
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Grants `actions` on `resource` to `role`
    ///
    /// `role` may be `*` to apply to every role registered at call time.
    pub fn allow(
        &self,
        role: &str,
        resource: &str,
        actions: impl Into<Names>,
        condition: Option<Condition>,
    ) -> Result<()> {
        self.apply(role, resource, actions.into(), Access::Allow, condition)
    }

    /// Refuses `actions` on `resource` to `role`
    ///
    /// `role` may be `*` to apply to every role registered at call time.
    pub fn deny(
        &self,
        role: &str,
        resource: &str,
        actions: impl Into<Names>,
        condition: Option<Condition>,
    ) -> Result<()> {
        self.apply(role, resource, actions.into(), Access::Deny, condition)
    }

    fn apply(
        &self,
        role: &str,
        resource: &str,
        actions: Names,
        access: Access,
        condition: Option<Condition>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let state = &mut *state;
        let actions = actions.validated("Access list")?;

        let roles: Vec<String> = if role == WILDCARD {
            state.registry.role_names().map(str::to_string).collect()
        } else {
            vec![role.to_string()]
        };

        for role in &roles {
            state.registry.require_role(role)?;
        }
        state.registry.require_resource(resource)?;
        for action in actions {
            state.registry.require_action(resource, action)?;
        }

        for role in &roles {
            for action in actions {
                state.rules.insert(
                    AccessKey::new(role.as_str(), resource, action.as_str()),
                    Rule {
                        access,
                        condition: condition.clone(),
                    },
                );
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------

    /// Registers a handler run before every check; `HookOutcome::Abort` denies the query
    pub fn on_before_check<F>(&self, handler: F)
    where
        F: Fn(&ActiveAccess) -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.write().on_before_check(Arc::new(handler));
    }

    /// Registers a handler run after rule lookup with the matched key, if any
    pub fn on_after_check<F>(&self, handler: F)
    where
        F: Fn(&ActiveAccess, Option<&AccessKey>) + Send + Sync + 'static,
    {
        self.hooks.write().on_after_check(Arc::new(handler));
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Answers whether `role` may perform `action` on `resource`
    ///
    /// Unknown roles, resources and actions resolve to the default action.
    /// Errors come only from binding a matched rule's condition.
    pub fn is_allowed(
        &self,
        role: impl Into<RoleRef>,
        resource: impl Into<ResourceRef>,
        action: &str,
        parameters: Option<&Parameters>,
    ) -> Result<bool> {
        Ok(self.check(role, resource, action, parameters)?.allowed)
    }

    /// Same as [`is_allowed`](Self::is_allowed) but returns the full decision
    pub fn check(
        &self,
        role: impl Into<RoleRef>,
        resource: impl Into<ResourceRef>,
        action: &str,
        parameters: Option<&Parameters>,
    ) -> Result<AccessDecision> {
        let role = role.into();
        let resource = resource.into();
        let active = ActiveAccess {
            role: role.name().to_string(),
            resource: resource.name().to_string(),
            action: action.to_string(),
        };

        let hooks = {
            let hooks = self.hooks.read();
            (hooks.has_before() || hooks.has_after()).then(|| hooks.clone())
        };

        if let Some(hooks) = &hooks {
            if hooks.run_before(&active) == HookOutcome::Abort {
                debug!(role = %active.role, resource = %active.resource, action, "check aborted by hook");
                return Ok(AccessDecision::new(active, false, DecisionReason::Aborted));
            }
        }

        let (matched, config) = {
            let state = self.state.read();
            let config = state.config;

            if !state.registry.is_role(&active.role) {
                debug!(role = %active.role, "unknown role; applying default action");
                return Ok(AccessDecision::new(
                    active,
                    config.default_action.is_allow(),
                    DecisionReason::UnknownRole,
                ));
            }

            (self.resolve(&state, &active), config)
        };

        if let Some(hooks) = &hooks {
            hooks.run_after(&active, matched.as_ref().map(|(key, _)| key));
        }

        let Some((key, rule)) = matched else {
            debug!(role = %active.role, resource = %active.resource, action, "no rule matched; applying default action");
            let allowed = config.default_action.is_allow();
            return Ok(AccessDecision::new(active, allowed, DecisionReason::NoMatch));
        };

        debug!(key = %key, access = %rule.access, "rule matched");

        let Some(condition) = &rule.condition else {
            return Ok(AccessDecision::new(active, rule.access.is_allow(), DecisionReason::Rule)
                .matched(key, rule.access));
        };

        let ctx = BindingContext {
            role: &role,
            resource: &resource,
            action,
            parameters,
            no_arguments_default: config.no_arguments_default_action,
        };
        let evaluation = bind_and_evaluate(condition, rule.access, &ctx)?;
        let reason = if evaluation.used_default {
            DecisionReason::NoArgumentsDefault
        } else {
            DecisionReason::Condition
        };

        Ok(AccessDecision::new(active, evaluation.granted, reason)
            .matched(key, rule.access)
            .with_condition(evaluation.invoked, evaluation.custom_arguments))
    }

    /// Tiered lookup for the role, then for each ancestor breadth-first
    fn resolve(&self, state: &AclState, active: &ActiveAccess) -> Option<(AccessKey, Rule)> {
        let rules = &state.rules;
        let (resource, action) = (active.resource.as_str(), active.action.as_str());

        if let Some((key, rule)) = rules.lookup_tiers(&active.role, resource, action) {
            return Some((key.clone(), rule.clone()));
        }

        let ancestors = self.cached_ancestors(&state.graph, &active.role);
        for ancestor in ancestors.iter() {
            if let Some((key, rule)) = rules.lookup_tiers(ancestor, resource, action) {
                debug!(role = %active.role, ancestor = %ancestor, "rule inherited");
                return Some((key.clone(), rule.clone()));
            }
        }

        None
    }

    /// Must be called with the state lock held so fills never race an edge
    /// insert, and only for registered roles
    fn cached_ancestors(&self, graph: &InheritanceGraph, role: &str) -> Arc<[String]> {
        if let Some(hit) = self.ancestor_cache.get(role) {
            return Arc::clone(hit.value());
        }

        let ancestors: Arc<[String]> = graph.ancestors(role).into();
        self.ancestor_cache
            .insert(role.to_string(), Arc::clone(&ancestors));
        ancestors
    }
}

impl Default for Acl {
    fn default() -> Self {
        Self::new()
    }
}
