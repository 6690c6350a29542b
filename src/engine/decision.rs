//! Access decision returned by [`Acl::check`](super::Acl::check)

use serde::{Deserialize, Serialize};

use crate::hooks::ActiveAccess;
use crate::types::{Access, AccessKey};

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A before-check handler aborted the query
    Aborted,
    /// Role is not registered; default action applied
    UnknownRole,
    /// No rule matched for the role or any ancestor; default action applied
    NoMatch,
    /// Matched rule without a condition
    Rule,
    /// Matched rule whose condition ran
    Condition,
    /// Matched conditional rule with no bound arguments; no-arguments default applied
    NoArgumentsDefault,
}

/// Outcome of one access check together with its active context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,

    /// Canonical role, resource and action of the query
    pub active: ActiveAccess,

    pub reason: DecisionReason,

    /// Key of the rule that decided, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_key: Option<AccessKey>,

    /// Static effect of the matched rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_access: Option<Access>,

    /// Whether the matched rule's condition predicate ran
    #[serde(default)]
    pub condition_invoked: bool,

    /// Number of condition parameters the caller was expected to supply
    #[serde(default)]
    pub custom_arguments: usize,
}

impl AccessDecision {
    pub(crate) fn new(active: ActiveAccess, allowed: bool, reason: DecisionReason) -> Self {
        Self {
            allowed,
            active,
            reason,
            matched_key: None,
            matched_access: None,
            condition_invoked: false,
            custom_arguments: 0,
        }
    }

    pub(crate) fn matched(mut self, key: AccessKey, access: Access) -> Self {
        self.matched_key = Some(key);
        self.matched_access = Some(access);
        self
    }

    pub(crate) fn with_condition(mut self, invoked: bool, custom_arguments: usize) -> Self {
        self.condition_invoked = invoked;
        self.custom_arguments = custom_arguments;
        self
    }

    /// Whether the decision came from the configured default action
    pub fn is_default(&self) -> bool {
        matches!(self.reason, DecisionReason::UnknownRole | DecisionReason::NoMatch)
    }
}
