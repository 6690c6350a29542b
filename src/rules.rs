//! Rule table
//!
//! One rule per `(role, resource, action)` key. Writing a key again replaces
//! its rule. Lookup is by borrowed key so the read path does not allocate.

use indexmap::{Equivalent, IndexMap};
use tracing::debug;

use crate::condition::Condition;
use crate::types::{Access, AccessKey, WILDCARD};

/// Effect plus optional runtime condition stored at a key
#[derive(Debug, Clone)]
pub struct Rule {
    pub access: Access,
    pub condition: Option<Condition>,
}

#[derive(Hash)]
struct KeyRef<'a> {
    role: &'a str,
    resource: &'a str,
    action: &'a str,
}

impl Equivalent<AccessKey> for KeyRef<'_> {
    fn equivalent(&self, key: &AccessKey) -> bool {
        self.role == key.role && self.resource == key.resource && self.action == key.action
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: IndexMap<AccessKey, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a rule, replacing any previous rule at the same key
    pub fn insert(&mut self, key: AccessKey, rule: Rule) {
        debug!(key = %key, access = %rule.access, conditional = rule.condition.is_some(), "writing rule");
        self.rules.insert(key, rule);
    }

    pub fn get(&self, role: &str, resource: &str, action: &str) -> Option<(&AccessKey, &Rule)> {
        self.rules.get_key_value(&KeyRef {
            role,
            resource,
            action,
        })
    }

    /// Tries `(role, resource, action)`, then `(role, resource, *)`, then `(role, *, *)`
    pub fn lookup_tiers(
        &self,
        role: &str,
        resource: &str,
        action: &str,
    ) -> Option<(&AccessKey, &Rule)> {
        self.get(role, resource, action)
            .or_else(|| self.get(role, resource, WILDCARD))
            .or_else(|| self.get(role, WILDCARD, WILDCARD))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
