//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::types::Access;

/// Defaults applied when no rule decides a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclConfig {
    /// Result for unknown roles and for queries no rule matches
    #[serde(default)]
    pub default_action: Access,

    /// Result for a conditional rule when the caller bound no arguments
    /// but the condition requires some
    #[serde(default)]
    pub no_arguments_default_action: Access,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            default_action: Access::Deny,
            no_arguments_default_action: Access::Deny,
        }
    }
}
