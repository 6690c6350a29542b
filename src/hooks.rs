//! Pre/post check hooks
//!
//! Handlers observe the active query. A before handler may abort the check,
//! which makes `is_allowed` return `false` without consulting any rule.
//! After handlers are observational only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::types::AccessKey;

/// Role, resource and action of the query being evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAccess {
    pub role: String,
    pub resource: String,
    pub action: String,
}

/// Returned by a before-check handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOutcome {
    #[default]
    Continue,
    Abort,
}

pub type BeforeCheck = Arc<dyn Fn(&ActiveAccess) -> HookOutcome + Send + Sync>;
pub type AfterCheck = Arc<dyn Fn(&ActiveAccess, Option<&AccessKey>) + Send + Sync>;

/// Registered handlers, run in registration order
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<BeforeCheck>,
    after: Vec<AfterCheck>,
}

impl Hooks {
    pub fn on_before_check(&mut self, handler: BeforeCheck) {
        self.before.push(handler);
    }

    pub fn on_after_check(&mut self, handler: AfterCheck) {
        self.after.push(handler);
    }

    pub fn has_before(&self) -> bool {
        !self.before.is_empty()
    }

    pub fn has_after(&self) -> bool {
        !self.after.is_empty()
    }

    /// Runs before handlers until one aborts
    pub fn run_before(&self, active: &ActiveAccess) -> HookOutcome {
        for handler in &self.before {
            if handler(active) == HookOutcome::Abort {
                return HookOutcome::Abort;
            }
        }
        HookOutcome::Continue
    }

    pub fn run_after(&self, active: &ActiveAccess, matched: Option<&AccessKey>) {
        for handler in &self.after {
            handler(active, matched);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}
