//! Core value types shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AclError, Result};

/// Wildcard token accepted in the resource and action slots of a rule
pub const WILDCARD: &str = "*";

/// Effect of a rule or of a default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Access {
    /// Grant the action
    Allow,
    /// Refuse the action
    #[default]
    Deny,
}

impl Access {
    pub fn is_allow(self) -> bool {
        self == Access::Allow
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Allow => f.write_str("ALLOW"),
            Access::Deny => f.write_str("DENY"),
        }
    }
}

/// Composite rule key
///
/// `resource` and `action` may each independently be [`WILDCARD`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl AccessKey {
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}!{}", self.role, self.resource, self.action)
    }
}

/// One name or an ordered set of names
///
/// Used wherever a call accepts either a single role/action or several.
/// Duplicates are kept in first-seen order and collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Names(Vec<String>);

impl Names {
    /// Returns the names, rejecting an empty set or an empty entry
    pub fn validated(&self, what: &str) -> Result<&[String]> {
        if self.0.is_empty() {
            return Err(AclError::InvalidArgument(format!(
                "{} must be a name or a non-empty set of names",
                what
            )));
        }
        if self.0.iter().any(|n| n.is_empty()) {
            return Err(AclError::InvalidArgument(format!(
                "{} contains an empty name",
                what
            )));
        }
        Ok(&self.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn collect<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for item in items {
            let name = item.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Names(names)
    }
}

impl From<&str> for Names {
    fn from(name: &str) -> Self {
        Names(vec![name.to_string()])
    }
}

impl From<String> for Names {
    fn from(name: String) -> Self {
        Names(vec![name])
    }
}

impl From<&String> for Names {
    fn from(name: &String) -> Self {
        Names(vec![name.clone()])
    }
}

impl From<Vec<String>> for Names {
    fn from(names: Vec<String>) -> Self {
        Names::collect(names)
    }
}

impl From<Vec<&str>> for Names {
    fn from(names: Vec<&str>) -> Self {
        Names::collect(names)
    }
}

impl From<&[&str]> for Names {
    fn from(names: &[&str]) -> Self {
        Names::collect(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Names {
    fn from(names: [&str; N]) -> Self {
        Names::collect(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_serde() {
        assert_eq!(serde_json::to_string(&Access::Allow).unwrap(), "\"ALLOW\"");
        let parsed: Access = serde_json::from_str("\"DENY\"").unwrap();
        assert_eq!(parsed, Access::Deny);
        assert_eq!(Access::default(), Access::Deny);
    }

    #[test]
    fn test_access_key_display() {
        let key = AccessKey::new("users", "invoices", WILDCARD);
        assert_eq!(key.to_string(), "users!invoices!*");
    }

    #[test]
    fn test_names_dedup_preserves_order() {
        let names = Names::from(vec!["index", "profile", "index"]);
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["index", "profile"]);
    }

    #[test]
    fn test_names_validation() {
        assert!(Names::from(Vec::<String>::new()).validated("actions").is_err());
        assert!(Names::from(["index", ""]).validated("actions").is_err());
        assert_eq!(Names::from("index").validated("actions").unwrap().len(), 1);
    }
}
