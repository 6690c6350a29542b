//! Error types for the ACL engine

use thiserror::Error;

/// Result type alias for ACL operations
pub type Result<T> = std::result::Result<T, AclError>;

/// Errors raised by mutating operations and by condition binding
///
/// Unknown roles, resources or actions never surface from `is_allowed`;
/// they resolve to the configured default action instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    /// Role is not registered
    #[error("Role '{role}' does not exist in the role list")]
    UnknownRole { role: String },

    /// Resource is not registered
    #[error("Resource '{resource}' does not exist in the resource list")]
    UnknownResource { resource: String },

    /// Action is not registered for the resource
    #[error("Access '{action}' does not exist in resource '{resource}'")]
    UnknownAction { resource: String, action: String },

    /// Adding the edge would make a role its own ancestor
    #[error("Role '{parent}' (to inherit) produces an infinite loop for role '{role}'")]
    InheritanceCycle { role: String, parent: String },

    /// Malformed input to a mutating call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Condition received fewer arguments than it requires
    #[error(
        "Condition for '{role}' on '{resource}' -> '{action}' requires {required} argument(s), {supplied} bound"
    )]
    InsufficientConditionArguments {
        role: String,
        resource: String,
        action: String,
        required: usize,
        supplied: usize,
    },

    /// Supplied argument does not fit the declared parameter kind
    #[error("Parameter '{parameter}' expects {expected}, got {found}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        found: String,
    },
}

impl AclError {
    pub(crate) fn unknown_role(role: impl Into<String>) -> Self {
        AclError::UnknownRole { role: role.into() }
    }

    pub(crate) fn unknown_resource(resource: impl Into<String>) -> Self {
        AclError::UnknownResource {
            resource: resource.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AclError::unknown_role("admins");
        assert_eq!(err.to_string(), "Role 'admins' does not exist in the role list");

        let err = AclError::UnknownAction {
            resource: "invoices".to_string(),
            action: "purge".to_string(),
        };
        assert!(err.to_string().contains("purge"));
        assert!(err.to_string().contains("invoices"));
    }

    #[test]
    fn test_cycle_display() {
        let err = AclError::InheritanceCycle {
            role: "role_b".to_string(),
            parent: "role_a".to_string(),
        };
        assert!(err.to_string().contains("infinite loop"));
        assert!(err.to_string().contains("role_a"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(AclError::unknown_resource("x"), AclError::unknown_resource("x"));
        assert_ne!(AclError::unknown_resource("x"), AclError::unknown_role("x"));
    }
}
