//! Argument binding for conditional rules
//!
//! A condition with no required parameters is called with no arguments.
//! Otherwise binding walks the declared schema in order:
//! 1. A role parameter takes the query's role object, once
//! 2. A resource parameter takes the query's resource object, once
//! 3. Anything else is looked up by name in the caller's parameters and
//!    skipped when absent
//!
//! The condition result is ANDed with the rule's static effect.

use tracing::warn;

use super::{Argument, Condition, ConditionArgs, ParamKind, Parameters};
use crate::error::{AclError, Result};
use crate::identity::{ResourceRef, RoleRef};
use crate::types::Access;

/// Query state the binder draws from
pub(crate) struct BindingContext<'a> {
    pub role: &'a RoleRef,
    pub resource: &'a ResourceRef,
    pub action: &'a str,
    pub parameters: Option<&'a Parameters>,
    pub no_arguments_default: Access,
}

/// Result of a conditional rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Evaluation {
    pub granted: bool,
    /// Parameters the caller was expected to supply
    pub custom_arguments: usize,
    /// Whether the predicate actually ran
    pub invoked: bool,
    /// Whether the no-arguments default decided instead of the predicate
    pub used_default: bool,
}

fn type_mismatch(name: &str, kind: ParamKind, found: &Argument) -> AclError {
    AclError::TypeMismatch {
        parameter: name.to_string(),
        expected: kind.to_string(),
        found: found.describe().to_string(),
    }
}

fn warn_surplus(ctx: &BindingContext<'_>, supplied: usize, accepted: usize) {
    if supplied > accepted {
        warn!(
            role = ctx.role.name(),
            resource = ctx.resource.name(),
            action = ctx.action,
            supplied,
            accepted,
            "more parameters supplied than the condition accepts; extra parameters are ignored"
        );
    }
}

pub(crate) fn bind_and_evaluate(
    condition: &Condition,
    access: Access,
    ctx: &BindingContext<'_>,
) -> Result<Evaluation> {
    let params = condition.params();
    let supplied = ctx.parameters;
    let supplied_count = supplied.map_or(0, Parameters::len);
    let required = condition.required_count();

    if required == 0 {
        warn_surplus(ctx, supplied_count, 0);
        let granted = access.is_allow() && condition.call(&ConditionArgs::default());
        return Ok(Evaluation {
            granted,
            custom_arguments: 0,
            invoked: access.is_allow(),
            used_default: false,
        });
    }

    let mut args = ConditionArgs::default();
    let mut has_role = false;
    let mut has_resource = false;
    let mut custom_arguments = params.len();

    for param in params {
        let offered = supplied.and_then(|p| p.get(&param.name));

        match param.kind {
            ParamKind::Role => {
                if let (false, Some(handle)) = (has_role, ctx.role.handle()) {
                    has_role = true;
                    custom_arguments -= 1;
                    args.push(&param.name, Argument::Role(handle.clone()));
                    continue;
                }
                match offered {
                    Some(argument @ Argument::Role(_)) => args.push(&param.name, argument.clone()),
                    Some(other) => return Err(type_mismatch(&param.name, param.kind, other)),
                    None => {}
                }
            }
            ParamKind::Resource => {
                if let (false, Some(handle)) = (has_resource, ctx.resource.handle()) {
                    has_resource = true;
                    custom_arguments -= 1;
                    args.push(&param.name, Argument::Resource(handle.clone()));
                    continue;
                }
                match offered {
                    Some(argument @ Argument::Resource(_)) => {
                        args.push(&param.name, argument.clone())
                    }
                    Some(other) => return Err(type_mismatch(&param.name, param.kind, other)),
                    None => {}
                }
            }
            ParamKind::Value(kind) => match offered {
                Some(Argument::Value(value)) if kind.accepts(value) => {
                    args.push(&param.name, Argument::Value(value.clone()))
                }
                Some(other) => return Err(type_mismatch(&param.name, param.kind, other)),
                None => {}
            },
        }
    }

    warn_surplus(ctx, supplied_count, custom_arguments);

    if args.is_empty() {
        warn!(
            role = ctx.role.name(),
            resource = ctx.resource.name(),
            action = ctx.action,
            default = %ctx.no_arguments_default,
            "no parameters bound for conditional rule; using no-arguments default action"
        );
        return Ok(Evaluation {
            granted: access.is_allow() && ctx.no_arguments_default.is_allow(),
            custom_arguments,
            invoked: false,
            used_default: true,
        });
    }

    if args.len() < required {
        return Err(AclError::InsufficientConditionArguments {
            role: ctx.role.name().to_string(),
            resource: ctx.resource.name().to_string(),
            action: ctx.action.to_string(),
            required,
            supplied: args.len(),
        });
    }

    Ok(Evaluation {
        granted: access.is_allow() && condition.call(&args),
        custom_arguments,
        invoked: access.is_allow(),
        used_default: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ValueKind;
    use crate::identity::{Resource, Role};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn under_limit() -> Condition {
        Condition::new(|args| args.f64("amount").is_some_and(|a| a < 1000.0))
            .param("amount", ValueKind::Number)
    }

    fn evaluate(
        condition: &Condition,
        access: Access,
        role: &RoleRef,
        resource: &ResourceRef,
        parameters: Option<&Parameters>,
        no_arguments_default: Access,
    ) -> Result<Evaluation> {
        let ctx = BindingContext {
            role,
            resource,
            action: "index",
            parameters,
            no_arguments_default,
        };
        bind_and_evaluate(condition, access, &ctx)
    }

    #[test]
    fn test_value_binding() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let condition = under_limit();

        let low = Parameters::new().with("amount", 500);
        let high = Parameters::new().with("amount", 5000);

        let result = evaluate(&condition, Access::Allow, &role, &resource, Some(&low), Access::Deny).unwrap();
        assert!(result.granted);
        assert!(result.invoked);
        assert_eq!(result.custom_arguments, 1);

        let result = evaluate(&condition, Access::Allow, &role, &resource, Some(&high), Access::Deny).unwrap();
        assert!(!result.granted);
    }

    #[test]
    fn test_deny_rule_never_grants() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let condition = Condition::new(|_| true);

        let result = evaluate(&condition, Access::Deny, &role, &resource, None, Access::Allow).unwrap();
        assert!(!result.granted);
    }

    #[test]
    fn test_no_arguments_default() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let condition = under_limit();

        let result = evaluate(&condition, Access::Allow, &role, &resource, None, Access::Deny).unwrap();
        assert!(!result.granted);
        assert!(!result.invoked);
        assert!(result.used_default);

        let result = evaluate(&condition, Access::Allow, &role, &resource, None, Access::Allow).unwrap();
        assert!(result.granted);

        let result = evaluate(&condition, Access::Deny, &role, &resource, None, Access::Allow).unwrap();
        assert!(!result.granted);
    }

    #[test]
    fn test_identity_objects_bound_first() {
        let role = RoleRef::from(Role::new("users"));
        let resource = ResourceRef::from(Resource::new("invoices"));
        let condition = Condition::new(|args| {
            args.role().is_some_and(|r| r.role_name() == "users")
                && args.resource().is_some_and(|r| r.resource_name() == "invoices")
        })
        .role_param("user")
        .resource_param("invoice");

        let result = evaluate(&condition, Access::Allow, &role, &resource, None, Access::Deny).unwrap();
        assert!(result.granted);
        assert_eq!(result.custom_arguments, 0);
    }

    #[test]
    fn test_insufficient_arguments() {
        let role = RoleRef::from(Role::new("users"));
        let resource = ResourceRef::from("invoices");
        let condition = Condition::new(|_| true)
            .role_param("user")
            .param("amount", ValueKind::Number);

        let err = evaluate(&condition, Access::Allow, &role, &resource, None, Access::Allow).unwrap_err();
        assert!(matches!(
            err,
            AclError::InsufficientConditionArguments {
                required: 2,
                supplied: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");

        let wrong_value = Parameters::new().with("amount", "lots");
        let err = evaluate(&under_limit(), Access::Allow, &role, &resource, Some(&wrong_value), Access::Deny)
            .unwrap_err();
        assert!(matches!(err, AclError::TypeMismatch { ref parameter, .. } if parameter == "amount"));

        let condition = Condition::new(|_| true).role_param("user");
        let wrong_object = Parameters::new().with("user", "users");
        let err = evaluate(&condition, Access::Allow, &role, &resource, Some(&wrong_object), Access::Deny)
            .unwrap_err();
        assert!(matches!(err, AclError::TypeMismatch { ref expected, .. } if expected == "role"));
    }

    #[test]
    fn test_role_argument_from_parameters() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let condition = Condition::new(|args| args.role().is_some_and(|r| r.role_name() == "owner"))
            .role_param("user");

        let params = Parameters::new().with_role("user", Arc::new(Role::new("owner")));
        let result = evaluate(&condition, Access::Allow, &role, &resource, Some(&params), Access::Deny).unwrap();
        assert!(result.granted);
    }

    #[test]
    fn test_surplus_parameters_are_ignored() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let params = Parameters::new().with("amount", 10).with("unused", true);

        let result = evaluate(&under_limit(), Access::Allow, &role, &resource, Some(&params), Access::Deny).unwrap();
        assert!(result.granted);
    }

    #[test]
    fn test_zero_parameter_condition_called_without_args() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let condition = Condition::new(move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            args.is_empty()
        });

        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let params = Parameters::new().with("amount", 10);

        let result = evaluate(&condition, Access::Allow, &role, &resource, Some(&params), Access::Deny).unwrap();
        assert!(result.granted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_optional_only_condition_invoked_with_none_bound() {
        let condition = Condition::new(|args| args.str("note").is_none())
            .optional_param("note", ValueKind::String);

        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");

        let result = evaluate(&condition, Access::Allow, &role, &resource, None, Access::Deny).unwrap();
        assert!(result.granted);
        assert!(result.invoked);
    }

    #[test]
    fn test_optional_only_condition_receives_no_arguments() {
        let condition = Condition::new(|args| args.is_empty())
            .optional_param("note", ValueKind::String);

        let role = RoleRef::from(Role::new("users"));
        let resource = ResourceRef::from("invoices");
        let params = Parameters::from_json(json!({ "note": "hi" })).unwrap();

        let result = evaluate(&condition, Access::Allow, &role, &resource, Some(&params), Access::Deny).unwrap();
        assert!(result.granted);
        assert!(result.invoked);
        assert!(!result.used_default);
        assert_eq!(result.custom_arguments, 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_warnings(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_surplus_warning_without_required_parameters() {
        let role = RoleRef::from("users");
        let resource = ResourceRef::from("invoices");
        let condition = Condition::new(|_| true);
        let params = Parameters::new().with("amount", 10);

        let output = capture_warnings(|| {
            evaluate(&condition, Access::Allow, &role, &resource, Some(&params), Access::Deny).unwrap();
        });
        assert!(output.contains("more parameters supplied"));

        let output = capture_warnings(|| {
            evaluate(&condition, Access::Allow, &role, &resource, None, Access::Deny).unwrap();
        });
        assert!(!output.contains("more parameters supplied"));
    }
}
