//! # ACL engine (authz-acl)
//!
//! In-memory role based access control with support for:
//! - Role inheritance with multiple parents and cycle rejection
//! - Wildcard rules on resource and action
//! - Deterministic precedence: exact, then `(resource, *)`, then `(*, *)`,
//!   for the role itself before any ancestor, ancestors breadth-first
//! - Conditional rules with an explicit parameter schema
//! - Pre/post check hooks
//! - Thread-safe concurrent reads
//!
//! ## Example
//!
//! ```rust
//! use authz_acl::{Acl, Condition, Parameters, ValueKind};
//!
//! # fn example() -> authz_acl::Result<()> {
//! let acl = Acl::new();
//! acl.add_role("users", None)?;
//! acl.add_role("managers", Some("users".into()))?;
//! acl.add_resource("invoices", ["index", "approve"])?;
//!
//! acl.allow("users", "invoices", "index", None)?;
//!
//! let small_amounts = Condition::new(|args| args.f64("amount").is_some_and(|a| a < 1000.0))
//!     .param("amount", ValueKind::Number);
//! acl.allow("managers", "invoices", "approve", Some(small_amounts))?;
//!
//! assert!(acl.is_allowed("managers", "invoices", "index", None)?);
//!
//! let params = Parameters::new().with("amount", 500);
//! assert!(acl.is_allowed("managers", "invoices", "approve", Some(&params))?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod identity;
pub mod registry;
pub mod rules;
pub mod types;

pub use condition::{Argument, Condition, ConditionArgs, ConditionParam, ParamKind, Parameters, ValueKind};
pub use config::AclConfig;
pub use engine::{AccessDecision, Acl, DecisionReason};
pub use error::{AclError, Result};
pub use hooks::{ActiveAccess, HookOutcome};
pub use identity::{Resource, ResourceAware, ResourceRef, Role, RoleAware, RoleRef};
pub use types::{Access, AccessKey, Names, WILDCARD};
