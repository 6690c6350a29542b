//! Concurrency tests for the ACL engine
//!
//! Queries run from many tasks against a shared engine while rules and
//! inheritance edges are written.

#[cfg(test)]
mod concurrency_tests {
    use authz_acl::{Acl, Condition, Parameters, ValueKind};
    use std::sync::Arc;
    use tokio::task::JoinSet;
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("authz_acl=debug"))
            .with_test_writer()
            .try_init();
    }

    fn shared_acl() -> Arc<Acl> {
        let acl = Acl::new();
        acl.add_role("guests", None).unwrap();
        acl.add_role("users", Some("guests".into())).unwrap();
        acl.add_role("admins", Some("users".into())).unwrap();
        acl.add_resource("invoices", ["index", "view", "approve"]).unwrap();

        acl.allow("guests", "invoices", "index", None).unwrap();
        acl.allow("users", "invoices", "view", None).unwrap();
        let small_amounts = Condition::new(|args| args.i64("amount").is_some_and(|a| a < 1000))
            .param("amount", ValueKind::Number);
        acl.allow("admins", "invoices", "approve", Some(small_amounts))
            .unwrap();
        Arc::new(acl)
    }

    #[tokio::test]
    async fn test_concurrent_readers() {
        init_tracing();
        let acl = shared_acl();
        let mut tasks = JoinSet::new();

        for i in 0..32i64 {
            let acl = Arc::clone(&acl);
            tasks.spawn_blocking(move || {
                let params = Parameters::new().with("amount", i * 100);
                let approved = acl
                    .is_allowed("admins", "invoices", "approve", Some(&params))
                    .unwrap();
                let viewed = acl.is_allowed("admins", "invoices", "view", None).unwrap();
                let guest_view = acl.is_allowed("guests", "invoices", "view", None).unwrap();
                (i, approved, viewed, guest_view)
            });
        }

        while let Some(result) = tasks.join_next().await {
            let (i, approved, viewed, guest_view) = result.unwrap();
            assert_eq!(approved, i * 100 < 1000);
            assert!(viewed);
            assert!(!guest_view);
        }
    }

    #[tokio::test]
    async fn test_readers_during_inheritance_writes() {
        init_tracing();
        let acl = shared_acl();
        for i in 0..16 {
            acl.add_role(format!("team_{}", i), None).unwrap();
        }

        let mut tasks = JoinSet::new();
        for i in 0..16 {
            let acl = Arc::clone(&acl);
            tasks.spawn_blocking(move || {
                let team = format!("team_{}", i);
                acl.add_inherit(&team, "users").unwrap();
                for _ in 0..50 {
                    let _ = acl.is_allowed(&team, "invoices", "view", None).unwrap();
                }
                team
            });
        }

        while let Some(result) = tasks.join_next().await {
            let team = result.unwrap();
            assert!(acl.is_allowed(&team, "invoices", "view", None).unwrap());
            assert!(acl.is_allowed(&team, "invoices", "index", None).unwrap());
            assert_eq!(acl.ancestors(&team), vec!["users", "guests"]);
        }
    }

    #[tokio::test]
    async fn test_condition_queries_engine_from_task() {
        let acl = shared_acl();
        let inner = Arc::clone(&acl);
        let delegated = Condition::new(move |_| {
            inner
                .is_allowed("users", "invoices", "view", None)
                .unwrap_or(false)
        });
        acl.allow("guests", "invoices", "approve", Some(delegated))
            .unwrap();

        let task_acl = Arc::clone(&acl);
        let allowed = tokio::task::spawn_blocking(move || {
            task_acl.is_allowed("guests", "invoices", "approve", None)
        })
        .await
        .unwrap()
        .unwrap();
        assert!(allowed);
    }
}
