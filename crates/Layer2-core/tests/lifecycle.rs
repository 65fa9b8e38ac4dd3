//! 플러그인 라이프사이클 통합 테스트
//!
//! `cargo test -p lowcode-core --test lifecycle`

use lowcode_core::plugin::{
    EventType, FnFactory, PluginConfig, PluginFactory, PluginManager, PluginMeta, RegisterOptions,
};
use lowcode_foundation::{EngineConfig, Error};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

/// init/destroy 호출을 journal 에 기록하는 플러그인
///
/// `tag` 는 exports 로 공개되어 같은 이름의 유닛을 구분할 수 있습니다.
fn recording(name: &str, tag: &str, deps: &[&str], journal: &Journal) -> impl PluginFactory {
    let mut meta = PluginMeta::new();
    for dep in deps {
        meta = meta.with_dependency(*dep);
    }

    let journal = Arc::clone(journal);
    let tag = tag.to_string();
    FnFactory::new(move |_ctx, _opts| {
        let on_init = (Arc::clone(&journal), tag.clone());
        let on_destroy = (Arc::clone(&journal), tag.clone());
        Ok(PluginConfig::new()
            .on_init(move || {
                let (journal, tag) = on_init.clone();
                async move {
                    journal.lock().push(format!("init:{}", tag));
                    Ok(())
                }
            })
            .on_destroy(move || {
                let (journal, tag) = on_destroy.clone();
                async move {
                    journal.lock().push(format!("destroy:{}", tag));
                    Ok(())
                }
            })
            .with_exports(tag.clone())
            .boxed())
    })
    .named(name)
    .with_meta(meta)
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

fn exported_tag(manager: &PluginManager, name: &str) -> Option<String> {
    manager
        .to_proxy()
        .plugin(name)
        .and_then(|proxy| proxy.exports::<String>())
        .map(|tag| tag.as_ref().clone())
}

#[tokio::test]
async fn test_init_follows_registration_order() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    for name in ["c", "a", "b"] {
        manager
            .register(&recording(name, name, &[], &log), None, RegisterOptions::default())
            .await
            .unwrap();
    }

    let report = manager.init(None).await.unwrap();
    assert_eq!(report.initialized, vec!["c", "a", "b"]);
    assert_eq!(entries(&log), vec!["init:c", "init:a", "init:b"]);

    // 두 번째 패스는 훅을 다시 실행하지 않음
    manager.init(None).await.unwrap();
    assert_eq!(entries(&log).len(), 3);
}

#[tokio::test]
async fn test_dependency_initialized_first() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("b", "b", &["a"], &log), None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&recording("a", "a", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    manager.init(None).await.unwrap();
    assert_eq!(entries(&log), vec!["init:a", "init:b"]);
}

#[tokio::test]
async fn test_cycle_rejects_before_any_hook() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("a", "a", &["b"], &log), None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&recording("b", "b", &["a"], &log), None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&recording("free", "free", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    let err = manager.init(None).await.unwrap_err();
    match err {
        Error::MissingDependency { missing, cycles } => {
            assert!(missing.contains(&"a".to_string()));
            assert!(!cycles.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_unregistered_dependency_is_missing() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("a", "a", &["ghost"], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    let err = manager.init(None).await.unwrap_err();
    assert!(matches!(err, Error::MissingDependency { ref missing, .. } if missing == &["ghost"]));
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_duplicate_without_override_keeps_first() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("x", "x#1", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    let err = manager
        .register(&recording("x", "x#2", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicatePlugin(ref name) if name == "x"));
    assert!(err.is_registration_error());

    assert_eq!(manager.size(), 1);
    assert_eq!(exported_tag(&manager, "x").as_deref(), Some("x#1"));
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_override_destroys_previous_unit() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("x", "x#1", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();
    manager.init(None).await.unwrap();

    let first = manager.get("x").unwrap();
    manager
        .register(
            &recording("x", "x#2", &[], &log),
            None,
            RegisterOptions::new().with_override(),
        )
        .await
        .unwrap();

    assert!(first.is_destroyed());
    assert_eq!(manager.size(), 1);
    assert_eq!(exported_tag(&manager, "x").as_deref(), Some("x#2"));
    assert_eq!(entries(&log), vec!["init:x#1", "destroy:x#1"]);

    manager.init(None).await.unwrap();
    assert_eq!(entries(&log).last().map(String::as_str), Some("init:x#2"));
}

#[tokio::test]
async fn test_override_swap_is_atomic_under_concurrent_register() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();

    // destroy 훅이 양보하는 기존 유닛
    let slow_teardown = FnFactory::new(|_ctx, _opts| {
        Ok(PluginConfig::new()
            .on_destroy(|| async {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Ok(())
            })
            .with_exports(String::from("x#1"))
            .boxed())
    })
    .named("x");
    manager
        .register(&slow_teardown, None, RegisterOptions::default())
        .await
        .unwrap();
    let first = manager.get("x").unwrap();

    let replacement = recording("x", "x#2", &[], &log);
    let competitor = recording("x", "x#3", &[], &log);
    let (overridden, plain) = tokio::join!(
        manager.register(&replacement, None, RegisterOptions::new().with_override()),
        async {
            tokio::task::yield_now().await;
            manager
                .register(&competitor, None, RegisterOptions::default())
                .await
        }
    );

    overridden.unwrap();
    assert!(matches!(plain, Err(Error::DuplicatePlugin(ref name)) if name == "x"));
    assert!(first.is_destroyed());
    assert_eq!(manager.size(), 1);
    assert_eq!(exported_tag(&manager, "x").as_deref(), Some("x#2"));
}

#[tokio::test]
async fn test_init_failure_is_isolated() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();

    let broken = FnFactory::new(|_ctx, _opts| {
        Ok(PluginConfig::new()
            .on_init(|| async { Err(Error::Internal("bad config".into())) })
            .boxed())
    })
    .named("broken");

    manager
        .register(&broken, None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&recording("after", "after", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    let report = manager.init(None).await.unwrap();
    assert_eq!(report.failed_names(), vec!["broken"]);
    assert!(matches!(
        report.failed[0].error,
        Error::HookExecution { ref plugin, .. } if plugin == "broken"
    ));
    assert_eq!(report.initialized, vec!["after"]);
    assert_eq!(entries(&log), vec!["init:after"]);

    let failures = manager
        .event_bus()
        .history_by_type(EventType::PluginInitFailed)
        .await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].plugin.as_deref(), Some("broken"));
    assert!(!manager.get("broken").unwrap().is_initialized());
}

#[tokio::test]
async fn test_disabled_plugin_hidden_from_proxy() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    manager
        .register(&recording("x", "x", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&recording("y", "y", &[], &log), None, RegisterOptions::default())
        .await
        .unwrap();

    assert!(manager.set_disabled("x", true).await);

    assert!(manager.to_proxy().plugin("x").is_none());
    assert!(manager.has("x"));
    assert!(manager.get("x").is_some());

    // 다른 플러그인의 컨텍스트에서도 보이지 않음
    let directory = manager.get("y").unwrap().context().plugins().clone();
    assert!(directory.get("x").is_none());
    assert!(directory.has("x"));
    assert!(directory.get("y").is_some());

    assert!(manager.set_disabled("x", false).await);
    assert_eq!(exported_tag(&manager, "x").as_deref(), Some("x"));
}

#[tokio::test]
async fn test_dispose_destroys_everything() {
    let manager = PluginManager::new(EngineConfig::new());
    let log = journal();
    for name in ["a", "b"] {
        manager
            .register(&recording(name, name, &[], &log), None, RegisterOptions::default())
            .await
            .unwrap();
    }
    manager.init(None).await.unwrap();

    manager.dispose().await;

    assert_eq!(manager.size(), 0);
    assert!(manager.get_all().is_empty());
    let log = entries(&log);
    assert!(log.contains(&"destroy:a".to_string()));
    assert!(log.contains(&"destroy:b".to_string()));
}

#[tokio::test]
async fn test_version_gate() {
    let requires_v2 = |log: &Journal| {
        let log = Arc::clone(log);
        FnFactory::new(move |_ctx, _opts| {
            log.lock().push("created".into());
            Ok(PluginConfig::new().boxed())
        })
        .named("v2-only")
        .with_meta(PluginMeta::new().with_engine_range("^2.0.0"))
    };

    let log = journal();
    let old_host = PluginManager::new(EngineConfig::with_engine_version("1.2.0"));
    let err = old_host
        .register(&requires_v2(&log), None, RegisterOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::IncompatibleVersion { ref required, ref host, .. }
            if required == "^2.0.0" && host == "1.2.0"
    ));
    assert_eq!(old_host.size(), 0);

    let beta_host = PluginManager::new(EngineConfig::with_engine_version("2.1.0-beta"));
    beta_host
        .register(&requires_v2(&log), None, RegisterOptions::default())
        .await
        .unwrap();
    assert!(beta_host.has("v2-only"));
}

#[tokio::test]
async fn test_dependent_reads_dependency_exports() {
    let manager = PluginManager::new(EngineConfig::new());
    let seen = Arc::new(Mutex::new(None::<String>));

    let provider = FnFactory::new(|_ctx, _opts| {
        Ok(PluginConfig::new().with_exports(String::from("schema-api")).boxed())
    })
    .named("schema");

    let sink = Arc::clone(&seen);
    let consumer = FnFactory::new(move |ctx, _opts| {
        let sink = Arc::clone(&sink);
        Ok(PluginConfig::new()
            .on_init(move || {
                let ctx = ctx.clone();
                let sink = Arc::clone(&sink);
                async move {
                    let api = ctx
                        .plugins()
                        .get("schema")
                        .and_then(|proxy| proxy.exports::<String>());
                    *sink.lock() = api.map(|api| api.as_ref().clone());
                    ctx.event().emit("ready", json!({ "ok": true })).await;
                    Ok(())
                }
            })
            .boxed())
    })
    .named("designer")
    .with_meta(
        PluginMeta::new()
            .with_dependency("schema")
            .with_event_prefix("designer"),
    );

    manager
        .register(&consumer, None, RegisterOptions::default())
        .await
        .unwrap();
    manager
        .register(&provider, None, RegisterOptions::default())
        .await
        .unwrap();

    let mut events = manager.event_bus().subscribe();
    manager.init(None).await.unwrap();
    assert_eq!(seen.lock().as_deref(), Some("schema-api"));

    let mut custom = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Some(name) = event.custom_name() {
            custom.push(name.to_string());
        }
    }
    assert_eq!(custom, vec!["designer:ready"]);
}
