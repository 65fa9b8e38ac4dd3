//! lowcode-core: Plugin Runtime for the low-code engine
//!
//! Layer2 - 플러그인 라이프사이클 레이어
//!
//! # 주요 모듈
//!
//! - `plugin::sequencer`: 의존성 순서 계산 (누락/순환 감지)
//! - `plugin::runtime`: 등록된 플러그인 유닛 (init 1회 보장)
//! - `plugin::context`: 플러그인별 capability 컨텍스트
//! - `plugin::manager`: 등록/초기화/삭제/정리
//! - `plugin::builtin`: 내장 플러그인 (기본 setter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use lowcode_core::{default_setters, PluginManager, RegisterOptions};
//! use lowcode_foundation::EngineConfig;
//!
//! let manager = PluginManager::new(EngineConfig::with_engine_version("1.2.0"));
//! manager
//!     .register(&default_setters(), None, RegisterOptions::default())
//!     .await?;
//!
//! let report = manager.init(None).await?;
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.plugin, failure.error);
//! }
//!
//! manager.dispose().await;
//! ```

pub mod plugin;

// Re-exports: Plugin
pub use plugin::{
    // Builtin
    builtin::{default_setters, SetterCatalog},
    // Sequencer
    sequencify,
    // Events
    EventBus,
    EventType,
    // Traits
    FnFactory,
    // Manager
    InitReport,
    Plugin,
    PluginConfig,
    // Context
    PluginContext,
    PluginDirectory,
    PluginEvent,
    PluginFactory,
    PluginManager,
    PluginManagerConfig,
    // Manifest
    PluginMeta,
    PluginProxy,
    // Runtime
    PluginRuntime,
    PluginState,
    PluginSummary,
    PreferenceDeclaration,
    PreferenceMap,
    RegisterOptions,
    Sequence,
    ServiceMap,
};

// Layer1 re-exports
pub use lowcode_foundation::{EngineConfig, Error, Result};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_exports() {
        let factories = plugin::builtin::all_factories();
        assert_eq!(factories.len(), 1);
        assert_eq!(
            factories[0].plugin_name(),
            Some(plugin::builtin::DEFAULT_SETTERS_PLUGIN)
        );
    }

    #[tokio::test]
    async fn test_manager_exports() {
        let manager = PluginManager::new(EngineConfig::new());
        manager
            .register(&default_setters(), None, RegisterOptions::default())
            .await
            .unwrap();
        let report = manager.init(None).await.unwrap();
        assert!(report.is_success());
        assert_eq!(manager.summary().initialized, 1);
    }
}
