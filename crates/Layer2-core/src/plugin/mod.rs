//! # Plugin System
//!
//! 로우코드 엔진 플러그인 시스템
//!
//! ## 개요
//!
//! 플러그인은 팩토리(`PluginFactory`)로 등록되며, 매니저가 이름/버전/의존성을
//! 검사한 뒤 의존성 순서대로 초기화합니다:
//! - 이름 중복 방지 및 override
//! - 엔진 버전 요구사항 검사 (semver, pre-release 포함)
//! - 의존성 순서 계산 (누락/순환 감지)
//! - 개별 init 실패 격리
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginManager                           │
//! │  ┌───────────────────────────────────────────────────────┐ │
//! │  │                   PluginRegistry                       │ │
//! │  │  ┌────────────┬────────────┬────────────────────┐    │ │
//! │  │  │ Runtime A  │ Runtime B  │ Runtime C          │    │ │
//! │  │  └────────────┴────────────┴────────────────────┘    │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! │          │ Sequencer (init 순서)                            │
//! │  ┌───────┴───────────────────────────────────────────────┐ │
//! │  │     PluginContext (플러그인별)                         │ │
//! │  │  - EngineConfig / ServiceMap                          │ │
//! │  │  - PreferenceRegistry / SetterRegistry                │ │
//! │  │  - ScopedEventBus                                     │ │
//! │  │  - PluginDirectory (읽기 전용)                        │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let outline = FnFactory::new(|ctx, _opts| {
//!     Ok(PluginConfig::new()
//!         .on_init(move || async move { Ok(()) })
//!         .boxed())
//! })
//! .named("outline")
//! .with_meta(PluginMeta::new().with_dependency("default-setters"));
//!
//! let manager = PluginManager::new(EngineConfig::with_engine_version("1.2.0"));
//! manager.register(&default_setters(), None, RegisterOptions::default()).await?;
//! manager.register(&outline, None, RegisterOptions::default()).await?;
//! let report = manager.init(None).await?;
//! ```

pub mod builtin;
mod context;
mod events;
mod manager;
mod manifest;
mod registry;
mod runtime;
mod sequencer;
mod traits;

pub use context::{
    PluginContext, PluginContextFactory, PluginPreference, PreferenceMap, PreferenceRegistry,
    PreferenceSnapshot, ServiceMap, SetterDescriptor, SetterRegistry,
};
pub use events::{
    EventBus, EventType, PluginEvent, PluginEventHandler, ScopedEventBus, DEFAULT_EVENT_PREFIX,
};
pub use manager::{
    InitFailure, InitReport, PluginManager, PluginManagerConfig, PluginSummary, PluginsProxy,
};
pub use manifest::{
    filter_valid_options, PluginEngines, PluginMeta, PreferenceDeclaration, PreferenceProperty,
    PreferenceValueType,
};
pub use registry::{PluginDirectory, PluginRegistry};
pub use runtime::{PluginProxy, PluginRuntime, PluginState};
pub use sequencer::{sequencify, Sequence};
pub use traits::{
    Exports, FnFactory, Plugin, PluginConfig, PluginFactory, PluginOptions, RegisterOptions,
};
