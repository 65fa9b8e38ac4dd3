//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! ## 주요 기능
//!
//! - 등록: 이름 결정, 중복/override 처리, 엔진 버전 검사
//! - 초기화: Sequencer 로 의존성 순서를 계산하고 한 번에 하나씩 init
//!   (개별 실패는 기록만 하고 나머지는 계속 진행)
//! - 비활성화/삭제/전체 정리

use super::context::{
    PluginContextFactory, PreferenceMap, PreferenceRegistry, PreferenceSnapshot, ServiceMap,
    SetterRegistry,
};
use super::events::{EventBus, EventType, PluginEvent};
use super::manifest::{filter_valid_options, PluginMeta};
use super::registry::{PluginDirectory, PluginRegistry};
use super::runtime::{PluginProxy, PluginRuntime};
use super::sequencer::{sequencify, Sequence};
use super::traits::{PluginFactory, PluginOptions, RegisterOptions};
use lowcode_foundation::{version, EngineConfig, Error, Result};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 플러그인 매니저 설정
#[derive(Debug, Clone)]
pub struct PluginManagerConfig {
    /// 훅 하나의 최대 실행 시간 (None 이면 무제한)
    pub hook_timeout: Option<Duration>,

    /// 이벤트 히스토리 크기
    pub history_size: usize,
}

impl Default for PluginManagerConfig {
    fn default() -> Self {
        Self {
            hook_timeout: None,
            history_size: 100,
        }
    }
}

/// 개별 플러그인 초기화 실패
#[derive(Debug)]
pub struct InitFailure {
    pub plugin: String,
    pub error: Error,
}

/// init 패스 결과
#[derive(Debug, Default)]
pub struct InitReport {
    /// 이번 패스에서 초기화된 플러그인 (실행 순서)
    pub initialized: Vec<String>,

    /// 이미 초기화되었거나 패스 도중 제거된 플러그인
    pub skipped: Vec<String>,

    /// init 훅이 실패한 플러그인
    pub failed: Vec<InitFailure>,
}

impl InitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.plugin.as_str()).collect()
    }
}

/// 플러그인 매니저 - 전체 플러그인 시스템 관리
pub struct PluginManager {
    /// 플러그인 레지스트리 (쓰기는 매니저만)
    registry: Arc<RwLock<PluginRegistry>>,

    /// 플러그인별 컨텍스트 조립기
    contexts: PluginContextFactory,

    /// 현재 init 주기의 preference
    snapshot: PreferenceSnapshot,

    /// 이벤트 버스
    event_bus: Arc<EventBus>,

    /// 설정
    config: PluginManagerConfig,
}

impl PluginManager {
    /// 새 매니저 생성
    pub fn new(engine_config: EngineConfig) -> Self {
        Self::with_services(engine_config, ServiceMap::new(), PluginManagerConfig::default())
    }

    /// 설정으로 생성
    pub fn with_config(engine_config: EngineConfig, config: PluginManagerConfig) -> Self {
        Self::with_services(engine_config, ServiceMap::new(), config)
    }

    /// 호스트 서비스와 함께 생성
    pub fn with_services(
        engine_config: EngineConfig,
        services: ServiceMap,
        config: PluginManagerConfig,
    ) -> Self {
        let registry = Arc::new(RwLock::new(PluginRegistry::new()));
        let event_bus = Arc::new(EventBus::with_capacity(256, config.history_size));
        let snapshot = PreferenceSnapshot::default();
        let contexts = PluginContextFactory::new(
            engine_config,
            Arc::new(services),
            Arc::clone(&event_bus),
            PluginDirectory::new(&registry),
            snapshot.clone(),
        );

        Self {
            registry,
            contexts,
            snapshot,
            event_bus,
            config,
        }
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 플러그인 등록
    ///
    /// 이름 누락, 중복, 엔진 버전 불일치는 레지스트리를 변경하지 않고 실패합니다.
    pub async fn register(
        &self,
        factory: &dyn PluginFactory,
        options: Option<PluginOptions>,
        register_options: RegisterOptions,
    ) -> Result<()> {
        let meta = factory.meta();
        let declared_name = factory.plugin_name().map(str::to_string);
        let ctx = self.contexts.build(declared_name.as_deref(), &meta);
        let options = filter_valid_options(options, meta.preference_declaration.as_ref());

        let config = factory.create(ctx.clone(), options)?;

        let name = match declared_name.or_else(|| config.name().map(str::to_string)) {
            Some(name) if !name.is_empty() => name,
            _ => {
                error!("Plugin name is not specified, registration skipped");
                return Err(Error::Configuration(
                    "plugin name is not specified".to_string(),
                ));
            }
        };
        ctx.bind_name(&name);

        let exists = self.registry.read().contains(&name);
        if exists && !register_options.override_existing {
            return Err(Error::DuplicatePlugin(name));
        }

        self.check_engine_version(&name, &meta)?;

        let declaration = meta.preference_declaration.clone();
        let runtime = Arc::new(PluginRuntime::new(name.clone(), meta, config, ctx));
        let replaced = self.install(&runtime, register_options.override_existing)?;

        if let Some(declaration) = declaration {
            self.contexts.preferences().set(&name, declaration);
        }

        if let Some(previous) = replaced {
            warn!("Plugin {} exists and was overridden", name);
            self.destroy_unit(&previous).await;
        }

        info!("Registered plugin: {}", name);
        self.event_bus
            .publish(PluginEvent::lifecycle(EventType::PluginRegistered, &name))
            .await;

        if register_options.auto_init {
            self.init_unit(&runtime).await?;
        }

        Ok(())
    }

    /// 레지스트리에 유닛 설치
    ///
    /// 교체 대상 제거와 새 유닛 추가는 한 번의 쓰기 잠금 안에서 이루어지므로
    /// 같은 이름의 다른 등록이 그 사이에 끼어들 수 없습니다.
    /// 교체된 유닛의 destroy 는 잠금 해제 후 호출자가 실행합니다.
    fn install(
        &self,
        runtime: &Arc<PluginRuntime>,
        override_existing: bool,
    ) -> Result<Option<Arc<PluginRuntime>>> {
        let mut registry = self.registry.write();
        let replaced = if registry.contains(runtime.name()) {
            if !override_existing {
                return Err(Error::DuplicatePlugin(runtime.name().to_string()));
            }
            registry.remove(runtime.name())
        } else {
            None
        };
        registry.insert(Arc::clone(runtime))?;
        Ok(replaced)
    }

    /// 엔진 버전 요구사항 검사
    fn check_engine_version(&self, name: &str, meta: &PluginMeta) -> Result<()> {
        let Some(required) = meta.engines.lowcode_engine.as_deref() else {
            return Ok(());
        };

        let Some(host) = self.contexts.config().engine_version() else {
            return Err(Error::incompatible_version(name, required, "unknown"));
        };

        if version::satisfies(required, &host)? {
            debug!("Plugin {} engine check passed ({} ~ {})", name, required, host);
            Ok(())
        } else {
            Err(Error::incompatible_version(name, required, host))
        }
    }

    // ========================================================================
    // 초기화
    // ========================================================================

    /// 모든 플러그인 초기화
    ///
    /// 의존성이 누락/순환이면 어떤 훅도 실행하지 않고 실패합니다.
    /// 개별 init 실패는 보고서에 기록되고 다음 플러그인으로 진행합니다.
    pub async fn init(&self, preference: Option<PreferenceMap>) -> Result<InitReport> {
        self.snapshot.replace(preference.unwrap_or_default());

        let (names, dependencies) = {
            let registry = self.registry.read();
            (registry.names(), registry.dependency_map())
        };

        let Sequence {
            sequence,
            missing_tasks,
            recursive_dependencies,
        } = sequencify(&dependencies, names.iter().map(String::as_str));

        if !missing_tasks.is_empty() {
            error!(
                "Plugin dependencies missing or cyclic: {:?} (cycles: {:?})",
                missing_tasks, recursive_dependencies
            );
            return Err(Error::MissingDependency {
                missing: missing_tasks,
                cycles: recursive_dependencies,
            });
        }

        let mut report = InitReport::default();
        for name in sequence {
            let runtime = self.registry.read().get(&name);
            let Some(runtime) = runtime else {
                debug!("Plugin {} removed during init, skipping", name);
                report.skipped.push(name);
                continue;
            };

            if runtime.is_initialized() {
                report.skipped.push(name);
                continue;
            }

            match self.init_unit(&runtime).await {
                Ok(()) => report.initialized.push(name),
                Err(error) => report.failed.push(InitFailure {
                    plugin: name,
                    error,
                }),
            }
        }

        info!(
            "Plugin init pass finished: {} initialized, {} skipped, {} failed",
            report.initialized.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn init_unit(&self, runtime: &PluginRuntime) -> Result<()> {
        let name = runtime.name();
        match runtime.init_within(self.config.hook_timeout).await {
            Ok(()) => {
                self.event_bus
                    .publish(PluginEvent::lifecycle(EventType::PluginInitialized, name))
                    .await;
                Ok(())
            }
            Err(e) => {
                error!("Plugin {} init failed: {}", name, e);
                self.event_bus
                    .publish(
                        PluginEvent::lifecycle(EventType::PluginInitFailed, name)
                            .with_data(json!({ "error": e.to_string() })),
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn destroy_unit(&self, runtime: &PluginRuntime) {
        let name = runtime.name();
        match runtime.destroy_within(self.config.hook_timeout).await {
            Ok(()) => {
                self.event_bus
                    .publish(PluginEvent::lifecycle(EventType::PluginDestroyed, name))
                    .await;
            }
            Err(e) => {
                warn!("Plugin {} destroy failed: {}", name, e);
                self.event_bus
                    .publish(
                        PluginEvent::lifecycle(EventType::PluginDestroyFailed, name)
                            .with_data(json!({ "error": e.to_string() })),
                    )
                    .await;
            }
        }
    }

    // ========================================================================
    // 삭제 / 비활성화 / 정리
    // ========================================================================

    async fn remove_and_destroy(&self, name: &str) -> bool {
        let removed = self.registry.write().remove(name);
        let Some(runtime) = removed else {
            return false;
        };
        self.destroy_unit(&runtime).await;
        true
    }

    /// 플러그인 삭제 (존재했으면 true)
    pub async fn delete(&self, name: &str) -> bool {
        if !self.remove_and_destroy(name).await {
            return false;
        }

        info!("Plugin {} deleted", name);
        self.event_bus
            .publish(PluginEvent::lifecycle(EventType::PluginDeleted, name))
            .await;
        true
    }

    /// 플러그인 비활성화/활성화 (존재했으면 true)
    pub async fn set_disabled(&self, name: &str, disabled: bool) -> bool {
        let runtime = self.registry.read().get(name);
        let Some(runtime) = runtime else {
            return false;
        };

        runtime.set_disabled(disabled);
        let event_type = if disabled {
            EventType::PluginDisabled
        } else {
            EventType::PluginEnabled
        };
        self.event_bus
            .publish(PluginEvent::lifecycle(event_type, name))
            .await;
        true
    }

    /// 모든 플러그인의 destroy 훅 실행 (레지스트리는 유지)
    pub async fn destroy(&self) {
        let plugins = self.registry.read().all();
        for runtime in plugins {
            self.destroy_unit(&runtime).await;
        }
    }

    /// 모든 플러그인 정리 후 레지스트리 비움
    pub async fn dispose(&self) {
        self.destroy().await;
        let drained = self.registry.write().drain();
        info!("Plugin manager disposed ({} plugins)", drained.len());
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    pub fn get(&self, name: &str) -> Option<Arc<PluginRuntime>> {
        self.registry.read().get(name)
    }

    /// 등록 순서대로 모든 플러그인
    pub fn get_all(&self) -> Vec<Arc<PluginRuntime>> {
        self.registry.read().all()
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    pub fn size(&self) -> usize {
        self.registry.read().len()
    }

    /// 현재 init 주기의 플러그인 preference
    pub fn get_plugin_preference(&self, name: &str) -> Option<Map<String, Value>> {
        self.snapshot.get(name)
    }

    /// 동적 조회 프록시
    pub fn to_proxy(&self) -> PluginsProxy<'_> {
        PluginsProxy { manager: self }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn setters(&self) -> &SetterRegistry {
        self.contexts.setters()
    }

    pub fn preferences(&self) -> &PreferenceRegistry {
        self.contexts.preferences()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        self.contexts.config()
    }

    /// 플러그인 요약 정보
    pub fn summary(&self) -> PluginSummary {
        let plugins = self.get_all();
        PluginSummary {
            total: plugins.len(),
            initialized: plugins.iter().filter(|p| p.is_initialized()).count(),
            disabled: plugins.iter().filter(|p| p.is_disabled()).count(),
        }
    }
}

/// 플러그인 시스템 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSummary {
    pub total: usize,
    pub initialized: usize,
    pub disabled: usize,
}

/// 매니저 조회 프록시
///
/// `plugin(name)` 은 활성 플러그인의 capability 프록시를, 비활성/미등록이면 None 을
/// 반환합니다. 그 외 접근은 `Deref` 로 매니저 API 에 전달됩니다.
pub struct PluginsProxy<'a> {
    manager: &'a PluginManager,
}

impl PluginsProxy<'_> {
    pub fn plugin(&self, name: &str) -> Option<PluginProxy> {
        let runtime = self.manager.get(name)?;
        if runtime.is_disabled() {
            return None;
        }
        Some(runtime.to_proxy())
    }
}

impl Deref for PluginsProxy<'_> {
    type Target = PluginManager;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}
