//! Plugin Context - 플러그인에 제공되는 capability 객체
//!
//! 플러그인 팩토리가 의존성을 받는 유일한 통로입니다. 컨텍스트는 다음만 노출합니다:
//! - 엔진 설정 (`config`)
//! - 호스트 공유 서비스 (`service::<T>()`: designer / project / skeleton 등)
//! - preference 선언 등록 (`set_preference`) 및 값 조회 (`preference`)
//! - setter 확장 지점 (`setters`)
//! - prefix 스코프 이벤트 (`event`)
//! - 다른 플러그인 프록시 조회 (`plugins`, 열거/변경 불가)
//!
//! 매니저 자체나 레지스트리의 쓰기 경로는 노출하지 않습니다.

use super::events::{EventBus, ScopedEventBus, DEFAULT_EVENT_PREFIX};
use super::manifest::{PluginMeta, PreferenceDeclaration};
use super::registry::PluginDirectory;
use lowcode_foundation::EngineConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// 플러그인 이름 → preference 값
pub type PreferenceMap = HashMap<String, Map<String, Value>>;

// ============================================================================
// ServiceMap - 호스트 공유 서비스
// ============================================================================

/// 타입으로 조회하는 호스트 서비스 모음
#[derive(Default)]
pub struct ServiceMap {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서비스 등록 (같은 타입은 교체)
    pub fn insert<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// 빌더 패턴: 서비스 등록
    pub fn with<T: Any + Send + Sync>(mut self, service: Arc<T>) -> Self {
        self.insert(service);
        self
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| Arc::clone(service).downcast::<T>().ok())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ============================================================================
// PreferenceRegistry - preference 선언 등록소
// ============================================================================

/// preference 선언 등록소 (설정 패널이 읽음)
#[derive(Debug, Clone, Default)]
pub struct PreferenceRegistry {
    declarations: Arc<RwLock<BTreeMap<String, PreferenceDeclaration>>>,
}

impl PreferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, declaration: PreferenceDeclaration) {
        self.declarations.write().insert(name.into(), declaration);
    }

    pub fn get(&self, name: &str) -> Option<PreferenceDeclaration> {
        self.declarations.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.declarations.read().keys().cloned().collect()
    }
}

// ============================================================================
// SetterRegistry - setter 확장 지점
// ============================================================================

/// setter 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetterDescriptor {
    /// setter 이름 (예: `StringSetter`)
    pub name: String,

    /// 렌더링할 컴포넌트 식별자
    pub component: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
}

impl SetterDescriptor {
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            title: String::new(),
            initial_value: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }
}

/// setter 등록소
#[derive(Debug, Clone, Default)]
pub struct SetterRegistry {
    setters: Arc<RwLock<BTreeMap<String, SetterDescriptor>>>,
}

impl SetterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// setter 등록 (같은 이름은 교체, 이전 값 반환)
    pub fn register_setter(&self, setter: SetterDescriptor) -> Option<SetterDescriptor> {
        self.setters.write().insert(setter.name.clone(), setter)
    }

    pub fn get_setter(&self, name: &str) -> Option<SetterDescriptor> {
        self.setters.read().get(name).cloned()
    }

    pub fn has_setter(&self, name: &str) -> bool {
        self.setters.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.setters.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.setters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.read().is_empty()
    }
}

// ============================================================================
// PreferenceSnapshot - init 주기별 preference 값
// ============================================================================

/// `init(preference)` 마다 통째로 교체되는 preference 스냅샷
#[derive(Debug, Clone, Default)]
pub struct PreferenceSnapshot {
    current: Arc<RwLock<Arc<PreferenceMap>>>,
}

impl PreferenceSnapshot {
    pub(crate) fn replace(&self, preferences: PreferenceMap) {
        *self.current.write() = Arc::new(preferences);
    }

    pub fn get(&self, plugin: &str) -> Option<Map<String, Value>> {
        self.current.read().get(plugin).cloned()
    }

    fn value(&self, plugin: &str, key: &str) -> Option<Value> {
        self.current
            .read()
            .get(plugin)
            .and_then(|values| values.get(key))
            .cloned()
    }
}

// ============================================================================
// PluginContextFactory
// ============================================================================

/// 플러그인별 컨텍스트 조립기
///
/// 공유 핸들을 보관하고, 플러그인마다 스코프가 적용된 `PluginContext` 를 만듭니다.
#[derive(Clone)]
pub struct PluginContextFactory {
    config: EngineConfig,
    services: Arc<ServiceMap>,
    preferences: PreferenceRegistry,
    setters: SetterRegistry,
    event_bus: Arc<EventBus>,
    snapshot: PreferenceSnapshot,
    directory: PluginDirectory,
}

impl PluginContextFactory {
    pub(crate) fn new(
        config: EngineConfig,
        services: Arc<ServiceMap>,
        event_bus: Arc<EventBus>,
        directory: PluginDirectory,
        snapshot: PreferenceSnapshot,
    ) -> Self {
        Self {
            config,
            services,
            preferences: PreferenceRegistry::new(),
            setters: SetterRegistry::new(),
            event_bus,
            snapshot,
            directory,
        }
    }

    /// 컨텍스트 생성
    ///
    /// 이름을 아직 모르면 `None` 을 넘기고, 매니저가 이름 결정 후 바인딩합니다.
    pub fn build(&self, plugin_name: Option<&str>, meta: &PluginMeta) -> PluginContext {
        let name = Arc::new(OnceLock::new());
        if let Some(plugin_name) = plugin_name {
            let _ = name.set(plugin_name.to_string());
        }

        PluginContext {
            inner: Arc::new(ContextInner {
                name,
                meta: meta.clone(),
                config: self.config.clone(),
                services: Arc::clone(&self.services),
                preferences: self.preferences.clone(),
                setters: self.setters.clone(),
                event_bus: Arc::clone(&self.event_bus),
                snapshot: self.snapshot.clone(),
                directory: self.directory.clone(),
            }),
        }
    }

    pub fn setters(&self) -> &SetterRegistry {
        &self.setters
    }

    pub fn preferences(&self) -> &PreferenceRegistry {
        &self.preferences
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(
            EngineConfig::with_engine_version("1.0.0"),
            Arc::new(ServiceMap::new()),
            Arc::new(EventBus::new()),
            PluginDirectory::default(),
            PreferenceSnapshot::default(),
        )
    }
}

// ============================================================================
// PluginContext
// ============================================================================

struct ContextInner {
    name: Arc<OnceLock<String>>,
    meta: PluginMeta,
    config: EngineConfig,
    services: Arc<ServiceMap>,
    preferences: PreferenceRegistry,
    setters: SetterRegistry,
    event_bus: Arc<EventBus>,
    snapshot: PreferenceSnapshot,
    directory: PluginDirectory,
}

/// 플러그인 컨텍스트 - 플러그인이 엔진과 상호작용하는 인터페이스
#[derive(Clone)]
pub struct PluginContext {
    inner: Arc<ContextInner>,
}

impl PluginContext {
    /// 플러그인 이름 (등록 중 이름이 결정되기 전에는 None)
    pub fn plugin_name(&self) -> Option<&str> {
        self.inner.name.get().map(String::as_str)
    }

    /// 이름 바인딩 (이미 있으면 무시)
    pub(crate) fn bind_name(&self, name: &str) {
        let _ = self.inner.name.set(name.to_string());
    }

    /// 엔진 설정
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// 호스트 공유 서비스 조회
    pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.services.get::<T>()
    }

    /// preference 선언 등록
    pub fn set_preference(&self, name: impl Into<String>, declaration: PreferenceDeclaration) {
        self.inner.preferences.set(name, declaration);
    }

    /// 이 플러그인의 preference 값 조회기
    pub fn preference(&self) -> PluginPreference<'_> {
        PluginPreference { ctx: self }
    }

    /// setter 확장 지점
    pub fn setters(&self) -> &SetterRegistry {
        &self.inner.setters
    }

    /// prefix 스코프 이벤트 emitter
    pub fn event(&self) -> ScopedEventBus {
        let prefix = self
            .inner
            .meta
            .event_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_EVENT_PREFIX.to_string());
        ScopedEventBus::new(
            Arc::clone(&self.inner.event_bus),
            prefix,
            Arc::clone(&self.inner.name),
        )
    }

    /// 다른 플러그인 프록시 조회 (읽기 전용)
    pub fn plugins(&self) -> &PluginDirectory {
        &self.inner.directory
    }

    /// 플러그인 이름이 붙은 tracing span
    pub fn logger(&self) -> tracing::Span {
        tracing::info_span!("plugin", name = self.plugin_name().unwrap_or("anonymous"))
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin", &self.plugin_name())
            .finish()
    }
}

/// 플러그인 preference 조회기
pub struct PluginPreference<'a> {
    ctx: &'a PluginContext,
}

impl PluginPreference<'_> {
    /// preference 값 조회
    ///
    /// 스키마에 선언되지 않은 키는 항상 None 입니다.
    /// 현재 init 주기의 값이 없거나 null 이거나 선언 타입과 맞지 않으면 `default` 를 반환합니다.
    pub fn get_preference_value(&self, key: &str, default: Option<Value>) -> Option<Value> {
        let inner = &self.ctx.inner;
        let property = inner
            .meta
            .preference_declaration
            .as_ref()
            .and_then(|decl| decl.property(key))?;

        let name = self.ctx.plugin_name()?;
        match inner.snapshot.value(name, key) {
            None | Some(Value::Null) => default,
            Some(value) if property.value_type.accepts(&value) => Some(value),
            Some(value) => {
                warn!(
                    "Preference {}.{} expected {:?}, got {}; using default",
                    name, key, property.value_type, value
                );
                default
            }
        }
    }

    /// 선언된 기본값을 fallback 으로 사용하여 조회
    pub fn get_or_declared_default(&self, key: &str) -> Option<Value> {
        let declared = self
            .ctx
            .inner
            .meta
            .preference_declaration
            .as_ref()
            .and_then(|decl| decl.property(key))
            .and_then(|property| property.default.clone());
        self.get_preference_value(key, declared)
    }
}
