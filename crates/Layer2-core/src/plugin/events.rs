//! Plugin Events - 라이프사이클 이벤트 시스템
//!
//! 매니저가 발행하는 라이프사이클 이벤트와 플러그인이 발행하는 스코프 이벤트를
//! 하나의 버스로 전달합니다. 초기화 실패 등은 여기서 관찰할 수 있습니다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, OnceLock};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

// ============================================================================
// PluginEvent - 이벤트 타입
// ============================================================================

/// 플러그인 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEvent {
    /// 이벤트 타입
    pub event_type: EventType,

    /// 관련 플러그인 이름
    pub plugin: Option<String>,

    /// 이벤트 데이터
    pub data: Value,

    /// 타임스탬프
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// 소스 (이벤트 발생 위치)
    pub source: String,
}

impl PluginEvent {
    /// 새 이벤트 생성
    pub fn new(event_type: EventType, data: Value, source: impl Into<String>) -> Self {
        Self {
            event_type,
            plugin: None,
            data,
            timestamp: chrono::Utc::now(),
            source: source.into(),
        }
    }

    /// 매니저 라이프사이클 이벤트 생성
    pub fn lifecycle(event_type: EventType, plugin: impl Into<String>) -> Self {
        let mut event = Self::new(event_type, Value::Null, "plugin_manager");
        event.plugin = Some(plugin.into());
        event
    }

    /// 데이터 설정
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// 커스텀 이벤트 이름 (`prefix:name`)
    pub fn custom_name(&self) -> Option<&str> {
        match self.event_type {
            EventType::Custom => self.data.get("name").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// 이벤트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PluginRegistered,
    PluginInitialized,
    PluginInitFailed,
    PluginDestroyed,
    PluginDestroyFailed,
    PluginDeleted,
    PluginDisabled,
    PluginEnabled,

    /// 플러그인이 스코프 emitter 로 발행한 이벤트
    Custom,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PluginRegistered => write!(f, "plugin_registered"),
            Self::PluginInitialized => write!(f, "plugin_initialized"),
            Self::PluginInitFailed => write!(f, "plugin_init_failed"),
            Self::PluginDestroyed => write!(f, "plugin_destroyed"),
            Self::PluginDestroyFailed => write!(f, "plugin_destroy_failed"),
            Self::PluginDeleted => write!(f, "plugin_deleted"),
            Self::PluginDisabled => write!(f, "plugin_disabled"),
            Self::PluginEnabled => write!(f, "plugin_enabled"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

// ============================================================================
// PluginEventHandler
// ============================================================================

/// 이벤트 핸들러 trait
#[async_trait]
pub trait PluginEventHandler: Send + Sync {
    /// 핸들러 이름
    fn name(&self) -> &str;

    /// 관심 있는 이벤트 타입
    fn interested_events(&self) -> Vec<EventType>;

    /// 이벤트 처리
    async fn handle(&self, event: &PluginEvent);
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스 - 발행/구독 + 최근 히스토리
pub struct EventBus {
    /// 브로드캐스트 송신자
    sender: broadcast::Sender<PluginEvent>,

    /// 등록된 핸들러
    handlers: RwLock<HashMap<String, Arc<dyn PluginEventHandler>>>,

    /// 이벤트 히스토리 (최근 N개)
    history: RwLock<VecDeque<PluginEvent>>,

    /// 히스토리 최대 크기
    history_size: usize,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new() -> Self {
        Self::with_capacity(256, 100)
    }

    /// 용량 지정하여 생성
    pub fn with_capacity(channel_capacity: usize, history_size: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(history_size)),
            history_size,
        }
    }

    /// 이벤트 핸들러 등록
    pub async fn register_handler(&self, handler: Arc<dyn PluginEventHandler>) {
        let name = handler.name().to_string();
        let mut handlers = self.handlers.write().await;
        handlers.insert(name, handler);
    }

    /// 이벤트 핸들러 제거
    pub async fn unregister_handler(&self, name: &str) {
        let mut handlers = self.handlers.write().await;
        handlers.remove(name);
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: PluginEvent) {
        debug!("Publishing event: {} ({:?})", event.event_type, event.plugin);

        if self.history_size > 0 {
            let mut history = self.history.write().await;
            if history.len() >= self.history_size {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // 구독자가 없어도 OK
        if self.sender.send(event.clone()).is_err() {
            trace!("No subscribers for {}", event.event_type);
        }

        let handlers: Vec<_> = {
            let handlers = self.handlers.read().await;
            handlers
                .values()
                .filter(|h| h.interested_events().contains(&event.event_type))
                .cloned()
                .collect()
        };
        for handler in handlers {
            handler.handle(&event).await;
        }
    }

    /// 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.sender.subscribe()
    }

    /// 이벤트 히스토리 조회
    pub async fn history(&self) -> Vec<PluginEvent> {
        let history = self.history.read().await;
        history.iter().cloned().collect()
    }

    /// 특정 타입의 이벤트 히스토리 조회
    pub async fn history_by_type(&self, event_type: EventType) -> Vec<PluginEvent> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// 히스토리 클리어
    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    /// 등록된 핸들러 수
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ScopedEventBus - 플러그인용 prefix emitter
// ============================================================================

/// 기본 이벤트 prefix
pub const DEFAULT_EVENT_PREFIX: &str = "common";

/// 플러그인 컨텍스트에 제공되는 스코프 emitter
///
/// 모든 이벤트 이름 앞에 `prefix:` 가 붙습니다.
/// 플러그인 이름은 컨텍스트와 공유하며 발행 시점에 읽습니다.
#[derive(Clone)]
pub struct ScopedEventBus {
    bus: Arc<EventBus>,
    prefix: String,
    plugin: Arc<OnceLock<String>>,
}

impl ScopedEventBus {
    pub(crate) fn new(
        bus: Arc<EventBus>,
        prefix: impl Into<String>,
        plugin: Arc<OnceLock<String>>,
    ) -> Self {
        Self {
            bus,
            prefix: prefix.into(),
            plugin,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 스코프 이름 (`prefix:name`)
    pub fn scoped_name(&self, name: &str) -> String {
        format!("{}:{}", self.prefix, name)
    }

    /// 커스텀 이벤트 발행
    pub async fn emit(&self, name: &str, payload: Value) {
        let mut event = PluginEvent::new(
            EventType::Custom,
            serde_json::json!({
                "name": self.scoped_name(name),
                "payload": payload,
            }),
            self.prefix.clone(),
        );
        event.plugin = self.plugin.get().cloned();
        self.bus.publish(event).await;
    }

    /// 구독 (스코프 필터링은 수신자가 `custom_name` 으로 수행)
    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.bus.subscribe()
    }
}

impl std::fmt::Debug for ScopedEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedEventBus")
            .field("prefix", &self.prefix)
            .field("plugin", &self.plugin.get())
            .finish()
    }
}
