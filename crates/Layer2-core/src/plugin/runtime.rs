//! Plugin Runtime - 등록된 플러그인 하나의 라이프사이클 관리
//!
//! ```text
//! Registered ──init()──▶ Initializing ──ok──▶ Initialized
//!     │                      │ err                 │
//!     │                      ▼                     │
//!     │                  Registered                │
//!     └──────────destroy()───────────┬─────────────┘
//!                                    ▼
//!                                Destroyed (terminal)
//! ```
//!
//! `disabled` 는 상태와 별개인 플래그로, 외부 프록시 조회만 막습니다.

use super::context::PluginContext;
use super::manifest::PluginMeta;
use super::traits::{Exports, Plugin};
use lowcode_foundation::{Error, Result};
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, Instrument};

/// 플러그인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// 등록됨 (아직 초기화 안됨)
    Registered,

    /// init 훅 실행 중
    Initializing,

    /// 초기화 완료
    Initialized,

    /// 정리됨 (종료 상태)
    Destroyed,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Initializing => write!(f, "initializing"),
            Self::Initialized => write!(f, "initialized"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// 등록된 플러그인 유닛
pub struct PluginRuntime {
    name: String,
    meta: PluginMeta,
    config: Box<dyn Plugin>,
    ctx: PluginContext,

    /// 훅 실행을 직렬화 (init 중복 호출은 완료를 기다린 후 no-op)
    lifecycle: Mutex<()>,
    state: parking_lot::RwLock<PluginState>,
    disabled: AtomicBool,
}

impl PluginRuntime {
    pub(crate) fn new(
        name: impl Into<String>,
        meta: PluginMeta,
        config: Box<dyn Plugin>,
        ctx: PluginContext,
    ) -> Self {
        Self {
            name: name.into(),
            meta,
            config,
            ctx,
            lifecycle: Mutex::new(()),
            state: parking_lot::RwLock::new(PluginState::Registered),
            disabled: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    /// 선언된 의존성 (Sequencer 입력)
    pub fn dependencies(&self) -> &[String] {
        &self.meta.dependencies
    }

    pub fn state(&self) -> PluginState {
        *self.state.read()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == PluginState::Initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == PluginState::Destroyed
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// 플러그인에 전달된 컨텍스트
    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    // ========================================================================
    // 라이프사이클
    // ========================================================================

    /// init 훅 실행 (최초 성공 이후 호출은 no-op)
    pub async fn init(&self) -> Result<()> {
        self.init_within(None).await
    }

    /// 시간 제한을 두고 init 훅 실행
    ///
    /// 제한을 넘기면 훅 future 만 취소되고 유닛은 Registered 로 돌아갑니다.
    pub async fn init_within(&self, limit: Option<Duration>) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        match self.state() {
            PluginState::Initialized => {
                debug!("Plugin {} already initialized", self.name);
                return Ok(());
            }
            PluginState::Destroyed => return Err(Error::PluginDestroyed(self.name.clone())),
            PluginState::Registered | PluginState::Initializing => {}
        }

        self.set_state(PluginState::Initializing);
        debug!("Initializing plugin {}", self.name);

        match self.run_hook("init", self.config.init(), limit).await {
            Ok(()) => {
                self.set_state(PluginState::Initialized);
                info!("Plugin {} initialized", self.name);
                Ok(())
            }
            Err(e) => {
                self.set_state(PluginState::Registered);
                Err(e)
            }
        }
    }

    /// destroy 훅 실행 (이미 destroy 된 경우 no-op)
    ///
    /// 훅이 실패해도 유닛은 Destroyed 상태가 됩니다.
    pub async fn destroy(&self) -> Result<()> {
        self.destroy_within(None).await
    }

    /// 시간 제한을 두고 destroy 훅 실행 (제한 초과도 실패로 취급, 상태는 Destroyed)
    pub async fn destroy_within(&self, limit: Option<Duration>) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if self.is_destroyed() {
            return Ok(());
        }

        let result = self.run_hook("destroy", self.config.destroy(), limit).await;
        self.set_state(PluginState::Destroyed);
        debug!("Plugin {} destroyed", self.name);

        result
    }

    /// 플러그인 span 안에서 훅 실행, 실패와 시간 초과는 HookExecution 으로 변환
    async fn run_hook<F>(&self, hook: &str, fut: F, limit: Option<Duration>) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let fut = fut.instrument(self.ctx.logger());
        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(Error::hook_execution(
                        &self.name,
                        hook,
                        format!("timed out after {:?}", limit),
                    ))
                }
            },
            None => fut.await,
        };
        result.map_err(|e| Error::hook_execution(&self.name, hook, e.to_string()))
    }

    /// 비활성화 플래그 설정 (상태는 유지)
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
        debug!("Set plugin {} disabled = {}", self.name, disabled);
    }

    fn set_state(&self, state: PluginState) {
        *self.state.write() = state;
    }

    // ========================================================================
    // 프록시
    // ========================================================================

    /// 공개 capability 만 노출하는 읽기 전용 뷰
    pub fn to_proxy(&self) -> PluginProxy {
        PluginProxy {
            name: self.name.clone(),
            exports: self.config.exports(),
        }
    }
}

impl std::fmt::Debug for PluginRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRuntime")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("disabled", &self.is_disabled())
            .field("dependencies", &self.meta.dependencies)
            .finish()
    }
}

// ============================================================================
// PluginProxy
// ============================================================================

/// 플러그인 capability 프록시
///
/// 설정 객체 내부나 매니저에는 접근할 수 없고, 플러그인이 공개한 `exports` 만
/// 타입으로 꺼낼 수 있습니다.
#[derive(Clone)]
pub struct PluginProxy {
    name: String,
    exports: Option<Exports>,
}

impl PluginProxy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_exports(&self) -> bool {
        self.exports.is_some()
    }

    /// 공개 capability 를 구체 타입으로 가져오기
    pub fn exports<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.exports
            .as_ref()
            .and_then(|exports| Arc::clone(exports).downcast::<T>().ok())
    }
}

impl std::fmt::Debug for PluginProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginProxy")
            .field("name", &self.name)
            .field("has_exports", &self.has_exports())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::context::PluginContextFactory;
    use crate::plugin::traits::PluginConfig;
    use std::sync::atomic::AtomicUsize;

    fn runtime(config: PluginConfig) -> PluginRuntime {
        let meta = PluginMeta::default();
        let ctx = PluginContextFactory::for_tests().build(Some("demo"), &meta);
        PluginRuntime::new("demo", meta, config.boxed(), ctx)
    }

    fn counting(counter: &Arc<AtomicUsize>) -> impl Fn() -> futures::future::Ready<Result<()>> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_init_runs_once() {
        let inits = Arc::new(AtomicUsize::new(0));
        let unit = runtime(PluginConfig::new().on_init(counting(&inits)));

        unit.init().await.unwrap();
        unit.init().await.unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(unit.is_initialized());
    }

    #[tokio::test]
    async fn test_concurrent_init_runs_once() {
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&inits);
        let unit = runtime(PluginConfig::new().on_init(move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        let (a, b) = tokio::join!(unit.init(), unit.init());
        a.unwrap();
        b.unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_failure_is_hook_error() {
        let unit = runtime(
            PluginConfig::new().on_init(|| async { Err(Error::Internal("boom".into())) }),
        );

        let err = unit.init().await.unwrap_err();
        assert!(matches!(err, Error::HookExecution { ref hook, .. } if hook == "init"));
        assert_eq!(unit.state(), PluginState::Registered);
    }

    #[tokio::test]
    async fn test_destroy_idempotent_without_init() {
        let destroys = Arc::new(AtomicUsize::new(0));
        let unit = runtime(PluginConfig::new().on_destroy(counting(&destroys)));

        unit.destroy().await.unwrap();
        unit.destroy().await.unwrap();

        assert_eq!(destroys.load(Ordering::SeqCst), 1);
        assert!(unit.is_destroyed());
        assert!(matches!(unit.init().await, Err(Error::PluginDestroyed(_))));
    }

    #[tokio::test]
    async fn test_destroy_failure_still_terminal() {
        let unit = runtime(
            PluginConfig::new().on_destroy(|| async { Err(Error::Internal("leak".into())) }),
        );

        assert!(unit.destroy().await.is_err());
        assert!(unit.is_destroyed());
        assert!(unit.destroy().await.is_ok());
    }

    fn hanging() -> PluginConfig {
        PluginConfig::new()
            .on_init(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .on_destroy(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_timeout_rolls_back_state() {
        let unit = runtime(hanging());

        let err = unit
            .init_within(Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::HookExecution { ref hook, ref message, .. }
                if hook == "init" && message.contains("timed out")
        ));
        assert_eq!(unit.state(), PluginState::Registered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_timeout_still_terminal() {
        let unit = runtime(hanging());

        let err = unit
            .destroy_within(Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HookExecution { ref hook, .. } if hook == "destroy"));
        assert!(unit.is_destroyed());
        assert!(matches!(unit.init().await, Err(Error::PluginDestroyed(_))));
    }

    #[test]
    fn test_proxy_exposes_exports_only() {
        let unit = runtime(PluginConfig::new().with_exports(String::from("api")));
        unit.set_disabled(true);

        let proxy = unit.to_proxy();
        assert_eq!(proxy.name(), "demo");
        assert_eq!(proxy.exports::<String>().as_deref().map(String::as_str), Some("api"));
        assert!(proxy.exports::<u32>().is_none());
        assert!(unit.is_disabled());
    }
}
