//! Plugin traits - 핵심 플러그인 인터페이스
//!
//! - `PluginFactory`: 컨텍스트와 옵션을 받아 플러그인 설정(`Plugin`)을 만드는 팩토리
//! - `Plugin`: 팩토리가 만든 설정 객체. 라이프사이클 훅과 공개 capability 를 가짐
//!
//! 클로저 기반으로 간단히 만들 수 있도록 `FnFactory` / `PluginConfig` 를 제공합니다.

use super::context::PluginContext;
use super::manifest::PluginMeta;
use async_trait::async_trait;
use futures::future::BoxFuture;
use lowcode_foundation::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// 플러그인이 외부에 공개하는 capability 객체
pub type Exports = Arc<dyn Any + Send + Sync>;

/// 팩토리에 전달되는 (필터링된) 옵션
pub type PluginOptions = Map<String, Value>;

// ============================================================================
// Plugin Trait - 팩토리가 반환하는 설정 객체
// ============================================================================

/// 플러그인 설정
///
/// 모든 훅은 선택 사항입니다.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 설정에 포함된 이름 (팩토리가 이름을 선언하지 않은 경우 사용)
    fn name(&self) -> Option<&str> {
        None
    }

    /// 초기화 훅 - 매니저의 init 패스에서 의존성 순서대로 한 번 호출
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// 정리 훅
    async fn destroy(&self) -> Result<()> {
        Ok(())
    }

    /// 다른 플러그인/호스트에 공개할 capability
    fn exports(&self) -> Option<Exports> {
        None
    }
}

// ============================================================================
// PluginFactory Trait
// ============================================================================

/// 플러그인 팩토리
pub trait PluginFactory: Send + Sync {
    /// 팩토리에 선언된 플러그인 이름
    fn plugin_name(&self) -> Option<&str> {
        None
    }

    /// 플러그인 메타데이터
    fn meta(&self) -> PluginMeta {
        PluginMeta::default()
    }

    /// 설정 객체 생성
    fn create(&self, ctx: PluginContext, options: PluginOptions) -> Result<Box<dyn Plugin>>;
}

/// 클로저 기반 팩토리
pub struct FnFactory<F> {
    name: Option<String>,
    meta: PluginMeta,
    create: F,
}

impl<F> FnFactory<F>
where
    F: Fn(PluginContext, PluginOptions) -> Result<Box<dyn Plugin>> + Send + Sync,
{
    pub fn new(create: F) -> Self {
        Self {
            name: None,
            meta: PluginMeta::default(),
            create,
        }
    }

    /// 빌더 패턴: 팩토리 이름 선언
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 빌더 패턴: 메타데이터 설정
    pub fn with_meta(mut self, meta: PluginMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl<F> PluginFactory for FnFactory<F>
where
    F: Fn(PluginContext, PluginOptions) -> Result<Box<dyn Plugin>> + Send + Sync,
{
    fn plugin_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn meta(&self) -> PluginMeta {
        self.meta.clone()
    }

    fn create(&self, ctx: PluginContext, options: PluginOptions) -> Result<Box<dyn Plugin>> {
        (self.create)(ctx, options)
    }
}

// ============================================================================
// PluginConfig - 클로저 기반 설정
// ============================================================================

type Hook = Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// 훅을 클로저로 지정하는 설정 객체
#[derive(Default)]
pub struct PluginConfig {
    name: Option<String>,
    init: Option<Hook>,
    destroy: Option<Hook>,
    exports: Option<Exports>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 설정 이름
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 빌더 패턴: init 훅
    pub fn on_init<H, Fut>(mut self, hook: H) -> Self
    where
        H: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.init = Some(Box::new(move || Box::pin(hook())));
        self
    }

    /// 빌더 패턴: destroy 훅
    pub fn on_destroy<H, Fut>(mut self, hook: H) -> Self
    where
        H: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.destroy = Some(Box::new(move || Box::pin(hook())));
        self
    }

    /// 빌더 패턴: 공개 capability
    pub fn with_exports<T: Any + Send + Sync>(mut self, exports: T) -> Self {
        self.exports = Some(Arc::new(exports));
        self
    }

    pub fn boxed(self) -> Box<dyn Plugin> {
        Box::new(self)
    }
}

#[async_trait]
impl Plugin for PluginConfig {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn init(&self) -> Result<()> {
        match &self.init {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }

    async fn destroy(&self) -> Result<()> {
        match &self.destroy {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }

    fn exports(&self) -> Option<Exports> {
        self.exports.clone()
    }
}

// ============================================================================
// RegisterOptions
// ============================================================================

/// `register` 동작 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOptions {
    /// 같은 이름의 기존 플러그인을 교체 허용
    #[serde(default, rename = "override")]
    pub override_existing: bool,

    /// 등록 직후 init 실행
    #[serde(default)]
    pub auto_init: bool,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self) -> Self {
        self.override_existing = true;
        self
    }

    pub fn with_auto_init(mut self) -> Self {
        self.auto_init = true;
        self
    }
}
