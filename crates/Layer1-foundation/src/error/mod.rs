//! Error types for the low-code engine
//!
//! 플러그인 시스템 전체의 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// 엔진 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 등록 관련
    // ========================================================================
    /// 플러그인 이름을 알 수 없거나 메타데이터가 잘못됨
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 같은 이름의 플러그인이 이미 등록됨 (override 미지정)
    #[error("Plugin with name {0} exists")]
    DuplicatePlugin(String),

    /// 플러그인이 요구하는 엔진 버전을 호스트가 만족하지 못함
    #[error("Plugin {plugin} skipped, engine check failed: requires {required}, host is {host}")]
    IncompatibleVersion {
        plugin: String,
        required: String,
        host: String,
    },

    // ========================================================================
    // 초기화 관련
    // ========================================================================
    /// 의존성 누락 또는 순환 의존성
    #[error("Plugin dependencies are missing or cyclic: {}", missing.join(", "))]
    MissingDependency {
        missing: Vec<String>,
        cycles: Vec<Vec<String>>,
    },

    /// init/destroy 훅 실행 실패
    #[error("Plugin {plugin} {hook} hook failed: {message}")]
    HookExecution {
        plugin: String,
        hook: String,
        message: String,
    },

    /// 이미 destroy 된 플러그인에 대한 호출
    #[error("Plugin {0} has been destroyed")]
    PluginDestroyed(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// register 단계에서 발생하는 에러인지 확인
    ///
    /// 이 에러들은 레지스트리를 변경하지 않고 등록을 중단시킵니다.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::DuplicatePlugin(_) | Error::IncompatibleVersion { .. }
        )
    }

    /// 훅 실행 에러 생성 헬퍼
    pub fn hook_execution(
        plugin: impl Into<String>,
        hook: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::HookExecution {
            plugin: plugin.into(),
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// 버전 불일치 에러 생성 헬퍼
    pub fn incompatible_version(
        plugin: impl Into<String>,
        required: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Error::IncompatibleVersion {
            plugin: plugin.into(),
            required: required.into(),
            host: host.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
