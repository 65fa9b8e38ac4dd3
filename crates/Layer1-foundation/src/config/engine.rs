//! Engine Config - 엔진 공용 설정 저장소
//!
//! 호스트와 모든 플러그인이 공유하는 key-value 설정.
//! `ENGINE_VERSION` 키는 호스트 자신의 semver 버전을 위해 예약되어 있습니다.

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// 호스트 엔진 버전용 예약 키
pub const ENGINE_VERSION_KEY: &str = "ENGINE_VERSION";

/// 엔진 설정 저장소
///
/// `Clone` 은 같은 저장소를 공유하는 핸들을 만듭니다.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    values: Arc<RwLock<Map<String, Value>>>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 호스트 버전을 지정하여 생성
    pub fn with_engine_version(version: impl Into<String>) -> Self {
        let config = Self::new();
        config.set_engine_version(version);
        config
    }

    /// JSON 객체에서 생성
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                values: Arc::new(RwLock::new(map)),
            }),
            other => Err(Error::Configuration(format!(
                "Engine config must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// JSON 파일에서 로드
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded engine config from {}", path.display());
        Self::from_json(value)
    }

    // ========================================================================
    // 조회 / 설정
    // ========================================================================

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// 타입 변환하여 조회 (변환 실패 시 None)
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!("Engine config set: {}", key);
        self.values.write().insert(key, value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    /// 여러 값을 한 번에 설정
    pub fn set_all(&self, values: Map<String, Value>) {
        let mut current = self.values.write();
        for (key, value) in values {
            current.insert(key, value);
        }
    }

    // ========================================================================
    // 엔진 버전
    // ========================================================================

    /// 호스트 엔진 버전 (문자열 값일 때만)
    pub fn engine_version(&self) -> Option<String> {
        self.values
            .read()
            .get(ENGINE_VERSION_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_engine_version(&self, version: impl Into<String>) {
        self.set(ENGINE_VERSION_KEY, Value::String(version.into()));
    }

    /// 현재 설정 스냅샷
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.read().clone())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
