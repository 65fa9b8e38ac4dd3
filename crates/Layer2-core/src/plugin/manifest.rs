//! Plugin Manifest - 플러그인 메타데이터 정의
//!
//! 플러그인 팩토리가 선언하는 정적 메타데이터:
//! 의존성, 요구 엔진 버전, 사용자 preference 스키마, 이벤트 prefix.
//! JSON 표기는 camelCase (`preferenceDeclaration`, `engines.lowcodeEngine`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 플러그인 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMeta {
    /// 먼저 초기화되어야 하는 플러그인 이름 목록
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// 요구하는 호스트 엔진 버전
    #[serde(default)]
    pub engines: PluginEngines,

    /// 사용자 preference 스키마
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference_declaration: Option<PreferenceDeclaration>,

    /// 스코프 이벤트 prefix (기본값 `common`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_prefix: Option<String>,

    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PluginMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 의존성 추가
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// 빌더 패턴: 요구 엔진 버전 범위 설정
    pub fn with_engine_range(mut self, range: impl Into<String>) -> Self {
        self.engines.lowcode_engine = Some(range.into());
        self
    }

    /// 빌더 패턴: preference 스키마 설정
    pub fn with_preference_declaration(mut self, declaration: PreferenceDeclaration) -> Self {
        self.preference_declaration = Some(declaration);
        self
    }

    /// 빌더 패턴: 이벤트 prefix 설정
    pub fn with_event_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.event_prefix = Some(prefix.into());
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// preference 스키마에 선언된 키인지 확인
    pub fn is_valid_preference_key(&self, key: &str) -> bool {
        self.preference_declaration
            .as_ref()
            .is_some_and(|decl| decl.has_key(key))
    }
}

/// 엔진 요구사항
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEngines {
    /// semver 범위 (예: `^1.0.0`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowcode_engine: Option<String>,
}

// ============================================================================
// Preference 스키마
// ============================================================================

/// 플러그인이 받는 사용자 설정 스키마
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDeclaration {
    /// 표시 제목
    #[serde(default)]
    pub title: String,

    /// 선언된 속성
    #[serde(default)]
    pub properties: Vec<PreferenceProperty>,
}

impl PreferenceDeclaration {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            properties: vec![],
        }
    }

    pub fn with_property(mut self, property: PreferenceProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.key == key)
    }

    pub fn property(&self, key: &str) -> Option<&PreferenceProperty> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// preference 속성 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProperty {
    pub key: String,

    #[serde(rename = "type")]
    pub value_type: PreferenceValueType,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PreferenceProperty {
    pub fn new(key: impl Into<String>, value_type: PreferenceValueType) -> Self {
        Self {
            key: key.into(),
            value_type,
            description: String::new(),
            default: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// preference 값 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl PreferenceValueType {
    /// 값이 선언된 타입과 맞는지
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// 등록 옵션을 preference 스키마에 선언된 키로만 제한
///
/// 스키마가 없으면 어떤 키도 통과하지 않습니다.
pub fn filter_valid_options(
    options: Option<Map<String, Value>>,
    declaration: Option<&PreferenceDeclaration>,
) -> Map<String, Value> {
    let (Some(options), Some(declaration)) = (options, declaration) else {
        return Map::new();
    };

    options
        .into_iter()
        .filter(|(key, _)| declaration.has_key(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declaration() -> PreferenceDeclaration {
        PreferenceDeclaration::new("Outline")
            .with_property(PreferenceProperty::new("width", PreferenceValueType::Number))
            .with_property(
                PreferenceProperty::new("theme", PreferenceValueType::String)
                    .with_default(json!("light")),
            )
    }

    #[test]
    fn test_meta_builder() {
        let meta = PluginMeta::new()
            .with_dependency("designer")
            .with_engine_range("^1.0.0")
            .with_event_prefix("outline")
            .with_preference_declaration(declaration());

        assert_eq!(meta.dependencies, vec!["designer"]);
        assert_eq!(meta.engines.lowcode_engine.as_deref(), Some("^1.0.0"));
        assert!(meta.is_valid_preference_key("width"));
        assert!(!meta.is_valid_preference_key("height"));
    }

    #[test]
    fn test_meta_json_shape() {
        let meta: PluginMeta = serde_json::from_value(json!({
            "dependencies": ["a"],
            "engines": { "lowcodeEngine": "^2.0.0" },
            "preferenceDeclaration": {
                "title": "Demo",
                "properties": [{ "key": "enabled", "type": "boolean" }]
            },
            "eventPrefix": "demo"
        }))
        .unwrap();

        assert_eq!(meta.engines.lowcode_engine.as_deref(), Some("^2.0.0"));
        assert_eq!(meta.event_prefix.as_deref(), Some("demo"));
        assert!(meta.is_valid_preference_key("enabled"));
    }

    #[test]
    fn test_filter_valid_options() {
        let mut options = Map::new();
        options.insert("width".into(), json!(240));
        options.insert("unknown".into(), json!(true));

        let decl = declaration();
        let filtered = filter_valid_options(Some(options.clone()), Some(&decl));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.get("width"), Some(&json!(240)));

        // 스키마 없음 → 모두 제거
        assert!(filter_valid_options(Some(options), None).is_empty());
    }

    #[test]
    fn test_value_type_accepts() {
        assert!(PreferenceValueType::Number.accepts(&json!(1.5)));
        assert!(!PreferenceValueType::Boolean.accepts(&json!("true")));
    }
}
