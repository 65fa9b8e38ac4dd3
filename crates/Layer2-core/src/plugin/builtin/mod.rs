//! Builtin Plugins - 엔진 내장 플러그인
//!
//! ## 플러그인 목록
//!
//! - `default-setters` - 기본 setter (String/Number/Bool/Select/Json) 등록

pub mod setters;

pub use setters::{default_setters, SetterCatalog, DEFAULT_SETTERS_PLUGIN};

use super::traits::PluginFactory;

/// 모든 builtin 플러그인 팩토리 생성
pub fn all_factories() -> Vec<Box<dyn PluginFactory>> {
    vec![Box::new(default_setters())]
}
