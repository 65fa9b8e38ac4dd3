//! Default setters - 엔진 기본 setter 등록 플러그인

use crate::plugin::context::{PluginContext, SetterDescriptor};
use crate::plugin::manifest::{
    PluginMeta, PreferenceDeclaration, PreferenceProperty, PreferenceValueType,
};
use crate::plugin::traits::{Exports, FnFactory, Plugin, PluginFactory};
use async_trait::async_trait;
use lowcode_foundation::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// 플러그인 이름
pub const DEFAULT_SETTERS_PLUGIN: &str = "default-setters";

/// 기존 setter 교체 여부 preference 키
const REPLACE_EXISTING_KEY: &str = "replaceExisting";

/// 기본 setter 목록
fn stock_setters() -> Vec<SetterDescriptor> {
    vec![
        SetterDescriptor::new("StringSetter", "Input")
            .with_title("Text")
            .with_initial_value(json!("")),
        SetterDescriptor::new("NumberSetter", "NumberPicker")
            .with_title("Number")
            .with_initial_value(json!(0)),
        SetterDescriptor::new("BoolSetter", "Switch")
            .with_title("Boolean")
            .with_initial_value(json!(false)),
        SetterDescriptor::new("SelectSetter", "Select").with_title("Select"),
        SetterDescriptor::new("JsonSetter", "CodeEditor")
            .with_title("JSON")
            .with_initial_value(json!({})),
    ]
}

/// 공개 capability: 이 플러그인이 제공하는 setter 이름 목록
#[derive(Debug, Clone)]
pub struct SetterCatalog {
    names: Vec<String>,
}

impl SetterCatalog {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

struct DefaultSetters {
    ctx: PluginContext,
    catalog: Arc<SetterCatalog>,
}

#[async_trait]
impl Plugin for DefaultSetters {
    async fn init(&self) -> Result<()> {
        let replace = matches!(
            self.ctx
                .preference()
                .get_or_declared_default(REPLACE_EXISTING_KEY),
            Some(Value::Bool(true))
        );

        let setters = self.ctx.setters();
        let mut registered = 0;
        for setter in stock_setters() {
            if !replace && setters.has_setter(&setter.name) {
                debug!("Setter {} already registered, keeping host version", setter.name);
                continue;
            }
            setters.register_setter(setter);
            registered += 1;
        }

        info!("Registered {} default setters", registered);
        Ok(())
    }

    fn exports(&self) -> Option<Exports> {
        Some(Arc::clone(&self.catalog) as Exports)
    }
}

/// 기본 setter 플러그인 메타데이터
fn meta() -> PluginMeta {
    PluginMeta::new()
        .with_description("Registers the stock property setters")
        .with_event_prefix("setters")
        .with_preference_declaration(
            PreferenceDeclaration::new("Default setters").with_property(
                PreferenceProperty::new(REPLACE_EXISTING_KEY, PreferenceValueType::Boolean)
                    .with_description("Replace setters the host already registered")
                    .with_default(json!(false)),
            ),
        )
}

/// 기본 setter 플러그인 팩토리
pub fn default_setters() -> impl PluginFactory {
    FnFactory::new(|ctx, _options| {
        let catalog = SetterCatalog {
            names: stock_setters().into_iter().map(|s| s.name).collect(),
        };
        Ok(Box::new(DefaultSetters {
            ctx,
            catalog: Arc::new(catalog),
        }) as Box<dyn Plugin>)
    })
    .named(DEFAULT_SETTERS_PLUGIN)
    .with_meta(meta())
}
