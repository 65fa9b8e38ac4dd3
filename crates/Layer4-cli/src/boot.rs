//! Boot - 설정 파일로 플러그인 런타임을 부팅하고 결과 출력
//!
//! 입력 파일:
//! - engine config: JSON 객체 (`ENGINE_VERSION` 등)
//! - preferences: `{ "<plugin>": { "<key>": value } }`
//! - manifest: 메타데이터만 가진 플러그인 목록 (`[{ "name": ..., "dependencies": [...] }]`)

use anyhow::{Context, Result};
use lowcode_core::plugin::{
    builtin, FnFactory, InitReport, PluginConfig, PluginFactory, PluginManager, PluginMeta,
    PreferenceMap, RegisterOptions,
};
use lowcode_foundation::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// boot 명령 옵션
#[derive(Debug, Default)]
pub struct BootOptions {
    pub config: Option<PathBuf>,
    pub preferences: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub engine_version: Option<String>,
    pub disable: Vec<String>,
}

/// 매니페스트에 선언된 플러그인 (훅 없음)
#[derive(Debug, Deserialize)]
pub struct DeclaredPlugin {
    pub name: String,

    #[serde(flatten)]
    pub meta: PluginMeta,
}

impl DeclaredPlugin {
    fn into_factory(self) -> impl PluginFactory {
        FnFactory::new(|_ctx, _opts| Ok(PluginConfig::new().boxed()))
            .named(self.name)
            .with_meta(self.meta)
    }
}

/// engine config 로드 (`--engine-version` 이 파일 값보다 우선)
pub fn load_engine_config(path: Option<&Path>, engine_version: Option<&str>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::new(),
    };
    if let Some(version) = engine_version {
        config.set_engine_version(version);
    }
    Ok(config)
}

pub fn load_preferences(path: &Path) -> Result<PreferenceMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse preferences {}", path.display()))
}

pub fn load_manifest(path: &Path) -> Result<Vec<DeclaredPlugin>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}

/// 부팅 실행
///
/// 등록 단계의 에러(중복/버전 불일치)는 해당 플러그인만 건너뜁니다.
pub async fn run(options: BootOptions) -> Result<InitReport> {
    let config = load_engine_config(options.config.as_deref(), options.engine_version.as_deref())?;
    let preferences = options
        .preferences
        .as_deref()
        .map(load_preferences)
        .transpose()?;
    let declared = match options.manifest.as_deref() {
        Some(path) => load_manifest(path)?,
        None => Vec::new(),
    };

    let manager = PluginManager::new(config);
    info!(
        "Booting engine {}",
        manager
            .engine_config()
            .engine_version()
            .unwrap_or_else(|| "(unversioned)".to_string())
    );

    for factory in builtin::all_factories() {
        manager
            .register(factory.as_ref(), None, RegisterOptions::default())
            .await?;
    }

    for plugin in declared {
        let factory = plugin.into_factory();
        match manager
            .register(&factory, None, RegisterOptions::default())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_registration_error() => {
                warn!("Skipping plugin: {}", e);
                println!("  ✗ {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    for name in &options.disable {
        if !manager.set_disabled(name, true).await {
            warn!("Cannot disable unknown plugin {}", name);
        }
    }

    let report = manager.init(preferences).await?;
    print_report(&manager, &report);

    manager.dispose().await;
    Ok(report)
}

fn print_report(manager: &PluginManager, report: &InitReport) {
    println!("\n🔌 Plugins\n");
    println!("{:<24} {:<14} {:<9} {}", "Name", "State", "Disabled", "Dependencies");
    println!("{}", "-".repeat(72));

    for plugin in manager.get_all() {
        println!(
            "{:<24} {:<14} {:<9} {}",
            plugin.name(),
            plugin.state().to_string(),
            if plugin.is_disabled() { "yes" } else { "" },
            plugin.dependencies().join(", ")
        );
    }

    for failure in &report.failed {
        println!("  ✗ {}: {}", failure.plugin, failure.error);
    }

    let summary = manager.summary();
    println!(
        "\n{} registered, {} initialized, {} disabled, {} failed",
        summary.total,
        summary.initialized,
        summary.disabled,
        report.failed.len()
    );
}
