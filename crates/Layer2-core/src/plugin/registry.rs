//! Plugin Registry - 플러그인 저장소
//!
//! 등록 순서(`plugins`)와 이름 인덱스(`plugins_map`)를 함께 보관합니다.
//! 두 컬렉션은 이 타입의 메서드로만 변경되므로 항상 같은 유닛 집합을 가리킵니다.
//! 쓰기 경로는 매니저만 가지며, 플러그인에는 `PluginDirectory` 읽기 뷰만 제공됩니다.

use super::runtime::{PluginProxy, PluginRuntime};
use lowcode_foundation::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 플러그인 레지스트리
#[derive(Default)]
pub struct PluginRegistry {
    /// 등록 순서
    plugins: Vec<Arc<PluginRuntime>>,

    /// 이름 → 유닛
    plugins_map: HashMap<String, Arc<PluginRuntime>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 유닛 추가 (같은 이름이 있으면 DuplicatePlugin)
    pub fn insert(&mut self, runtime: Arc<PluginRuntime>) -> Result<()> {
        let name = runtime.name().to_string();
        if self.plugins_map.contains_key(&name) {
            return Err(Error::DuplicatePlugin(name));
        }

        self.plugins.push(Arc::clone(&runtime));
        self.plugins_map.insert(name.clone(), runtime);
        debug!("Registry insert: {} (size {})", name, self.plugins.len());
        Ok(())
    }

    /// 유닛 제거
    pub fn remove(&mut self, name: &str) -> Option<Arc<PluginRuntime>> {
        let runtime = self.plugins_map.remove(name)?;
        self.plugins.retain(|p| !Arc::ptr_eq(p, &runtime));
        debug!("Registry remove: {} (size {})", name, self.plugins.len());
        Some(runtime)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginRuntime>> {
        self.plugins_map.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins_map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// 등록 순서대로 모든 유닛
    pub fn all(&self) -> Vec<Arc<PluginRuntime>> {
        self.plugins.clone()
    }

    /// 등록 순서대로 이름
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// 이름 → 의존성 (Sequencer 입력)
    pub fn dependency_map(&self) -> HashMap<String, Vec<String>> {
        self.plugins
            .iter()
            .map(|p| (p.name().to_string(), p.dependencies().to_vec()))
            .collect()
    }

    /// 모든 유닛 제거 후 반환
    pub fn drain(&mut self) -> Vec<Arc<PluginRuntime>> {
        self.plugins_map.clear();
        std::mem::take(&mut self.plugins)
    }
}

// ============================================================================
// PluginDirectory - 플러그인용 읽기 뷰
// ============================================================================

/// 다른 플러그인의 프록시를 이름으로 조회하는 읽기 전용 뷰
///
/// 열거나 변경은 불가능합니다. 레지스트리는 약한 참조로만 가리키므로
/// 매니저가 drop 되면 모든 조회는 비어 있는 결과를 반환합니다.
#[derive(Clone, Default)]
pub struct PluginDirectory {
    registry: Weak<RwLock<PluginRegistry>>,
}

impl PluginDirectory {
    pub(crate) fn new(registry: &Arc<RwLock<PluginRegistry>>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }

    /// 활성 플러그인의 프록시 (비활성/미등록이면 None)
    pub fn get(&self, name: &str) -> Option<PluginProxy> {
        let registry = self.registry.upgrade()?;
        let runtime = registry.read().get(name)?;
        if runtime.is_disabled() {
            return None;
        }
        Some(runtime.to_proxy())
    }

    /// 등록 여부 (비활성 포함)
    pub fn has(&self, name: &str) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let found = registry.read().contains(name);
        found
    }
}
