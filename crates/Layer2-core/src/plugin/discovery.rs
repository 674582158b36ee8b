//! Plugin Discovery - 디렉토리 트리에서 플러그인 매니페스트 발견
//!
//! `*_plugin.toml` 파일마다 모듈 이름을 읽고, 컴파일된 [`ModuleTable`]에서
//! 등록 루틴을 찾아 레지스트리에 실행합니다. 심볼릭 링크를 따라가며
//! `.gitignore` 등의 필터는 적용하지 않습니다.

use super::manifest::{is_manifest, PluginManifest};
use crate::component::{ComponentRegistry, RegistrationRoutine};
use harness_foundation::{Error, Result};
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// ModuleTable - import 가능한 모듈 목록
// ============================================================================

/// 모듈 이름 -> 등록 루틴
#[derive(Clone, Default)]
pub struct ModuleTable {
    modules: BTreeMap<String, RegistrationRoutine>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 스타일 추가
    pub fn with(mut self, name: impl Into<String>, routine: RegistrationRoutine) -> Self {
        self.insert(name, routine);
        self
    }

    /// 모듈 추가 (같은 이름은 교체)
    pub fn insert(&mut self, name: impl Into<String>, routine: RegistrationRoutine) {
        self.modules.insert(name.into(), routine);
    }

    pub fn get(&self, name: &str) -> Option<RegistrationRoutine> {
        self.modules.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}

// ============================================================================
// DiscoveryReport
// ============================================================================

/// 발견 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// 탐색한 루트
    pub root: PathBuf,

    /// 처리한 매니페스트 (정렬된 경로 순서)
    pub manifests: Vec<PathBuf>,

    /// import한 모듈 (처음 import된 순서, 중복 없음)
    pub modules: Vec<String>,
}

impl DiscoveryReport {
    fn record(&mut self, path: PathBuf, module: String) {
        self.manifests.push(path);
        if !self.modules.contains(&module) {
            self.modules.push(module);
        }
    }
}

// ============================================================================
// PluginDiscovery
// ============================================================================

/// 플러그인 발견기
pub struct PluginDiscovery<'a> {
    modules: &'a ModuleTable,
    registry: &'a ComponentRegistry,
}

impl<'a> PluginDiscovery<'a> {
    pub fn new(modules: &'a ModuleTable, registry: &'a ComponentRegistry) -> Self {
        Self { modules, registry }
    }

    /// 매니페스트 파일 목록 (정렬됨)
    ///
    /// 읽을 수 없는 디렉토리나 링크 순환은 경고 후 건너뜁니다.
    /// 매니페스트 이름을 가진 경로를 읽을 수 없으면 (끊어진 링크 등) import 에러입니다.
    pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkBuilder::new(root)
            .follow_links(true)
            .standard_filters(false)
            .build();

        let mut manifests = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => match walk_error_path(&e) {
                    Some(path) if is_manifest(path) => {
                        return Err(Error::discovery_import(path, e.to_string()));
                    }
                    _ => {
                        warn!("Skipping unreadable plugin path: {}", e);
                        continue;
                    }
                },
            };

            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if is_file && is_manifest(entry.path()) {
                manifests.push(entry.into_path());
            }
        }

        manifests.sort();
        Ok(manifests)
    }

    /// 루트 아래 모든 플러그인 import
    ///
    /// 첫 import 실패에서 중단합니다. 루트가 없으면 빈 결과를 반환합니다.
    pub fn discover(&self, root: &Path) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport {
            root: root.to_path_buf(),
            ..Default::default()
        };

        if !root.is_dir() {
            warn!("Plugin directory not found: {}", root.display());
            return Ok(report);
        }

        for path in Self::scan(root)? {
            let module = self.import(&path)?;
            report.record(path, module);
        }

        info!(
            "Discovered {} plugin module(s) from {} manifest(s) under {}",
            report.modules.len(),
            report.manifests.len(),
            root.display()
        );
        Ok(report)
    }

    /// 매니페스트 하나 import
    pub fn import(&self, path: &Path) -> Result<String> {
        let manifest = PluginManifest::load(path)?;
        let module = manifest
            .module_name(path)
            .ok_or_else(|| Error::discovery_import(path, "manifest does not name a module"))?;

        let routine = self.modules.get(&module).ok_or_else(|| {
            Error::discovery_import(path, format!("unknown plugin module '{}'", module))
        })?;

        self.registry
            .register_module(&module, routine)
            .map_err(|e| Error::discovery_import(path, e.to_string()))?;

        debug!("Imported plugin module {} from {}", module, path.display());
        Ok(module)
    }
}

/// 워커 에러가 가리키는 경로 (링크 순환은 제외)
fn walk_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentClass, ComponentManager};
    use std::fs;
    use tempfile::TempDir;

    trait Marker: Send + Sync {}
    crate::declare_interface!(Marker);

    struct Alpha;
    impl Component for Alpha {
        const NAME: &'static str = "alpha";
        fn create(_manager: &ComponentManager) -> Result<Self> {
            Ok(Alpha)
        }
    }
    impl Marker for Alpha {}

    fn register_alpha(registry: &ComponentRegistry) -> Result<()> {
        registry.register(ComponentClass::of::<Alpha>().implements::<dyn Marker>(|c| c).build())?;
        Ok(())
    }

    fn register_broken(_registry: &ComponentRegistry) -> Result<()> {
        Err(Error::Registration("bad declaration".into()))
    }

    fn table() -> ModuleTable {
        ModuleTable::new()
            .with("alpha", register_alpha)
            .with("broken", register_broken)
    }

    #[test]
    fn test_module_table() {
        let table = table();
        assert_eq!(table.names(), vec!["alpha", "broken"]);
        assert!(table.contains("alpha"));
        assert!(table.get("gamma").is_none());
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested/.hidden")).unwrap();
        fs::write(dir.path().join("z_plugin.toml"), "").unwrap();
        fs::write(dir.path().join("nested/b_plugin.toml"), "").unwrap();
        fs::write(dir.path().join("nested/.hidden/a_plugin.toml"), "").unwrap();
        fs::write(dir.path().join("notes.toml"), "").unwrap();
        // 디렉토리 이름은 매니페스트가 아님
        fs::create_dir_all(dir.path().join("dir_plugin.toml")).unwrap();

        let found = PluginDiscovery::scan(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("nested/.hidden/a_plugin.toml"),
                PathBuf::from("nested/b_plugin.toml"),
                PathBuf::from("z_plugin.toml"),
            ]
        );
    }

    #[test]
    fn test_discover_imports_modules() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alpha_plugin.toml"), "").unwrap();
        fs::write(dir.path().join("again_plugin.toml"), "module = \"alpha\"").unwrap();

        let registry = ComponentRegistry::new();
        let table = table();
        let report = PluginDiscovery::new(&table, &registry)
            .discover(dir.path())
            .unwrap();

        assert_eq!(report.manifests.len(), 2);
        assert_eq!(report.modules, vec!["alpha"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_module_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gamma_plugin.toml"), "").unwrap();

        let registry = ComponentRegistry::new();
        let table = table();
        let err = PluginDiscovery::new(&table, &registry)
            .discover(dir.path())
            .unwrap_err();

        assert!(matches!(err, Error::DiscoveryImport { .. }));
        assert!(err.to_string().contains("unknown plugin module 'gamma'"));
    }

    #[test]
    fn test_registration_error_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken_plugin.toml"), "").unwrap();

        let registry = ComponentRegistry::new();
        let table = table();
        let err = PluginDiscovery::new(&table, &registry)
            .discover(dir.path())
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("bad declaration"));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = ComponentRegistry::new();
        let table = table();

        let report = PluginDiscovery::new(&table, &registry)
            .discover(&dir.path().join("absent"))
            .unwrap();

        assert!(report.manifests.is_empty());
        assert!(registry.is_empty());
    }
}
