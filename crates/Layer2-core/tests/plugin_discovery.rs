//! 플러그인 발견 통합 테스트 - 심볼릭 링크, import 실패, on_plugins_loaded
//!
//! `cargo test -p harness-core --test plugin_discovery`

use harness_core::{
    Component, ComponentClass, ComponentManager, ComponentRegistry, Error, ModuleTable,
    PluginManager, PluginPhase, PluginsLoaded, Result,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// 발견 완료 시 보이는 레지스트리 크기를 기록
struct Watcher {
    seen: AtomicUsize,
}

impl Component for Watcher {
    const NAME: &'static str = "watcher";

    fn create(_manager: &ComponentManager) -> Result<Self> {
        Ok(Self {
            seen: AtomicUsize::new(0),
        })
    }
}

impl PluginsLoaded for Watcher {
    fn on_plugins_loaded(&self, registry: &ComponentRegistry) -> Result<()> {
        self.seen.store(registry.len(), Ordering::SeqCst);
        Ok(())
    }
}

struct Extra;

impl Component for Extra {
    const NAME: &'static str = "extra";

    fn create(_manager: &ComponentManager) -> Result<Self> {
        Ok(Extra)
    }
}

impl PluginsLoaded for Extra {
    fn on_plugins_loaded(&self, _registry: &ComponentRegistry) -> Result<()> {
        Err(Error::Internal("extra cannot start".into()))
    }
}

fn register_watcher(registry: &ComponentRegistry) -> Result<()> {
    registry.register(
        ComponentClass::of::<Watcher>()
            .implements::<dyn PluginsLoaded>(|c| c)
            .build(),
    )?;
    Ok(())
}

fn register_extra(registry: &ComponentRegistry) -> Result<()> {
    registry.register(
        ComponentClass::of::<Extra>()
            .implements::<dyn PluginsLoaded>(|c| c)
            .build(),
    )?;
    Ok(())
}

fn plugins() -> PluginManager {
    let modules = ModuleTable::new()
        .with("watcher", register_watcher)
        .with("extra", register_extra);
    PluginManager::new(Arc::new(ComponentRegistry::new()), modules)
}

#[test]
fn test_discover_broadcasts_plugins_loaded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("watcher_plugin.toml"), "").unwrap();

    let plugins = plugins();
    let report = plugins.discover(dir.path()).unwrap();

    assert_eq!(report.modules, vec!["watcher"]);
    assert_eq!(plugins.state(), PluginPhase::Discovered);

    let watcher = plugins.components().instance::<Watcher>().unwrap();
    assert_eq!(watcher.seen.load(Ordering::SeqCst), 1);
}

#[cfg(unix)]
#[test]
fn test_discover_follows_symlinks() {
    use std::os::unix::fs::symlink;

    let shared = TempDir::new().unwrap();
    fs::write(shared.path().join("watcher_plugin.toml"), "").unwrap();

    let root = TempDir::new().unwrap();
    symlink(shared.path(), root.path().join("linked")).unwrap();
    // 같은 모듈을 다른 이름으로 한 번 더
    symlink(
        shared.path().join("watcher_plugin.toml"),
        root.path().join("again_plugin.toml"),
    )
    .unwrap();
    fs::write(root.path().join("z_plugin.toml"), "module = \"watcher\"").unwrap();

    let plugins = plugins();
    let report = plugins.discover(root.path()).unwrap();

    assert_eq!(report.manifests.len(), 3);
    assert!(report
        .manifests
        .iter()
        .any(|p| p.ends_with("linked/watcher_plugin.toml")));
    assert_eq!(report.modules, vec!["watcher"]);
    assert_eq!(plugins.registry().len(), 1);
}

#[test]
fn test_unknown_module_aborts_discovery() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a_plugin.toml"), "module = \"missing\"").unwrap();
    fs::write(dir.path().join("b_plugin.toml"), "module = \"watcher\"").unwrap();

    let plugins = plugins();
    let err = plugins.discover(dir.path()).unwrap_err();

    assert!(matches!(err, Error::DiscoveryImport { .. }));
    assert!(err.is_fatal());
    // 정렬 순서상 a가 먼저이므로 watcher는 등록되지 않음
    assert!(plugins.registry().is_empty());
    assert_eq!(plugins.state(), PluginPhase::Unloaded);
}

#[test]
fn test_plugins_loaded_failure_names_component() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("extra_plugin.toml"), "").unwrap();
    fs::write(dir.path().join("watcher_plugin.toml"), "").unwrap();

    let plugins = plugins();
    let err = plugins.discover(dir.path()).unwrap_err();

    assert!(matches!(err, Error::Broadcast { .. }));
    assert_eq!(err.component(), Some("extra"));
    assert!(err.to_string().contains("on_plugins_loaded"));
}

#[cfg(unix)]
#[test]
fn test_dangling_manifest_link_aborts_discovery() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("watcher_plugin.toml"), "").unwrap();
    symlink(
        dir.path().join("gone.toml"),
        dir.path().join("broken_plugin.toml"),
    )
    .unwrap();

    let plugins = plugins();
    let err = plugins.discover(dir.path()).unwrap_err();

    match &err {
        Error::DiscoveryImport { path, .. } => assert!(path.ends_with("broken_plugin.toml")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(plugins.registry().is_empty());
    assert_eq!(plugins.state(), PluginPhase::Unloaded);
}

#[cfg(unix)]
#[test]
fn test_unrelated_walk_errors_are_skipped() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("watcher_plugin.toml"), "").unwrap();
    // 매니페스트가 아닌 끊어진 링크와 디렉토리 순환
    symlink(dir.path().join("gone"), dir.path().join("stale_link")).unwrap();
    symlink(dir.path(), dir.path().join("loop")).unwrap();

    let plugins = plugins();
    let report = plugins.discover(dir.path()).unwrap();

    assert_eq!(report.manifests.len(), 1);
    assert_eq!(report.modules, vec!["watcher"]);
}
