//! Plugin Manager - 발견과 2단계 설정을 갖춘 컴포넌트 매니저
//!
//! ## 상태
//!
//! ```text
//! Unloaded --discover--> Discovered --configure--> Configuring --> Configured
//! ```
//!
//! - 설정 전에는 모든 컴포넌트가 잠정적으로 활성입니다 (메모이즈되지 않음).
//! - `[components]` 규칙은 설정이 저장된 순간부터 적용됩니다.
//! - 컴포넌트 자체의 `is_enabled(args, config)`는 설정 완료 후에만 참조됩니다.

use super::discovery::{DiscoveryReport, ModuleTable, PluginDiscovery};
use super::traits::Configurable;
use crate::component::{
    ComponentClass, ComponentInstance, ComponentManager, ComponentPolicy, ComponentRegistry,
    Enablement, ExtensionPoint, Interface,
};
use crate::lifecycle::PluginsLoaded;
use clap::Command;
use glob::Pattern;
use harness_foundation::{Config, Error, Result, RunArgs};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 컴포넌트 규칙 섹션
pub const COMPONENTS_SECTION: &str = "components";

// ============================================================================
// PluginPhase
// ============================================================================

/// 플러그인 매니저 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginPhase {
    #[default]
    Unloaded,
    Discovered,
    Configuring,
    Configured,
}

impl fmt::Display for PluginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginPhase::Unloaded => "unloaded",
            PluginPhase::Discovered => "discovered",
            PluginPhase::Configuring => "configuring",
            PluginPhase::Configured => "configured",
        };
        f.write_str(s)
    }
}

// ============================================================================
// ComponentRules - [components] 섹션
// ============================================================================

/// 이름 글롭 패턴 -> 활성 여부
///
/// ```toml
/// [components]
/// "log_*" = false
/// log_capture = true
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentRules {
    rules: Vec<(Pattern, bool)>,
}

impl ComponentRules {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(section) = config.section(COMPONENTS_SECTION) else {
            return Ok(Self::default());
        };

        let mut rules = Vec::with_capacity(section.len());
        for key in section.keys() {
            let enabled = config.get_bool(COMPONENTS_SECTION, key)?.unwrap_or(true);
            let pattern = Pattern::new(key).map_err(|e| {
                Error::Config(format!("invalid component pattern '{}': {}", key, e))
            })?;
            rules.push((pattern, enabled));
        }
        Ok(Self { rules })
    }

    /// 이름에 적용되는 규칙 (정확히 일치 > 가장 긴 패턴)
    pub fn lookup(&self, name: &str) -> Option<bool> {
        if let Some((_, enabled)) = self.rules.iter().find(|(p, _)| p.as_str() == name) {
            return Some(*enabled);
        }

        let mut best: Option<(&Pattern, bool)> = None;
        for (pattern, enabled) in &self.rules {
            if !pattern.matches(name) {
                continue;
            }
            if best.map_or(true, |(b, _)| pattern.as_str().len() > b.as_str().len()) {
                best = Some((pattern, *enabled));
            }
        }
        best.map(|(_, enabled)| enabled)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// PluginState / PluginPolicy
// ============================================================================

/// configure()로 저장된 설정
struct Settings {
    args: Arc<RunArgs>,
    config: Arc<Config>,
    rules: ComponentRules,
}

#[derive(Default)]
struct PluginState {
    phase: RwLock<PluginPhase>,
    settings: RwLock<Option<Arc<Settings>>>,
}

impl PluginState {
    fn phase(&self) -> PluginPhase {
        *self.phase.read()
    }

    fn set_phase(&self, phase: PluginPhase) {
        *self.phase.write() = phase;
        debug!("Plugin manager is now {}", phase);
    }

    fn settings(&self) -> Option<Arc<Settings>> {
        self.settings.read().clone()
    }
}

/// 기본 정책 위에 설정 규칙과 컴포넌트 조건을 덧붙임
struct PluginPolicy {
    state: Arc<PluginState>,
}

impl ComponentPolicy for PluginPolicy {
    fn is_component_enabled(&self, class: &ComponentClass) -> Enablement {
        let Some(settings) = self.state.settings() else {
            return Enablement::Deferred(true);
        };

        if settings.rules.lookup(class.name()) == Some(false) {
            return Enablement::Final(false);
        }

        if self.state.phase() != PluginPhase::Configured {
            return Enablement::Deferred(true);
        }

        Enablement::Final(class.is_enabled(&settings.args, &settings.config))
    }

    fn component_activated(&self, instance: &ComponentInstance) {
        debug!(
            "Plugin component {} activated during {}",
            instance.name(),
            self.state.phase()
        );
    }
}

// ============================================================================
// ComponentSummary
// ============================================================================

/// 컴포넌트 목록 출력용 요약
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSummary {
    pub name: String,
    pub priority: i32,
    pub interfaces: Vec<String>,
    pub enabled: bool,
    pub vital: bool,
    pub activated: bool,
}

// ============================================================================
// PluginManager
// ============================================================================

/// 플러그인 매니저
pub struct PluginManager {
    manager: ComponentManager,
    modules: ModuleTable,
    state: Arc<PluginState>,
}

impl PluginManager {
    pub fn new(registry: Arc<ComponentRegistry>, modules: ModuleTable) -> Self {
        let state = Arc::new(PluginState::default());
        let policy = PluginPolicy {
            state: Arc::clone(&state),
        };

        Self {
            manager: ComponentManager::with_policy(registry, Box::new(policy)),
            modules,
            state,
        }
    }

    /// 하위 컴포넌트 매니저
    pub fn components(&self) -> &ComponentManager {
        &self.manager
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        self.manager.registry()
    }

    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    pub fn state(&self) -> PluginPhase {
        self.state.phase()
    }

    pub fn is_configured(&self) -> bool {
        self.state() == PluginPhase::Configured
    }

    /// configure()에 전달된 인자
    pub fn args(&self) -> Option<Arc<RunArgs>> {
        self.state.settings().map(|s| Arc::clone(&s.args))
    }

    /// configure()에 전달된 설정
    pub fn config(&self) -> Option<Arc<Config>> {
        self.state.settings().map(|s| Arc::clone(&s.config))
    }

    pub fn extension_point<I: Interface + ?Sized>(&self) -> ExtensionPoint<'_, I> {
        ExtensionPoint::new(&self.manager)
    }

    // ========================================================================
    // 발견
    // ========================================================================

    /// 플러그인 발견 후 `on_plugins_loaded` 브로드캐스트
    pub fn discover(&self, root: &Path) -> Result<DiscoveryReport> {
        let report = PluginDiscovery::new(&self.modules, self.registry()).discover(root)?;

        if self.state() == PluginPhase::Unloaded {
            self.state.set_phase(PluginPhase::Discovered);
        }

        let registry = Arc::clone(self.registry());
        self.extension_point::<dyn PluginsLoaded>()
            .broadcast("on_plugins_loaded", |ext| ext.on_plugins_loaded(&registry))?;

        Ok(report)
    }

    // ========================================================================
    // 설정
    // ========================================================================

    /// 설정 가능한 클래스 (우선순위 안정 정렬)
    fn configurable_classes(&self) -> Vec<Arc<ComponentClass>> {
        let mut classes = self.registry().implementors::<dyn Configurable>();
        classes.sort_by_key(|c| c.priority());
        classes
    }

    /// 인자 파싱 전에 플러그인 옵션 추가
    pub fn add_options(&self, command: Command) -> Command {
        self.configurable_classes()
            .iter()
            .fold(command, |cmd, class| class.add_options(cmd))
    }

    /// 2단계 설정
    ///
    /// 활성 `Configurable` 컴포넌트를 우선순위 순서로 활성화하고 `configure`를 호출합니다.
    /// vital 컴포넌트 실패는 즉시 반환되고 상태는 `Configuring`에 머뭅니다.
    /// 그 외 실패는 경고 후 해당 컴포넌트를 비활성화하고 계속 진행합니다.
    pub fn configure(&self, args: RunArgs, config: Config) -> Result<()> {
        let phase = self.state();
        if matches!(phase, PluginPhase::Configuring | PluginPhase::Configured) {
            return Err(Error::InvalidInput(format!(
                "plugin manager cannot be configured twice (state: {})",
                phase
            )));
        }

        let rules = ComponentRules::from_config(&config)?;
        let settings = Arc::new(Settings {
            args: Arc::new(args),
            config: Arc::new(config),
            rules,
        });
        *self.state.settings.write() = Some(Arc::clone(&settings));
        self.state.set_phase(PluginPhase::Configuring);

        let mut configured = 0usize;
        for class in self.configurable_classes() {
            if !self.manager.is_enabled(&class) {
                debug!("Skipping disabled component: {}", class.name());
                continue;
            }

            match self.configure_one(&class, &settings) {
                Ok(()) => configured += 1,
                Err(e) if class.is_vital(&settings.config) => {
                    error!("Vital component {} failed to configure: {}", class.name(), e);
                    return Err(Error::Configuration {
                        component: class.name().to_string(),
                        vital: true,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(
                        "Component {} failed to configure, disabling it: {}",
                        class.name(),
                        e
                    );
                    self.manager.disable(&class);
                }
            }
        }

        self.state.set_phase(PluginPhase::Configured);
        info!("Configured {} plugin component(s)", configured);
        Ok(())
    }

    fn configure_one(&self, class: &ComponentClass, settings: &Settings) -> Result<()> {
        let instance = self.manager.get_or_activate(class)?;
        let configurable = instance.cast::<dyn Configurable>().ok_or_else(|| {
            Error::Internal(format!("component {} is not Configurable", class.name()))
        })?;
        configurable.configure(&settings.args, &settings.config)
    }

    // ========================================================================
    // 조회 / 위임
    // ========================================================================

    pub fn get_or_activate(&self, class: &ComponentClass) -> Result<ComponentInstance> {
        self.manager.get_or_activate(class)
    }

    pub fn is_enabled(&self, class: &ComponentClass) -> bool {
        self.manager.is_enabled(class)
    }

    pub fn disable(&self, class: &ComponentClass) {
        self.manager.disable(class)
    }

    pub fn disable_by_name(&self, name: &str) -> bool {
        self.manager.disable_by_name(name)
    }

    /// 등록된 모든 컴포넌트 요약 (등록 순서)
    pub fn summary(&self) -> Vec<ComponentSummary> {
        let config = self.config().unwrap_or_default();

        self.registry()
            .classes()
            .iter()
            .map(|class| ComponentSummary {
                name: class.name().to_string(),
                priority: class.priority(),
                interfaces: class.interfaces().map(|id| id.name().to_string()).collect(),
                enabled: self.manager.is_enabled(class),
                vital: class.is_vital(&config),
                activated: self.manager.is_activated(class.name()),
            })
            .collect()
    }
}
