//! harness-core: Component Runtime for the test harness
//!
//! Layer2 - 플러그인/컴포넌트 런타임 레이어
//!
//! # 주요 모듈
//!
//! - `component`: 인터페이스, 레지스트리, 매니저, 확장 포인트, 스레드 로컬 스코프
//! - `plugin`: 플러그인 발견 및 2단계 설정 (`PluginManager`)
//! - `lifecycle`: 임베딩 애플리케이션이 브로드캐스트하는 이벤트 인터페이스
//!
//! # 사용 예시
//!
//! ```ignore
//! use harness_core::{ComponentRegistry, ModuleTable, PluginManager, TestCaseHooks};
//!
//! let plugins = PluginManager::new(Arc::new(ComponentRegistry::new()), modules);
//! plugins.discover(Path::new("plugins"))?;
//! plugins.configure(args, config)?;
//!
//! plugins
//!     .extension_point::<dyn TestCaseHooks>()
//!     .broadcast("pre_test_case", |hooks| hooks.pre_test_case(&case))?;
//! ```

pub mod component;
pub mod lifecycle;
pub mod plugin;

// Re-exports: Component
pub use component::{
    Component, ComponentClass, ComponentClassBuilder, ComponentInstance, ComponentManager,
    ComponentPolicy, ComponentRegistry, DefaultPolicy, Enablement, Extension, ExtensionPoint,
    Interface, InterfaceId, RegistrationRoutine, ThreadLocalScope,
};

// Re-exports: Lifecycle
pub use lifecycle::{
    ApplicationLifecycle, PluginsLoaded, TestCase, TestCaseHooks, TestGroup, TestGroupHooks,
    TestOutcome, TestStatus, TestSuite, TestSuiteHooks,
};

// Re-exports: Plugin
pub use plugin::{
    ComponentRules, ComponentSummary, Configurable, DiscoveryReport, ModuleTable, PluginDiscovery,
    PluginManager, PluginManifest, PluginPhase,
};

// Re-exports: Foundation
pub use harness_foundation::{Config, Error, Result, RunArgs};
