//! # Plugin System
//!
//! 디렉토리에서 플러그인 모듈을 발견하고 2단계로 설정하는 컴포넌트 매니저
//!
//! ## 흐름
//!
//! ```text
//! plugins/*_plugin.toml
//!        │  discover()
//!        ▼
//! ModuleTable["module"](registry)      -- 컴포넌트 클래스 등록
//!        │  broadcast on_plugins_loaded
//!        ▼
//! add_options(cmd) -> 인자 파싱
//!        │  configure(args, config)
//!        ▼
//! Configurable::configure (우선순위 순)
//!   - vital 실패: 중단
//!   - 그 외 실패: 비활성화 후 계속
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let registry = Arc::new(ComponentRegistry::new());
//! let modules = ModuleTable::new().with("durations", durations::register);
//!
//! let plugins = PluginManager::new(registry, modules);
//! plugins.discover(Path::new("plugins"))?;
//!
//! let command = plugins.add_options(cli_command());
//! let matches = command.get_matches();
//! plugins.configure(RunArgs::from_matches(&matches), config)?;
//! ```

mod discovery;
mod manager;
mod manifest;
mod traits;

pub use discovery::{DiscoveryReport, ModuleTable, PluginDiscovery};
pub use manager::{ComponentRules, ComponentSummary, PluginManager, PluginPhase, COMPONENTS_SECTION};
pub use manifest::{is_manifest, PluginManifest, PLUGIN_SUFFIX};
pub use traits::Configurable;
