//! Plugin Manifest - `*_plugin.toml` 파일 형식
//!
//! ```toml
//! # plugins/timing_plugin.toml
//! module = "durations"
//! description = "per-case timings"
//! ```

use harness_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 매니페스트 파일 이름 접미사
pub const PLUGIN_SUFFIX: &str = "_plugin.toml";

/// 플러그인 매니페스트
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    /// import할 모듈 이름 (생략 시 파일 이름에서 접미사를 뺀 것)
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl PluginManifest {
    /// 파일에서 로드
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::discovery_import(path, format!("cannot read manifest: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::discovery_import(path, format!("malformed manifest: {}", e)))
    }

    /// 매니페스트가 가리키는 모듈 이름
    pub fn module_name(&self, path: &Path) -> Option<String> {
        match &self.module {
            Some(module) => Some(module.trim().to_string()).filter(|m| !m.is_empty()),
            None => module_from_file_name(path),
        }
    }
}

/// 매니페스트 파일인지 (`foo_plugin.toml`)
pub fn is_manifest(path: &Path) -> bool {
    module_from_file_name(path).is_some()
}

fn module_from_file_name(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix(PLUGIN_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
