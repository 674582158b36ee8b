//! Plugin traits - 설정 단계 인터페이스

use crate::declare_interface;
use harness_foundation::{Config, Result, RunArgs};

/// 설정 가능한 컴포넌트
///
/// `PluginManager::configure`가 우선순위 순서로 한 번씩 호출합니다.
/// 실패 시 vital 컴포넌트는 설정 단계 전체를 중단시키고,
/// 그 외 컴포넌트는 비활성화됩니다.
pub trait Configurable: Send + Sync {
    fn configure(&self, args: &RunArgs, config: &Config) -> Result<()>;
}

declare_interface!(Configurable);
