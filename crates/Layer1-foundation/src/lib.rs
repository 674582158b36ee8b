//! # harness-foundation
//!
//! Foundation layer for the harness:
//! - Error: 런타임 전체 에러 분류 (Registration, DiscoveryImport, Activation, Configuration, Broadcast)
//! - Config: 섹션 기반 설정 객체 (`Config`) 및 파싱된 CLI 인자 (`RunArgs`)
//!
//! 컴포넌트 런타임(`harness-core`)과 임베딩 애플리케이션(`harness-cli`)이 공유합니다.

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{Config, RunArgs, HARNESS_CONFIG_FILE};
