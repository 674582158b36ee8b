//! Error types for the harness
//!
//! 컴포넌트 런타임의 모든 에러를 중앙에서 관리
//!
//! 등록/발견 단계 에러는 복구 불가능(프로세스 시작 중단), 설정 단계 에러는
//! vital 여부에 따라 비활성화 후 계속 진행, broadcast 에러는 항상 호출자에게 전파됩니다.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Harness 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 컴포넌트 런타임
    // ========================================================================
    /// 잘못된 컴포넌트 선언 (등록 시점에 즉시 발생)
    #[error("Registration error: {0}")]
    Registration(String),

    /// 플러그인 모듈 import 실패 - 발견 단계 전체 중단
    #[error("Failed to import plugin {}: {message}", .path.display())]
    DiscoveryImport { path: PathBuf, message: String },

    /// 컴포넌트 인스턴스 생성 실패
    #[error("Failed to activate component {component}: {message}")]
    Activation { component: String, message: String },

    /// 컴포넌트 configure 실패
    #[error("Configuration of {}component {component} failed: {source}", vital_label(.vital))]
    Configuration {
        component: String,
        vital: bool,
        #[source]
        source: Box<Error>,
    },

    /// broadcast 중 특정 컴포넌트에서 발생한 에러
    #[error("Component {component} failed during {event}: {source}")]
    Broadcast {
        event: String,
        component: String,
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

fn vital_label(vital: &bool) -> &'static str {
    if *vital {
        "vital "
    } else {
        ""
    }
}

impl Error {
    /// 임베딩 애플리케이션이 진행하면 안 되는 에러인지 확인
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Registration(_) | Error::DiscoveryImport { .. } => true,
            Error::Configuration { vital, .. } => *vital,
            _ => false,
        }
    }

    /// 에러를 일으킨 컴포넌트 이름
    pub fn component(&self) -> Option<&str> {
        match self {
            Error::Activation { component, .. }
            | Error::Configuration { component, .. }
            | Error::Broadcast { component, .. } => Some(component),
            _ => None,
        }
    }

    /// Activation 에러 생성 헬퍼
    pub fn activation(component: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Activation {
            component: component.into(),
            message: message.into(),
        }
    }

    /// DiscoveryImport 에러 생성 헬퍼
    pub fn discovery_import(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::DiscoveryImport {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Broadcast 에러 생성 헬퍼
    pub fn broadcast(event: impl Into<String>, component: impl Into<String>, source: Error) -> Self {
        Error::Broadcast {
            event: event.into(),
            component: component.into(),
            source: Box::new(source),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
