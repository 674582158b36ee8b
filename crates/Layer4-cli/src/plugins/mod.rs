//! Built-in plugin modules
//!
//! 매니페스트의 `module = "..."` 이름으로 import됩니다.
//!
//! - `log_capture`: 케이스 출력 수집, `--log-dir`로 파일 저장
//! - `durations`: 케이스별 소요 시간 집계 (`--durations`)
//! - `results`: 통과/실패 집계, `--fail-fast` (vital)

pub mod durations;
pub mod log_capture;
pub mod results;

use harness_core::ModuleTable;

/// 바이너리에 포함된 모듈 목록
pub fn builtin_modules() -> ModuleTable {
    ModuleTable::new()
        .with("durations", durations::register)
        .with("log_capture", log_capture::register)
        .with("results", results::register)
}
