//! Config - 외부 협력 객체
//!
//! - `harness.rs` - 섹션/키 기반 설정 (`Config`)
//! - `args.rs` - 파싱된 CLI 인자 (`RunArgs`)
//!
//! 런타임은 두 객체를 해석하지 않고 컴포넌트에 전달만 합니다.

mod args;
mod harness;

pub use args::RunArgs;
pub use harness::{Config, HARNESS_CONFIG_FILE};
