//! # Component Runtime
//!
//! 인터페이스로 발견되고, 지연 활성화되며, 설정으로 비활성화될 수 있는 컴포넌트 모델
//!
//! ## 구조
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ComponentRegistry   InterfaceId -> [ComponentClass]     │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │
//! ┌───────────────▼──────────────────────────────────────────┐
//! │  ComponentManager                                        │
//! │   - 클래스당 인스턴스 하나 (get_or_activate)             │
//! │   - disable() / 메모이즈된 is_enabled()                  │
//! │   - ComponentPolicy (PluginManager가 확장)               │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │
//! ┌───────────────▼──────────────────────────────────────────┐
//! │  ExtensionPoint<dyn I>   resolve() / broadcast()         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! pub trait ReportSink: Send + Sync {
//!     fn flush(&self) -> Result<()>;
//! }
//! declare_interface!(ReportSink);
//!
//! registry.register(
//!     ComponentClass::of::<JunitSink>()
//!         .implements::<dyn ReportSink>(|c| c)
//!         .build(),
//! )?;
//!
//! ExtensionPoint::<dyn ReportSink>::new(&manager)
//!     .broadcast("flush", |sink| sink.flush())?;
//! ```

mod class;
mod extension;
mod interface;
mod manager;
mod registry;
mod scope;

pub use class::{Component, ComponentClass, ComponentClassBuilder, ComponentInstance, ComponentObject};
pub use extension::{Extension, ExtensionPoint};
pub use interface::{Interface, InterfaceId};
pub use manager::{ComponentManager, ComponentPolicy, DefaultPolicy, Enablement};
pub use registry::{ComponentRegistry, RegistrationRoutine};
pub use scope::{ThreadLocalScope, RESERVED_PREFIX};
