//! Interface Catalog - 기능 계약의 식별자
//!
//! 인터페이스는 trait object 타입(`dyn Trait`)으로 표현됩니다.
//! 인스턴스화되지 않으며, 레지스트리 키와 업캐스트 대상 타입으로만 쓰입니다.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 인터페이스 마커
///
/// 직접 구현하지 말고 [`declare_interface!`](crate::declare_interface)를 사용하세요.
pub trait Interface: Send + Sync + 'static {
    /// 로그/에러 메시지에 쓰이는 이름
    const NAME: &'static str;
}

/// 인터페이스 식별자 (레지스트리 조회 키)
#[derive(Clone, Copy)]
pub struct InterfaceId {
    type_id: TypeId,
    name: &'static str,
}

impl InterfaceId {
    pub fn of<I: Interface + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            name: I::NAME,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for InterfaceId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for InterfaceId {}

impl Hash for InterfaceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceId({})", self.name)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// trait를 인터페이스로 선언
///
/// ```ignore
/// pub trait ReportSink: Send + Sync {
///     fn flush(&self) -> Result<()>;
/// }
/// declare_interface!(ReportSink);
/// ```
#[macro_export]
macro_rules! declare_interface {
    ($($iface:ident),+ $(,)?) => {
        $(
            impl $crate::component::Interface for dyn $iface {
                const NAME: &'static str = stringify!($iface);
            }
        )+
    };
}
