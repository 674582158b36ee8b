//! Component Class - 컴포넌트 타입과 그 메타데이터
//!
//! 컴포넌트는 [`Component`] trait을 구현하는 타입입니다. 등록 단위는
//! [`ComponentClass`]이며, 구현하는 인터페이스마다 타입 검사된 업캐스트 함수를 가집니다.
//!
//! ```ignore
//! struct Durations { /* ... */ }
//!
//! impl Component for Durations {
//!     const NAME: &'static str = "durations";
//!     const PRIORITY: i32 = 10;
//!
//!     fn create(_manager: &ComponentManager) -> Result<Self> {
//!         Ok(Self { /* ... */ })
//!     }
//! }
//!
//! let class = ComponentClass::of::<Durations>()
//!     .implements::<dyn TestCaseHooks>(|c| c)
//!     .implements::<dyn Configurable>(|c| c)
//!     .build();
//! ```

use super::interface::{Interface, InterfaceId};
use super::manager::ComponentManager;
use clap::Command;
use harness_foundation::{Config, Result, RunArgs};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 타입 소거된 컴포넌트 객체
pub type ComponentObject = Arc<dyn Any + Send + Sync>;

type Factory = fn(&ComponentManager) -> Result<ComponentObject>;
type Caster = Box<dyn Fn(ComponentObject) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

// ============================================================================
// Component Trait
// ============================================================================

/// 컴포넌트 트레이트
///
/// 연관 상수와 연관 함수는 클래스 수준 선언입니다. 인스턴스는 매니저당 하나만
/// 만들어지고 여러 워커 스레드가 공유하므로, 가변 상태는 내부 가변성으로 관리해야 합니다.
pub trait Component: Send + Sync + Sized + 'static {
    /// 고유 이름 (같은 이름은 한 번만 등록됨)
    const NAME: &'static str;

    /// 정렬 우선순위 (낮을수록 먼저)
    const PRIORITY: i32 = 0;

    /// 추상 컴포넌트는 등록되지 않음
    const ABSTRACT: bool = false;

    /// 인스턴스 생성
    ///
    /// 생성자는 부수효과가 가벼워야 합니다. 동시에 두 번 호출될 수 있고,
    /// 그 중 하나의 결과는 버려집니다.
    fn create(manager: &ComponentManager) -> Result<Self>;

    /// 설정 완료 후에만 참조되는 적용 여부 판단
    fn is_enabled(_args: &RunArgs, _config: &Config) -> bool {
        true
    }

    /// configure 실패 시 전체 설정 단계를 중단해야 하는지
    fn is_vital(_config: &Config) -> bool {
        false
    }

    /// 인자 파싱 전에 CLI 옵션 추가
    fn add_options(command: Command) -> Command {
        command
    }
}

// ============================================================================
// ComponentClass
// ============================================================================

/// 등록 가능한 컴포넌트 클래스
pub struct ComponentClass {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    priority: i32,
    is_abstract: bool,
    interfaces: Vec<(InterfaceId, Caster)>,
    factory: Factory,
    enabled_fn: fn(&RunArgs, &Config) -> bool,
    vital_fn: fn(&Config) -> bool,
    options_fn: fn(Command) -> Command,
}

impl ComponentClass {
    /// 컴포넌트 타입으로부터 클래스 빌더 생성
    pub fn of<T: Component>() -> ComponentClassBuilder<T> {
        ComponentClassBuilder {
            class: ComponentClass {
                name: T::NAME,
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                priority: T::PRIORITY,
                is_abstract: T::ABSTRACT,
                interfaces: Vec::new(),
                factory: create_erased::<T>,
                enabled_fn: T::is_enabled,
                vital_fn: T::is_vital,
                options_fn: T::add_options,
            },
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// 선언된 인터페이스 (선언 순서)
    pub fn interfaces(&self) -> impl Iterator<Item = InterfaceId> + '_ {
        self.interfaces.iter().map(|(id, _)| *id)
    }

    pub fn implements(&self, interface: InterfaceId) -> bool {
        self.interfaces.iter().any(|(id, _)| *id == interface)
    }

    pub fn is_enabled(&self, args: &RunArgs, config: &Config) -> bool {
        (self.enabled_fn)(args, config)
    }

    pub fn is_vital(&self, config: &Config) -> bool {
        (self.vital_fn)(config)
    }

    pub fn add_options(&self, command: Command) -> Command {
        (self.options_fn)(command)
    }

    pub(crate) fn create(&self, manager: &ComponentManager) -> Result<ComponentObject> {
        (self.factory)(manager)
    }

    /// 인터페이스로 업캐스트 (구현하지 않으면 None)
    pub(crate) fn cast<I: Interface + ?Sized>(&self, object: &ComponentObject) -> Option<Arc<I>> {
        let id = InterfaceId::of::<I>();
        let (_, caster) = self.interfaces.iter().find(|(iface, _)| *iface == id)?;
        let boxed = caster(Arc::clone(object))?;
        boxed.downcast::<Arc<I>>().ok().map(|arc| *arc)
    }

    /// 같은 인터페이스를 두 번 선언했는지
    pub(crate) fn duplicate_interface(&self) -> Option<InterfaceId> {
        self.interfaces.iter().enumerate().find_map(|(i, (id, _))| {
            self.interfaces[..i]
                .iter()
                .any(|(prev, _)| prev == id)
                .then_some(*id)
        })
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("priority", &self.priority)
            .field("abstract", &self.is_abstract)
            .field(
                "interfaces",
                &self.interfaces().map(|id| id.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn create_erased<T: Component>(manager: &ComponentManager) -> Result<ComponentObject> {
    let component = T::create(manager)?;
    Ok(Arc::new(component))
}

// ============================================================================
// ComponentClassBuilder
// ============================================================================

/// `implements(...)` 선언을 모으는 빌더
pub struct ComponentClassBuilder<T: Component> {
    class: ComponentClass,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentClassBuilder<T> {
    /// 인터페이스 구현 선언
    ///
    /// `cast`는 보통 `|c| c` 이며, `T`가 실제로 그 trait을 구현하지 않으면 컴파일되지 않습니다.
    pub fn implements<I: Interface + ?Sized>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let caster: Caster = Box::new(move |object: ComponentObject| {
            let concrete = object.downcast::<T>().ok()?;
            let upcast: Box<dyn Any + Send + Sync> = Box::new(cast(concrete));
            Some(upcast)
        });
        self.class.interfaces.push((InterfaceId::of::<I>(), caster));
        self
    }

    /// 우선순위 재정의
    pub fn priority(mut self, priority: i32) -> Self {
        self.class.priority = priority;
        self
    }

    pub fn build(self) -> ComponentClass {
        self.class
    }
}

// ============================================================================
// ComponentInstance
// ============================================================================

/// 활성화된 컴포넌트 인스턴스 (매니저가 소유)
#[derive(Clone)]
pub struct ComponentInstance {
    class: Arc<ComponentClass>,
    object: ComponentObject,
}

impl ComponentInstance {
    pub(crate) fn new(class: Arc<ComponentClass>, object: ComponentObject) -> Self {
        Self { class, object }
    }

    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    pub fn name(&self) -> &'static str {
        self.class.name()
    }

    /// 구체 타입으로 다운캐스트
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// 인터페이스로 업캐스트
    pub fn cast<I: Interface + ?Sized>(&self) -> Option<Arc<I>> {
        self.class.cast::<I>(&self.object)
    }

    /// 같은 객체인지 (포인터 비교)
    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.class.name())
            .finish_non_exhaustive()
    }
}
