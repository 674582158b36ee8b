//! Component Registry - 인터페이스별 컴포넌트 클래스 카탈로그
//!
//! 전역 상태가 아닌 명시적 객체입니다. 애플리케이션 최상위에서 만들어
//! 발견 단계, 매니저, 확장 포인트에 `Arc`로 전달합니다.

use super::class::ComponentClass;
use super::interface::{Interface, InterfaceId};
use harness_foundation::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 플러그인 모듈의 등록 루틴
pub type RegistrationRoutine = fn(&ComponentRegistry) -> Result<()>;

#[derive(Default)]
struct RegistryInner {
    /// 등록 순서대로의 클래스 목록
    classes: Vec<Arc<ComponentClass>>,

    /// 이름 -> 클래스
    by_name: HashMap<&'static str, Arc<ComponentClass>>,

    /// 인터페이스 -> 구현 클래스 (등록 순서)
    by_interface: HashMap<InterfaceId, Vec<Arc<ComponentClass>>>,
}

/// 컴포넌트 레지스트리
///
/// 추가 등록만 가능하며, 등록된 클래스는 제거되지 않습니다.
#[derive(Default)]
pub struct ComponentRegistry {
    inner: RwLock<RegistryInner>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 클래스 등록
    ///
    /// 추상 클래스이거나 같은 이름이 이미 있으면 아무것도 하지 않고 `Ok(false)`를 반환합니다.
    /// 플러그인 모듈이 여러 번 import될 수 있으므로 중복은 에러가 아닙니다.
    pub fn register(&self, class: ComponentClass) -> Result<bool> {
        if class.name().trim().is_empty() {
            return Err(Error::Registration(format!(
                "component {} has an empty name",
                class.type_name()
            )));
        }

        if let Some(iface) = class.duplicate_interface() {
            return Err(Error::Registration(format!(
                "component {} declares interface {} more than once",
                class.name(),
                iface
            )));
        }

        if class.is_abstract() {
            debug!("Skipping abstract component: {}", class.name());
            return Ok(false);
        }

        let mut inner = self.inner.write();

        if inner.by_name.contains_key(class.name()) {
            debug!("Component {} is already registered", class.name());
            return Ok(false);
        }

        let class = Arc::new(class);
        for iface in class.interfaces() {
            inner
                .by_interface
                .entry(iface)
                .or_default()
                .push(Arc::clone(&class));
        }
        inner.by_name.insert(class.name(), Arc::clone(&class));
        inner.classes.push(Arc::clone(&class));

        info!(
            "Registered component: {} (priority {}, implements [{}])",
            class.name(),
            class.priority(),
            class
                .interfaces()
                .map(|id| id.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(true)
    }

    /// 모듈의 등록 루틴 실행
    pub fn register_module(&self, module: &str, routine: RegistrationRoutine) -> Result<()> {
        let before = self.len();
        routine(self)?;
        debug!(
            "Module {} registered {} new component(s)",
            module,
            self.len() - before
        );
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 인터페이스를 구현하는 모든 클래스 (등록 순서)
    ///
    /// 인스턴스나 활성화 여부는 보지 않는 순수 카탈로그 조회입니다.
    pub fn classes_implementing(&self, interface: InterfaceId) -> Vec<Arc<ComponentClass>> {
        self.inner
            .read()
            .by_interface
            .get(&interface)
            .cloned()
            .unwrap_or_default()
    }

    /// 타입 파라미터 버전
    pub fn implementors<I: Interface + ?Sized>(&self) -> Vec<Arc<ComponentClass>> {
        self.classes_implementing(InterfaceId::of::<I>())
    }

    /// 이름으로 클래스 조회
    pub fn get(&self, name: &str) -> Option<Arc<ComponentClass>> {
        self.inner.read().by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().by_name.contains_key(name)
    }

    /// 등록된 모든 클래스 (등록 순서)
    pub fn classes(&self) -> Vec<Arc<ComponentClass>> {
        self.inner.read().classes.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::class::Component;
    use crate::component::manager::ComponentManager;

    trait Probe: Send + Sync {}
    trait Other: Send + Sync {}
    crate::declare_interface!(Probe, Other);

    macro_rules! probe_component {
        ($ty:ident, $name:expr, $priority:expr) => {
            struct $ty;
            impl Component for $ty {
                const NAME: &'static str = $name;
                const PRIORITY: i32 = $priority;
                fn create(_manager: &ComponentManager) -> Result<Self> {
                    Ok($ty)
                }
            }
            impl Probe for $ty {}
        };
    }

    probe_component!(First, "first", 0);
    probe_component!(Second, "second", 0);
    probe_component!(Impostor, "first", 7);

    struct Base;
    impl Component for Base {
        const NAME: &'static str = "base";
        const ABSTRACT: bool = true;
        fn create(_manager: &ComponentManager) -> Result<Self> {
            Ok(Base)
        }
    }
    impl Probe for Base {}

    #[test]
    fn test_register_in_order() {
        let registry = ComponentRegistry::new();
        assert!(registry
            .register(ComponentClass::of::<Second>().implements::<dyn Probe>(|c| c).build())
            .unwrap());
        assert!(registry
            .register(ComponentClass::of::<First>().implements::<dyn Probe>(|c| c).build())
            .unwrap());

        let names: Vec<_> = registry
            .implementors::<dyn Probe>()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["second", "first"]);
        assert!(registry.implementors::<dyn Other>().is_empty());
    }

    #[test]
    fn test_duplicate_name_is_noop() {
        let registry = ComponentRegistry::new();
        let first = || ComponentClass::of::<First>().implements::<dyn Probe>(|c| c).build();

        assert!(registry.register(first()).unwrap());
        // 재-import
        assert!(!registry.register(first()).unwrap());
        // 같은 이름의 다른 타입
        assert!(!registry
            .register(ComponentClass::of::<Impostor>().implements::<dyn Probe>(|c| c).build())
            .unwrap());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.implementors::<dyn Probe>().len(), 1);
        assert_eq!(registry.get("first").unwrap().priority(), 0);
    }

    #[test]
    fn test_abstract_not_registered() {
        let registry = ComponentRegistry::new();
        let registered = registry
            .register(ComponentClass::of::<Base>().implements::<dyn Probe>(|c| c).build())
            .unwrap();

        assert!(!registered);
        assert!(registry.is_empty());
        assert!(!registry.contains("base"));
    }

    #[test]
    fn test_malformed_declaration() {
        let registry = ComponentRegistry::new();
        let err = registry
            .register(
                ComponentClass::of::<First>()
                    .implements::<dyn Probe>(|c| c)
                    .implements::<dyn Probe>(|c| c)
                    .build(),
            )
            .unwrap_err();

        assert!(matches!(err, Error::Registration(_)));
        assert!(err.is_fatal());
        assert!(registry.is_empty());
    }
}
