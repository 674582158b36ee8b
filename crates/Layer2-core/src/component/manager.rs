//! Component Manager - 컴포넌트 인스턴스와 활성화 여부 관리
//!
//! ## 동시성
//!
//! - 생성자 실행 중에는 어떤 락도 잡지 않습니다. 생성자가 매니저에 재진입할 수 있습니다.
//! - 두 스레드가 동시에 같은 클래스를 활성화하면 둘 다 생성할 수 있으며,
//!   먼저 저장된 인스턴스가 양쪽에 반환되고 나머지는 버려집니다.
//! - 활성화 여부는 한 번 확정되면 다시 계산하지 않습니다.

use super::class::{Component, ComponentClass, ComponentInstance};
use super::registry::ComponentRegistry;
use harness_foundation::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Enablement / ComponentPolicy
// ============================================================================

/// 활성화 판단 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enablement {
    /// 확정된 결과 - 메모이즈됨
    Final(bool),

    /// 잠정 결과 - 이번 호출에만 적용
    Deferred(bool),
}

impl Enablement {
    pub fn value(self) -> bool {
        match self {
            Enablement::Final(v) | Enablement::Deferred(v) => v,
        }
    }
}

/// 매니저 확장 지점
///
/// 임베딩 애플리케이션(예: `PluginManager`)이 기본 정책 위에 판단을 덧붙입니다.
pub trait ComponentPolicy: Send + Sync {
    /// 명시적 비활성화가 없을 때의 판단
    fn is_component_enabled(&self, _class: &ComponentClass) -> Enablement {
        Enablement::Final(true)
    }

    /// 인스턴스가 저장된 직후 클래스당 한 번 호출
    fn component_activated(&self, _instance: &ComponentInstance) {}
}

/// 기본 정책 (항상 활성)
#[derive(Debug, Default)]
pub struct DefaultPolicy;

impl ComponentPolicy for DefaultPolicy {}

// ============================================================================
// ComponentManager
// ============================================================================

/// 컴포넌트 매니저 - 클래스당 최대 하나의 인스턴스 소유
pub struct ComponentManager {
    /// 클래스 카탈로그
    registry: Arc<ComponentRegistry>,

    /// 확장 정책
    policy: Box<dyn ComponentPolicy>,

    /// 활성화된 인스턴스
    instances: RwLock<HashMap<&'static str, ComponentInstance>>,

    /// 활성화 순서
    activation_order: Mutex<Vec<&'static str>>,

    /// 명시적 disable() 기록
    overrides: RwLock<HashMap<&'static str, bool>>,

    /// 메모이즈된 활성화 여부
    enabled: RwLock<HashMap<&'static str, bool>>,
}

impl ComponentManager {
    /// 기본 정책으로 생성
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self::with_policy(registry, Box::new(DefaultPolicy))
    }

    /// 정책 지정
    pub fn with_policy(registry: Arc<ComponentRegistry>, policy: Box<dyn ComponentPolicy>) -> Self {
        Self {
            registry,
            policy,
            instances: RwLock::new(HashMap::new()),
            activation_order: Mutex::new(Vec::new()),
            overrides: RwLock::new(HashMap::new()),
            enabled: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    // ========================================================================
    // 활성화
    // ========================================================================

    /// 인스턴스 반환 (없으면 생성)
    ///
    /// `disable()`된 클래스는 다시 활성화되지 않습니다.
    pub fn get_or_activate(&self, class: &ComponentClass) -> Result<ComponentInstance> {
        let name = class.name();

        if let Some(instance) = self.instances.read().get(name) {
            return Ok(instance.clone());
        }
        if self.is_disabled(name) {
            return Err(Error::activation(name, "component is disabled"));
        }

        let registered = self
            .registry
            .get(name)
            .filter(|registered| registered.type_id() == class.type_id())
            .ok_or_else(|| Error::activation(name, "component class is not registered"))?;

        // 락 없이 생성
        let object = registered
            .create(self)
            .map_err(|e| Error::activation(name, e.to_string()))?;
        let candidate = ComponentInstance::new(registered, object);

        let (instance, stored) = {
            let mut instances = self.instances.write();
            // 생성 중에 disable()된 경우
            if self.is_disabled(name) {
                return Err(Error::activation(name, "component is disabled"));
            }
            match instances.entry(name) {
                Entry::Occupied(existing) => (existing.get().clone(), false),
                Entry::Vacant(slot) => (slot.insert(candidate).clone(), true),
            }
        };

        if stored {
            self.activation_order.lock().push(name);
            debug!("Activated component: {}", name);
            self.policy.component_activated(&instance);
        } else {
            debug!("Discarded concurrently created instance of {}", name);
        }

        Ok(instance)
    }

    /// 타입으로 인스턴스 조회/생성
    pub fn instance<T: Component>(&self) -> Result<Arc<T>> {
        let class = self
            .registry
            .get(T::NAME)
            .ok_or_else(|| Error::activation(T::NAME, "component class is not registered"))?;

        self.get_or_activate(&class)?.downcast::<T>().ok_or_else(|| {
            Error::activation(
                T::NAME,
                format!("name is registered by {}", class.type_name()),
            )
        })
    }

    pub fn is_activated(&self, name: &str) -> bool {
        self.instances.read().contains_key(name)
    }

    /// 활성화된 컴포넌트 이름 (처음 활성화된 순서)
    pub fn activated(&self) -> Vec<&'static str> {
        let instances = self.instances.read();
        self.activation_order
            .lock()
            .iter()
            .copied()
            .filter(|name| instances.contains_key(name))
            .collect()
    }

    // ========================================================================
    // 활성화 여부
    // ========================================================================

    /// 활성화 여부 (확정된 결과는 메모이즈)
    pub fn is_enabled(&self, class: &ComponentClass) -> bool {
        let name = class.name();

        if let Some(value) = self.overrides.read().get(name) {
            return *value;
        }
        if let Some(value) = self.enabled.read().get(name) {
            return *value;
        }

        match self.is_component_enabled(class) {
            Enablement::Final(value) => {
                let mut enabled = self.enabled.write();
                let memo = *enabled.entry(name).or_insert(value);
                if !memo {
                    debug!("Component {} is disabled", name);
                }
                memo
            }
            Enablement::Deferred(value) => value,
        }
    }

    /// 메모이즈 없이 판단 (명시적 disable이 우선)
    pub fn is_component_enabled(&self, class: &ComponentClass) -> Enablement {
        if self.is_disabled(class.name()) {
            return Enablement::Final(false);
        }
        self.policy.is_component_enabled(class)
    }

    /// 컴포넌트 비활성화 - 이후 확장 포인트에서 제외되고 인스턴스 참조를 버림
    pub fn disable(&self, class: &ComponentClass) {
        let name = class.name();
        // 락 순서: instances -> overrides
        let mut instances = self.instances.write();
        self.overrides.write().insert(name, false);
        instances.remove(name);
        drop(instances);
        info!("Disabled component: {}", name);
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.overrides.read().get(name) == Some(&false)
    }

    /// 이름으로 비활성화 (등록되지 않은 이름이면 false)
    pub fn disable_by_name(&self, name: &str) -> bool {
        match self.registry.get(name) {
            Some(class) => {
                self.disable(&class);
                true
            }
            None => false,
        }
    }

    /// 타입으로 비활성화
    pub fn disable_class<T: Component>(&self) -> bool {
        self.disable_by_name(T::NAME)
    }
}
