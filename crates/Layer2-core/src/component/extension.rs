//! Extension Point - 하나의 인터페이스에 대한 활성 구현체 뷰
//!
//! `resolve()` 순서: 레지스트리 조회 -> 비활성 클래스 제외 -> 활성화 -> 우선순위 안정 정렬.
//! 같은 우선순위는 등록 순서를 유지합니다.

use super::class::ComponentClass;
use super::interface::Interface;
use super::manager::ComponentManager;
use harness_foundation::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{error, trace};

// ============================================================================
// Extension - 인터페이스로 캐스트된 인스턴스
// ============================================================================

/// 확장 포인트가 반환하는 구현체
pub struct Extension<I: ?Sized> {
    class: Arc<ComponentClass>,
    object: Arc<I>,
}

impl<I: ?Sized> Extension<I> {
    pub fn name(&self) -> &'static str {
        self.class.name()
    }

    pub fn priority(&self) -> i32 {
        self.class.priority()
    }

    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    pub fn object(&self) -> &Arc<I> {
        &self.object
    }
}

impl<I: ?Sized> Clone for Extension<I> {
    fn clone(&self) -> Self {
        Self {
            class: Arc::clone(&self.class),
            object: Arc::clone(&self.object),
        }
    }
}

impl<I: ?Sized> Deref for Extension<I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.object
    }
}

impl<I: ?Sized> fmt::Debug for Extension<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .finish()
    }
}

// ============================================================================
// ExtensionPoint
// ============================================================================

/// 인터페이스 `I`에 바인딩된 확장 포인트
pub struct ExtensionPoint<'a, I: Interface + ?Sized> {
    manager: &'a ComponentManager,
    _marker: PhantomData<fn(&I)>,
}

impl<'a, I: Interface + ?Sized> ExtensionPoint<'a, I> {
    pub fn new(manager: &'a ComponentManager) -> Self {
        Self {
            manager,
            _marker: PhantomData,
        }
    }

    /// 활성 구현체 목록 (우선순위 오름차순, 동률은 등록 순서)
    ///
    /// 비활성 클래스는 조용히 제외됩니다. 활성화 실패는 호출자에게 전파됩니다.
    pub fn resolve(&self) -> Result<Vec<Extension<I>>> {
        let classes = self.manager.registry().implementors::<I>();
        let mut extensions = Vec::with_capacity(classes.len());

        for class in classes {
            if !self.manager.is_enabled(&class) {
                continue;
            }

            let instance = self.manager.get_or_activate(&class)?;
            let object = instance.cast::<I>().ok_or_else(|| {
                Error::Internal(format!(
                    "component {} is registered for {} but cannot be cast to it",
                    class.name(),
                    I::NAME
                ))
            })?;

            extensions.push(Extension { class, object });
        }

        // sort_by_key는 안정 정렬
        extensions.sort_by_key(|ext| ext.priority());
        Ok(extensions)
    }

    /// 모든 구현체에 대해 순차 호출
    ///
    /// 호출 스레드에서 정렬 순서대로 실행하며, 첫 실패에서 해당 컴포넌트 이름을
    /// 붙여 즉시 반환합니다. 나머지 컴포넌트는 호출되지 않습니다.
    pub fn broadcast<F>(&self, event: &str, mut call: F) -> Result<()>
    where
        F: FnMut(&I) -> Result<()>,
    {
        for ext in self.resolve()? {
            trace!("Broadcasting {} to {}", event, ext.name());

            if let Err(e) = call(&*ext) {
                error!("Component {} failed during {}: {}", ext.name(), event, e);
                return Err(Error::broadcast(event, ext.name(), e));
            }
        }
        Ok(())
    }

    /// 활성 구현체 이름 (정렬 순서)
    pub fn names(&self) -> Result<Vec<&'static str>> {
        Ok(self.resolve()?.iter().map(Extension::name).collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.resolve()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.resolve()?.is_empty())
    }
}
