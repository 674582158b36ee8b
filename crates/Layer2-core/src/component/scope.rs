//! Thread Local Scope - 컴포넌트 인스턴스에 붙는 스레드별 저장소
//!
//! 컴포넌트 인스턴스는 모든 워커 스레드가 공유하므로, 테스트 케이스 단위 상태는
//! 여기에 둡니다. 스레드마다 별도 맵을 쓰므로 락이 없습니다.
//!
//! 저장소는 스레드 종료 시 함께 정리됩니다. 스코프가 먼저 버려져도 살아 있는
//! 스레드의 해당 항목은 스레드가 끝날 때까지 남습니다.

use harness_foundation::{Error, Result};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// 내부용 키 접두사
pub const RESERVED_PREFIX: &str = "__";

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

type ScopeValues = HashMap<String, Box<dyn Any>>;

thread_local! {
    static STORAGE: RefCell<HashMap<u64, ScopeValues>> = RefCell::new(HashMap::new());
}

/// 스레드별 키/값 저장소
#[derive(Debug)]
pub struct ThreadLocalScope {
    id: u64,
}

impl ThreadLocalScope {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// 현재 스레드의 값 (없으면 None)
    pub fn get<V: Clone + 'static>(&self, key: &str) -> Result<Option<V>> {
        check_key(key)?;
        STORAGE.with(|storage| {
            let storage = storage.borrow();
            match storage.get(&self.id).and_then(|values| values.get(key)) {
                Some(value) => value
                    .downcast_ref::<V>()
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| type_mismatch::<V>(key)),
                None => Ok(None),
            }
        })
    }

    pub fn set<V: 'static>(&self, key: &str, value: V) -> Result<()> {
        check_key(key)?;
        STORAGE.with(|storage| {
            storage
                .borrow_mut()
                .entry(self.id)
                .or_default()
                .insert(key.to_string(), Box::new(value));
        });
        Ok(())
    }

    /// 값 삭제 (없는 키는 무시)
    pub fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        STORAGE.with(|storage| {
            let mut storage = storage.borrow_mut();
            if let Some(values) = storage.get_mut(&self.id) {
                values.remove(key);
                if values.is_empty() {
                    storage.remove(&self.id);
                }
            }
        });
        Ok(())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(STORAGE.with(|storage| {
            storage
                .borrow()
                .get(&self.id)
                .is_some_and(|values| values.contains_key(key))
        }))
    }

    /// 값을 제자리에서 수정 (없으면 `default()`로 초기화)
    ///
    /// `f` 실행 중에는 값이 저장소 밖에 있으므로, `f` 안에서 같은 스코프를
    /// 다시 사용해도 됩니다. 이때 같은 키는 보이지 않습니다.
    pub fn with_mut<V, R, D, F>(&self, key: &str, default: D, f: F) -> Result<R>
    where
        V: 'static,
        D: FnOnce() -> V,
        F: FnOnce(&mut V) -> R,
    {
        check_key(key)?;

        let taken = STORAGE.with(|storage| {
            storage
                .borrow_mut()
                .get_mut(&self.id)
                .and_then(|values| values.remove(key))
        });

        let mut value = match taken {
            Some(boxed) => match boxed.downcast::<V>() {
                Ok(value) => value,
                Err(original) => {
                    self.put_back(key, original);
                    return Err(type_mismatch::<V>(key));
                }
            },
            None => Box::new(default()),
        };

        let result = f(&mut value);
        self.put_back(key, value);
        Ok(result)
    }

    fn put_back(&self, key: &str, value: Box<dyn Any>) {
        STORAGE.with(|storage| {
            storage
                .borrow_mut()
                .entry(self.id)
                .or_default()
                .insert(key.to_string(), value);
        });
    }
}

impl Default for ThreadLocalScope {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.starts_with(RESERVED_PREFIX) {
        return Err(Error::InvalidInput(format!(
            "thread-local key '{}' uses the reserved prefix '{}'",
            key, RESERVED_PREFIX
        )));
    }
    Ok(())
}

fn type_mismatch<V>(key: &str) -> Error {
    Error::InvalidInput(format!(
        "thread-local key '{}' does not hold a value of type {}",
        key,
        type_name::<V>()
    ))
}
