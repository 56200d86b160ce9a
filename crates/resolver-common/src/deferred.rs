//! 延迟引用
//!
//! 用于打破构造期循环依赖：当某个键正处于构造中时，解析器不再递归，
//! 而是交出一个延迟引用，在原始构造完成后才可取值。

use crate::errors::{DependencyError, DependencyResult};
use crate::key::Key;
use crate::AnyInstance;
use once_cell::sync::OnceCell;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除的延迟引用
///
/// 背后是一个完成单元：目标键构造完成时由解析器兑现。
/// 在兑现之前取值会响亮地失败，绝不交出半构造的对象。
#[derive(Clone)]
pub struct DeferredValue {
    key: Key,
    cell: Arc<OnceCell<AnyInstance>>,
}

impl std::fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredValue")
            .field("key", &self.key)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl DeferredValue {
    /// 创建待兑现的延迟引用，共享目标键的完成单元
    pub fn pending(key: Key, cell: Arc<OnceCell<AnyInstance>>) -> Self {
        Self { key, cell }
    }

    /// 创建已兑现的延迟引用
    pub fn resolved(key: Key, value: AnyInstance) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(value);
        Self {
            key,
            cell: Arc::new(cell),
        }
    }

    /// 目标键
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 是否已兑现
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// 取值，未兑现时返回 [`DependencyError::DeferredNotReady`]
    pub fn get(&self) -> DependencyResult<AnyInstance> {
        self.cell
            .get()
            .cloned()
            .ok_or_else(|| DependencyError::DeferredNotReady {
                key: self.key.clone(),
            })
    }
}

/// 带类型的延迟引用
///
/// 循环依赖双方各自持有对方的 `Deferred`，在各自构造返回之后
/// （即初始化链完成后）才解引用。
pub struct Deferred<T> {
    inner: DeferredValue,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("key", self.inner.key())
            .field("ready", &self.inner.is_ready())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Deferred<T> {
    /// 从类型擦除的延迟引用构造
    pub fn new(inner: DeferredValue) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// 目标键
    pub fn key(&self) -> &Key {
        self.inner.key()
    }

    /// 是否已兑现
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// 取值，未兑现时响亮失败
    pub fn get(&self) -> DependencyResult<Arc<T>> {
        let value = self.inner.get()?;
        value
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                key: self.inner.key().clone(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// 取值，未兑现时返回 `None`
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.get().ok()
    }
}
