//! 组件解析器契约
//!
//! 对象安全的核心接口加泛型便捷层：核心接口以键为参数、
//! 以类型擦除实例为结果，便于构造函数通过 `&dyn ComponentResolver`
//! 递归解析；泛型层负责类型还原和失败语义。

use crate::injection::InjectionPoint;
use resolver_common::{
    AnyInstance, Deferred, DeferredValue, DependencyError, DependencyResult, Key, TypeInfo,
};
use std::any::TypeId;
use std::sync::Arc;

/// 单键查找结果
#[derive(Clone)]
pub enum Lookup {
    /// 本解析器及父级中都不存在该键的绑定
    Missing,
    /// 键已绑定但供给策略未产生值
    Empty(Key),
    /// 解析成功
    Value(AnyInstance),
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("Lookup::Missing"),
            Self::Empty(key) => write!(f, "Lookup::Empty({})", key),
            Self::Value(_) => f.write_str("Lookup::Value(<instance>)"),
        }
    }
}

/// 组件解析器 trait
///
/// 封闭后的容器契约；所有方法对象安全，构造函数和即时绑定器
/// 都通过 `&dyn ComponentResolver` 使用它
pub trait ComponentResolver: Send + Sync {
    /// 按键查找，应用作用域与循环解析规则
    fn lookup(&self, key: &Key) -> DependencyResult<Lookup>;

    /// 查找能力类型的全部绑定（跨限定名），按声明顺序返回
    fn lookup_all(&self, type_id: TypeId) -> DependencyResult<Vec<AnyInstance>>;

    /// 获取键的延迟引用
    ///
    /// 键已完成则立即兑现；键在当前线程构造中则返回待兑现引用
    /// （打破循环）；否则立即解析
    fn lookup_deferred(&self, key: &Key) -> DependencyResult<DeferredValue>;

    /// 类型的注入点清单，首次请求时扫描并缓存
    fn injection_points(&self, type_info: &TypeInfo) -> Arc<Vec<InjectionPoint>>;

    /// 本解析器或父级中是否存在该键的绑定
    fn contains(&self, key: &Key) -> bool;
}

/// 泛型便捷层
///
/// 对所有 [`ComponentResolver`]（包括 `dyn ComponentResolver`）
/// 统一提供带类型的查找方法
pub trait ResolverExt: ComponentResolver {
    /// 解析组件，未绑定时返回 `None`
    fn get<T: Send + Sync + 'static>(&self) -> DependencyResult<Option<Arc<T>>> {
        self.get_by_key(&Key::of::<T>())
    }

    /// 按限定名解析组件，未绑定时返回 `None`
    fn get_named<T: Send + Sync + 'static>(
        &self,
        qualifier: impl Into<String>,
    ) -> DependencyResult<Option<Arc<T>>> {
        self.get_by_key(&Key::named::<T>(qualifier))
    }

    /// 按键解析组件，未绑定或未产生值时返回 `None`
    fn get_by_key<T: Send + Sync + 'static>(
        &self,
        key: &Key,
    ) -> DependencyResult<Option<Arc<T>>> {
        match self.lookup(key)? {
            Lookup::Missing | Lookup::Empty(_) => Ok(None),
            Lookup::Value(value) => downcast::<T>(key, value).map(Some),
        }
    }

    /// 解析组件，未绑定时响亮失败
    fn require<T: Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        self.require_by_key(&Key::of::<T>())
    }

    /// 按限定名解析组件，未绑定时响亮失败
    fn require_named<T: Send + Sync + 'static>(
        &self,
        qualifier: impl Into<String>,
    ) -> DependencyResult<Arc<T>> {
        self.require_by_key(&Key::named::<T>(qualifier))
    }

    /// 按键解析组件
    ///
    /// "未绑定"与"绑定未产生值"是两种可区分的失败
    fn require_by_key<T: Send + Sync + 'static>(&self, key: &Key) -> DependencyResult<Arc<T>> {
        match self.lookup(key)? {
            Lookup::Missing => Err(DependencyError::NoSuchBinding { key: key.clone() }),
            Lookup::Empty(key) => Err(DependencyError::EmptyValue { key }),
            Lookup::Value(value) => downcast::<T>(key, value),
        }
    }

    /// 解析能力类型的全部绑定，按声明顺序
    fn get_all<T: Send + Sync + 'static>(&self) -> DependencyResult<Vec<Arc<T>>> {
        let key = Key::of::<T>();
        self.lookup_all(TypeId::of::<T>())?
            .into_iter()
            .map(|value| downcast::<T>(&key, value))
            .collect()
    }

    /// 解析能力类型的全部绑定，空集合时响亮失败
    fn require_all<T: Send + Sync + 'static>(&self) -> DependencyResult<Vec<Arc<T>>> {
        let values = self.get_all::<T>()?;
        if values.is_empty() {
            return Err(DependencyError::EmptyCollection {
                type_name: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(values)
    }

    /// 获取延迟引用，循环依赖的参与方借此互相引用
    fn deferred<T: Send + Sync + 'static>(&self) -> DependencyResult<Deferred<T>> {
        self.lookup_deferred(&Key::of::<T>()).map(Deferred::new)
    }

    /// 按限定名获取延迟引用
    fn deferred_named<T: Send + Sync + 'static>(
        &self,
        qualifier: impl Into<String>,
    ) -> DependencyResult<Deferred<T>> {
        self.lookup_deferred(&Key::named::<T>(qualifier))
            .map(Deferred::new)
    }

    /// 是否存在该能力类型的无限定名绑定
    fn is_bound<T: Send + Sync + 'static>(&self) -> bool {
        self.contains(&Key::of::<T>())
    }
}

impl<R: ComponentResolver + ?Sized> ResolverExt for R {}

fn downcast<T: Send + Sync + 'static>(key: &Key, value: AnyInstance) -> DependencyResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            key: key.clone(),
            expected: std::any::type_name::<T>().to_string(),
        })
}
