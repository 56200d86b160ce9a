//! 封闭容器实现
//!
//! 解析器在构建器消费掉绑定器的那一刻封闭，此后只读共享。
//! 单例缓存与首次实例化互斥表保证"至多构造一次"；
//! 构造中标记按线程记录，同一线程内的递归回环被改写为
//! 延迟引用或循环依赖错误，而不是死锁。

use crate::initializer::run_initializer_chain;
use crate::registry::{BindingEntry, SealedRegistry};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use resolver_abstractions::{
    ComponentResolver, InjectionPoint, Lookup, Module, OnTheFlyBinder, Provider, StopFn,
};
use resolver_common::{
    AnyInstance, BuildResult, DeferredValue, DependencyError, DependencyResult, Key,
    LifecycleError, LifecycleResult, Scope, TypeInfo,
};
use serde::Serialize;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

thread_local! {
    // 构造中标记: (容器ID, 键) → 完成单元。
    // 线程级作用域使不同线程上互不相关的构造不会伪装成循环。
    static IN_FLIGHT: RefCell<HashMap<(Uuid, Key), Arc<OnceCell<AnyInstance>>>> =
        RefCell::new(HashMap::new());
}

/// 已启动的组件，关闭时逆序停止
struct StartedComponent {
    key: Key,
    instance: AnyInstance,
    stop: StopFn,
}

/// 容器运行统计
#[derive(Debug, Clone, Serialize)]
pub struct ResolverStats {
    /// 注册表中的绑定数量
    pub bindings: usize,
    /// 已缓存的单例数量
    pub cached_singletons: usize,
    /// 已启动的组件数量
    pub started_components: usize,
    /// 累计解析请求次数
    pub resolutions: u64,
    /// 累计解析失败次数
    pub resolution_failures: u64,
}

/// 封闭后的组件解析器
///
/// 通过 [`ResolverBuilder`] 构建；支持父子层级，
/// 本级缺失的键回退到父级解析
pub struct ComponentResolverImpl {
    id: Uuid,
    registry: SealedRegistry,
    parent: Option<Arc<ComponentResolverImpl>>,
    cache: DashMap<Key, AnyInstance>,
    materialization_locks: DashMap<Key, Arc<Mutex<()>>>,
    started: Mutex<Vec<StartedComponent>>,
    pub(crate) on_the_fly: Option<Arc<dyn OnTheFlyBinder>>,
    pub(crate) injection_cache: DashMap<TypeId, Arc<Vec<InjectionPoint>>>,
    sealed_at: DateTime<Utc>,
    resolutions: AtomicU64,
    resolution_failures: AtomicU64,
}

impl std::fmt::Debug for ComponentResolverImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentResolverImpl")
            .field("id", &self.id)
            .field("bindings", &self.registry.len())
            .field("has_parent", &self.parent.is_some())
            .field("sealed_at", &self.sealed_at)
            .finish()
    }
}

impl ComponentResolverImpl {
    /// 从单个模块构建解析器的简写
    pub fn build(module: impl Module + 'static) -> BuildResult<Arc<Self>> {
        ResolverBuilder::new().with_module(module).build()
    }

    /// 容器实例ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 封闭时刻
    pub fn sealed_at(&self) -> DateTime<Utc> {
        self.sealed_at
    }

    /// 父级解析器
    pub fn parent(&self) -> Option<&Arc<ComponentResolverImpl>> {
        self.parent.as_ref()
    }

    /// 容器运行统计快照
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            bindings: self.registry.len(),
            cached_singletons: self.cache.len(),
            started_components: self.started.lock().len(),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
        }
    }

    /// 本级注册表的诊断描述符，按声明顺序
    pub fn descriptors(&self) -> Vec<resolver_common::BindingDescriptor> {
        self.registry.descriptors()
    }

    /// 关闭容器
    ///
    /// 按启动顺序逆序调用各组件的停止钩子；单个钩子失败
    /// 只记录，不阻止其余组件停止
    pub fn shutdown(&self) -> LifecycleResult<()> {
        let mut started = self.started.lock();
        if started.is_empty() {
            return Ok(());
        }
        info!("关闭容器, 逆序停止 {} 个组件", started.len());

        let mut failed = Vec::new();
        for component in started.drain(..).rev() {
            debug!("停止组件: {}", component.key);
            if let Err(error) = (component.stop)(&component.instance) {
                warn!("组件停止失败: {}, 原因: {}", component.key, error);
                failed.push(component.key.to_string());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ShutdownFailed { failed })
        }
    }

    pub(crate) fn record_started(&self, key: Key, instance: AnyInstance, stop: StopFn) {
        self.started.lock().push(StartedComponent {
            key,
            instance,
            stop,
        });
    }

    fn in_flight_cell(&self, key: &Key) -> Option<Arc<OnceCell<AnyInstance>>> {
        IN_FLIGHT.with(|frames| frames.borrow().get(&(self.id, key.clone())).cloned())
    }

    fn push_in_flight(&self, key: &Key) -> Arc<OnceCell<AnyInstance>> {
        let cell = Arc::new(OnceCell::new());
        IN_FLIGHT.with(|frames| {
            frames.borrow_mut().insert((self.id, key.clone()), cell.clone());
        });
        cell
    }

    fn pop_in_flight(&self, key: &Key) {
        IN_FLIGHT.with(|frames| {
            frames.borrow_mut().remove(&(self.id, key.clone()));
        });
    }

    fn resolve_entry(&self, key: &Key) -> DependencyResult<Lookup> {
        let Some(binding) = self.registry.binding(key) else {
            return match &self.parent {
                Some(parent) => parent.resolve_entry(key),
                None => Ok(Lookup::Missing),
            };
        };
        let binding = binding.clone();
        if binding.scope.is_cached() {
            self.resolve_cached(&binding)
        } else {
            self.resolve_prototype(&binding)
        }
    }

    fn resolve_cached(&self, binding: &Arc<BindingEntry>) -> DependencyResult<Lookup> {
        let key = &binding.key;
        if let Some(cached) = self.cache.get(key) {
            return Ok(Lookup::Value(cached.value().clone()));
        }
        // 同一线程在该键的构造过程中直接 require 自身：改写为
        // 循环依赖错误而不是在非重入锁上自我等待
        if self.in_flight_cell(key).is_some() {
            return Err(DependencyError::CircularDependency { key: key.clone() });
        }

        let lock = self
            .materialization_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        // 等锁期间其他线程可能已完成首次实例化
        if let Some(cached) = self.cache.get(key) {
            return Ok(Lookup::Value(cached.value().clone()));
        }

        match self.construct(binding)? {
            Some(value) => {
                self.cache.insert(key.clone(), value.clone());
                Ok(Lookup::Value(value))
            }
            // 空值不缓存，后续解析可重试
            None => Ok(Lookup::Empty(key.clone())),
        }
    }

    fn resolve_prototype(&self, binding: &Arc<BindingEntry>) -> DependencyResult<Lookup> {
        match self.construct(binding)? {
            Some(value) => Ok(Lookup::Value(value)),
            None => Ok(Lookup::Empty(binding.key.clone())),
        }
    }

    /// 执行供给策略与初始化链
    ///
    /// 构造失败时不缓存任何状态，构造中标记随栈展开一并清除
    fn construct(&self, binding: &Arc<BindingEntry>) -> DependencyResult<Option<AnyInstance>> {
        let key = binding.key.clone();
        if self.in_flight_cell(&key).is_some() {
            return Err(DependencyError::CircularDependency { key });
        }
        let cell = self.push_in_flight(&key);
        let frame = InFlightFrame {
            resolver: self,
            key: key.clone(),
        };

        trace!("构造组件: {}", key);
        let produced = self.run_provider(binding)?;
        let Some(value) = produced else {
            debug!("绑定未产生值: {}", key);
            return Ok(None);
        };

        run_initializer_chain(self, binding, &value)?;

        // 先兑现延迟引用，再清除构造中标记
        let _ = cell.set(value.clone());
        drop(frame);
        debug!("组件就绪: {}", key);
        Ok(Some(value))
    }

    fn run_provider(&self, binding: &BindingEntry) -> DependencyResult<Option<AnyInstance>> {
        match &binding.provider {
            Provider::Instance(value) => Ok(Some(value.clone())),
            Provider::Supplier(factory) => {
                factory().map_err(|source| DependencyError::SupplyFailed {
                    key: binding.key.clone(),
                    source,
                })
            }
            Provider::Constructor(constructor) => constructor(self).map(Some),
        }
    }

    fn resolve_deferred(&self, key: &Key) -> DependencyResult<DeferredValue> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(DeferredValue::resolved(key.clone(), cached.value().clone()));
        }
        if let Some(cell) = self.in_flight_cell(key) {
            trace!("键构造中, 交出待兑现的延迟引用: {}", key);
            return Ok(DeferredValue::pending(key.clone(), cell));
        }
        match self.resolve_entry(key)? {
            Lookup::Value(value) => Ok(DeferredValue::resolved(key.clone(), value)),
            Lookup::Empty(key) => Err(DependencyError::EmptyValue { key }),
            Lookup::Missing => Err(DependencyError::NoSuchBinding { key: key.clone() }),
        }
    }

    /// 按声明顺序实例化全部饥饿单例
    fn materialize_eager(&self) -> DependencyResult<()> {
        for binding in self.registry.iter() {
            if binding.scope != Scope::EagerSingleton {
                continue;
            }
            info!("饥饿单例实例化: {}", binding.key);
            match self.resolve_cached(binding)? {
                Lookup::Value(_) => {}
                Lookup::Empty(key) => return Err(DependencyError::EmptyValue { key }),
                Lookup::Missing => {
                    return Err(DependencyError::NoSuchBinding {
                        key: binding.key.clone(),
                    })
                }
            }
        }
        Ok(())
    }
}

impl ComponentResolver for ComponentResolverImpl {
    fn lookup(&self, key: &Key) -> DependencyResult<Lookup> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        trace!("解析请求: {}", key);
        match self.resolve_entry(key) {
            Ok(result) => Ok(result),
            Err(error) => {
                self.resolution_failures.fetch_add(1, Ordering::Relaxed);
                warn!("解析失败: {}, 原因: {}", key, error);
                Err(error)
            }
        }
    }

    fn lookup_all(&self, type_id: TypeId) -> DependencyResult<Vec<AnyInstance>> {
        let bindings = self.registry.bindings_of(type_id);
        if bindings.is_empty() {
            return match &self.parent {
                Some(parent) => parent.lookup_all(type_id),
                None => Ok(Vec::new()),
            };
        }
        let mut values = Vec::with_capacity(bindings.len());
        for binding in bindings {
            // 未产生值的绑定不计入集合
            if let Lookup::Value(value) = self.resolve_entry(&binding.key)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn lookup_deferred(&self, key: &Key) -> DependencyResult<DeferredValue> {
        self.resolve_deferred(key)
    }

    fn injection_points(&self, type_info: &TypeInfo) -> Arc<Vec<InjectionPoint>> {
        self.injection_points_cached(type_info)
    }

    fn contains(&self, key: &Key) -> bool {
        self.registry.binding(key).is_some()
            || self
                .parent
                .as_ref()
                .map_or(false, |parent| parent.contains(key))
    }
}

/// 构造中标记的栈帧守卫
///
/// 无论构造成功与否，离开构造栈帧时清除标记
struct InFlightFrame<'a> {
    resolver: &'a ComponentResolverImpl,
    key: Key,
}

impl Drop for InFlightFrame<'_> {
    fn drop(&mut self) {
        self.resolver.pop_in_flight(&self.key);
    }
}

/// 解析器构建器
///
/// 收集模块后一次性封闭：配置全部模块、固化注册表、
/// 实例化饥饿单例，任何一步失败都使构建整体失败
#[derive(Default)]
pub struct ResolverBuilder {
    modules: Vec<Box<dyn Module>>,
    on_the_fly: Option<Arc<dyn OnTheFlyBinder>>,
    parent: Option<Arc<ComponentResolverImpl>>,
}

impl ResolverBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个配置模块，按加入顺序配置
    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// 设置即时成员绑定器
    pub fn with_on_the_fly_binder(mut self, binder: impl OnTheFlyBinder + 'static) -> Self {
        self.on_the_fly = Some(Arc::new(binder));
        self
    }

    /// 设置父级解析器，本级缺失的键回退到父级
    pub fn with_parent(mut self, parent: Arc<ComponentResolverImpl>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 封闭并构建解析器
    pub fn build(self) -> BuildResult<Arc<ComponentResolverImpl>> {
        let mut binder = resolver_abstractions::Binder::new();
        for module in &self.modules {
            module.configure(&mut binder)?;
        }

        let registry = SealedRegistry::seal(binder)?;
        info!("注册表封闭完成, 共 {} 个绑定", registry.len());

        let resolver = Arc::new(ComponentResolverImpl {
            id: Uuid::new_v4(),
            registry,
            parent: self.parent,
            cache: DashMap::new(),
            materialization_locks: DashMap::new(),
            started: Mutex::new(Vec::new()),
            on_the_fly: self.on_the_fly,
            injection_cache: DashMap::new(),
            sealed_at: Utc::now(),
            resolutions: AtomicU64::new(0),
            resolution_failures: AtomicU64::new(0),
        });

        resolver.materialize_eager()?;
        Ok(resolver)
    }
}
