//! 绑定配置表面
//!
//! 可变注册阶段的入口：模块通过 [`Binder`] 发出 `bind` 调用，
//! 封闭由所有权转移完成——构建器消费 Binder 之后，
//! 进一步的 `bind` 调用在类型层面即不可表达。

use crate::injection::{apply_injection_points, InjectTarget};
use crate::provider::{
    BindingDefinition, ConstructorFn, LifecycleHooks, MemberInjectFn, Provider, StartFn, StopFn,
    SupplierFn,
};
use crate::resolver::ComponentResolver;
use resolver_common::{AnyInstance, BoxError, DependencyError, DependencyResult, Key, Lifecycle, Scope};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 绑定器
///
/// 注册阶段单线程使用；绑定顺序即声明顺序，
/// 决定饥饿单例的实例化次序和集合绑定的返回次序
#[derive(Debug, Default)]
pub struct Binder {
    definitions: Vec<BindingDefinition>,
}

impl Binder {
    /// 创建新的绑定器
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始绑定一个能力类型
    ///
    /// 返回的构建器用 `.named` / `.in_scope` 等方法修饰，
    /// 最终以 `to_instance` / `to_supplier` / `to_constructor` 落定供给策略
    pub fn bind<T: Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, T> {
        self.push::<T>(false)
    }

    /// 显式重绑定一个能力类型
    ///
    /// 封闭时替换同键的先前定义；普通的二次 `bind` 仍是封闭期的重复绑定错误
    pub fn rebind<T: Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, T> {
        self.push::<T>(true)
    }

    /// 便捷方法：绑定固定实例
    pub fn bind_instance<T: Send + Sync + 'static>(&mut self, value: T) {
        self.bind::<T>().to_instance(value);
    }

    /// 便捷方法：绑定工厂函数
    pub fn bind_supplier<T, F, E>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.bind::<T>().to_supplier(factory);
    }

    /// 便捷方法：绑定构造函数
    pub fn bind_constructor<T, F>(&mut self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn ComponentResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.bind::<T>().to_constructor(constructor);
    }

    /// 已登记的绑定定义数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 是否尚无绑定定义
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 交出全部绑定定义，供封闭阶段使用
    pub fn into_definitions(self) -> Vec<BindingDefinition> {
        self.definitions
    }

    fn push<T: Send + Sync + 'static>(&mut self, is_rebind: bool) -> BindingBuilder<'_, T> {
        let mut definition = BindingDefinition::new(Key::of::<T>());
        definition.is_rebind = is_rebind;
        debug!("登记绑定定义: {}", definition.key);
        self.definitions.push(definition);
        BindingBuilder {
            definition: self.definitions.last_mut().expect("刚刚推入的定义必然存在"),
            _marker: PhantomData,
        }
    }
}

/// 单个绑定的流式构建器
///
/// 在落定供给策略前修饰键、作用域和初始化链
pub struct BindingBuilder<'a, T> {
    definition: &'a mut BindingDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> BindingBuilder<'a, T> {
    /// 设置限定名，空字符串归一化为无限定名
    pub fn named(self, qualifier: impl Into<String>) -> Self {
        self.definition.key = self.definition.key.clone().with_qualifier(qualifier);
        self
    }

    /// 设置作用域
    pub fn in_scope(self, scope: Scope) -> Self {
        self.definition.scope = scope;
        self
    }

    /// 单例作用域的简写
    pub fn singleton(self) -> Self {
        self.in_scope(Scope::Singleton)
    }

    /// 饥饿单例作用域的简写
    pub fn eager_singleton(self) -> Self {
        self.in_scope(Scope::EagerSingleton)
    }

    /// 选择加入生命周期初始化链
    ///
    /// 构造完成后调用 `on_start`，容器关闭时逆序调用 `on_stop`
    pub fn with_lifecycle(self) -> Self
    where
        T: Lifecycle,
    {
        let start: StartFn = Arc::new(|instance: &AnyInstance| -> Result<(), BoxError> {
            match instance.clone().downcast::<T>() {
                Ok(component) => component.on_start(),
                Err(_) => Err("生命周期钩子类型不匹配".into()),
            }
        });
        let stop: StopFn = Arc::new(|instance: &AnyInstance| -> Result<(), BoxError> {
            match instance.clone().downcast::<T>() {
                Ok(component) => component.on_stop(),
                Err(_) => Err("生命周期钩子类型不匹配".into()),
            }
        });
        self.definition.lifecycle = Some(LifecycleHooks { start, stop });
        self
    }

    /// 选择加入即时成员注入
    ///
    /// 构造完成后、生命周期启动前，应用该类型扫描出的全部注入点
    pub fn with_member_injection(self) -> Self
    where
        T: InjectTarget,
    {
        let inject: MemberInjectFn = Arc::new(
            |instance: &AnyInstance, resolver: &dyn ComponentResolver| -> DependencyResult<()> {
                let target =
                    instance
                        .clone()
                        .downcast::<T>()
                        .map_err(|_| DependencyError::TypeMismatch {
                            key: Key::of::<T>(),
                            expected: std::any::type_name::<T>().to_string(),
                        })?;
                apply_injection_points(target.as_ref(), resolver)
            },
        );
        self.definition.member_injection = Some(inject);
        self
    }

    /// 以固定实例落定供给策略
    pub fn to_instance(self, value: T) {
        self.definition.provider = Some(Provider::Instance(Arc::new(value) as AnyInstance));
    }

    /// 以工厂函数落定供给策略
    pub fn to_supplier<F, E>(self, factory: F)
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let supplier: SupplierFn = Arc::new(move || {
            factory()
                .map(|value| Some(Arc::new(value) as AnyInstance))
                .map_err(Into::into)
        });
        self.definition.provider = Some(Provider::Supplier(supplier));
    }

    /// 以可能不产生值的工厂函数落定供给策略
    ///
    /// 返回 `Ok(None)` 时，`get` 视为缺值，`require` 报告
    /// "绑定未产生有效值"
    pub fn to_optional_supplier<F, E>(self, factory: F)
    where
        F: Fn() -> Result<Option<T>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let supplier: SupplierFn = Arc::new(move || {
            factory()
                .map(|value| value.map(|value| Arc::new(value) as AnyInstance))
                .map_err(Into::into)
        });
        self.definition.provider = Some(Provider::Supplier(supplier));
    }

    /// 以构造函数落定供给策略
    ///
    /// 构造函数通过解析器递归解析声明依赖，供给失败原样向上传播
    pub fn to_constructor<F>(self, constructor: F)
    where
        F: Fn(&dyn ComponentResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        let constructor: ConstructorFn = Arc::new(move |resolver: &dyn ComponentResolver| {
            constructor(resolver).map(|value| Arc::new(value) as AnyInstance)
        });
        self.definition.provider = Some(Provider::Constructor(constructor));
    }
}
