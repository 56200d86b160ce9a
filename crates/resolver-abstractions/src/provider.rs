//! 供给策略定义
//!
//! 绑定把键关联到恰好一种供给策略：固定实例、工厂函数
//! 或通过解析器递归解析依赖的构造函数。

use crate::resolver::ComponentResolver;
use resolver_common::{AnyInstance, BoxError, DependencyResult, Key, ProviderKind, Scope};
use std::sync::Arc;

/// 工厂函数类型
///
/// 返回 `Ok(None)` 表示绑定存在但未产生值，`require` 会将其
/// 报告为"绑定未产生有效值"，与"未绑定"区分开
pub type SupplierFn = Arc<dyn Fn() -> Result<Option<AnyInstance>, BoxError> + Send + Sync>;

/// 构造函数类型
///
/// 通过传入的解析器递归解析声明依赖
pub type ConstructorFn =
    Arc<dyn Fn(&dyn ComponentResolver) -> DependencyResult<AnyInstance> + Send + Sync>;

/// 生命周期启动钩子适配器
pub type StartFn = Arc<dyn Fn(&AnyInstance) -> Result<(), BoxError> + Send + Sync>;

/// 生命周期停止钩子适配器
pub type StopFn = Arc<dyn Fn(&AnyInstance) -> Result<(), BoxError> + Send + Sync>;

/// 成员注入适配器
pub type MemberInjectFn =
    Arc<dyn Fn(&AnyInstance, &dyn ComponentResolver) -> DependencyResult<()> + Send + Sync>;

/// 供给策略
#[derive(Clone)]
pub enum Provider {
    /// 固定实例
    Instance(AnyInstance),
    /// 工厂函数
    Supplier(SupplierFn),
    /// 构造函数
    Constructor(ConstructorFn),
}

impl Provider {
    /// 供给策略种类
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Instance(_) => ProviderKind::Instance,
            Self::Supplier(_) => ProviderKind::Supplier,
            Self::Constructor(_) => ProviderKind::Constructor,
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Provider::Instance"),
            Self::Supplier(_) => f.write_str("Provider::Supplier(<function>)"),
            Self::Constructor(_) => f.write_str("Provider::Constructor(<function>)"),
        }
    }
}

/// 生命周期钩子适配器对
///
/// 在绑定时捕获具体类型，解析器无需反射即可调用钩子
#[derive(Clone)]
pub struct LifecycleHooks {
    /// 构造完成后调用
    pub start: StartFn,
    /// 容器关闭时按启动顺序逆序调用
    pub stop: StopFn,
}

/// 绑定定义
///
/// 可变注册阶段的绑定形态；供给策略在封闭前必须就位，
/// 否则封闭失败并指明违规类型
pub struct BindingDefinition {
    /// 绑定键
    pub key: Key,
    /// 作用域
    pub scope: Scope,
    /// 供给策略
    pub provider: Option<Provider>,
    /// 生命周期钩子
    pub lifecycle: Option<LifecycleHooks>,
    /// 成员注入适配器
    pub member_injection: Option<MemberInjectFn>,
    /// 是否为显式重绑定（封闭时替换同键的先前定义）
    pub is_rebind: bool,
}

impl BindingDefinition {
    /// 创建新的绑定定义，默认原型作用域
    pub fn new(key: Key) -> Self {
        Self {
            key,
            scope: Scope::default(),
            provider: None,
            lifecycle: None,
            member_injection: None,
            is_rebind: false,
        }
    }
}

impl std::fmt::Debug for BindingDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingDefinition")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("provider", &self.provider)
            .field("lifecycle", &self.lifecycle.is_some())
            .field("member_injection", &self.member_injection.is_some())
            .field("is_rebind", &self.is_rebind)
            .finish()
    }
}
