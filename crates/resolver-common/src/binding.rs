//! 绑定元数据定义
//!
//! 提供绑定作用域和封闭后注册表的诊断描述符

use serde::Serialize;

/// 绑定作用域
///
/// 决定绑定产出值的生命周期与缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scope {
    /// 原型模式 - 每次解析都重新执行供给策略
    Prototype,
    /// 单例模式 - 首次解析时实例化并缓存，容器生命周期内复用
    Singleton,
    /// 饥饿单例模式 - 缓存语义与单例相同，但在封闭时即实例化，
    /// 提前暴露构造失败并固定单例的可见顺序
    EagerSingleton,
}

impl Default for Scope {
    fn default() -> Self {
        Self::Prototype
    }
}

impl Scope {
    /// 该作用域是否缓存产出值
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Singleton | Self::EagerSingleton)
    }
}

/// 供给策略种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderKind {
    /// 固定实例
    Instance,
    /// 工厂函数
    Supplier,
    /// 构造函数（通过解析器递归解析声明依赖）
    Constructor,
}

/// 绑定描述符
///
/// 封闭后注册表中单个绑定的诊断视图
#[derive(Debug, Clone, Serialize)]
pub struct BindingDescriptor {
    /// 键的显示形式
    pub key: String,
    /// 能力类型名称
    pub type_name: String,
    /// 限定名
    pub qualifier: Option<String>,
    /// 作用域
    pub scope: Scope,
    /// 供给策略种类
    pub provider_kind: ProviderKind,
    /// 声明顺序索引
    pub declaration_index: usize,
    /// 是否注册了生命周期钩子
    pub has_lifecycle: bool,
}
