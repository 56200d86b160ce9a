//! 即时成员绑定扩展点
//!
//! 让横切关注点（如给任意组件附加命名日志器）无需逐消费者显式绑定：
//! 解析器首次遇到某个具体类型时调用绑定器扫描其注入点，
//! 扫描结果按类型缓存，扫描成本只付一次。

use crate::resolver::ComponentResolver;
use resolver_common::{AnyInstance, BoxError, DependencyError, DependencyResult, Key, TypeInfo};
use std::sync::Arc;

/// 注入点取值函数
pub type ProducerFn =
    Arc<dyn Fn(&dyn ComponentResolver) -> DependencyResult<AnyInstance> + Send + Sync>;

/// 注入点
///
/// 扫描发现的单个成员依赖：点名加注入时调用的取值函数
pub struct InjectionPoint {
    /// 注入点名称
    pub name: String,
    /// 取值函数
    pub producer: ProducerFn,
}

impl InjectionPoint {
    /// 创建新的注入点
    pub fn new(
        name: impl Into<String>,
        producer: impl Fn(&dyn ComponentResolver) -> DependencyResult<AnyInstance>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            producer: Arc::new(producer),
        }
    }
}

impl std::fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("name", &self.name)
            .field("producer", &"<function>")
            .finish()
    }
}

/// 即时成员绑定器 trait
///
/// 按类型扫描注入点；对不关心的类型返回空清单即可
pub trait OnTheFlyBinder: Send + Sync {
    /// 扫描类型的注入点
    fn scan(&self, type_info: &TypeInfo) -> Vec<InjectionPoint>;
}

impl<B: OnTheFlyBinder + ?Sized> OnTheFlyBinder for Arc<B> {
    fn scan(&self, type_info: &TypeInfo) -> Vec<InjectionPoint> {
        (**self).scan(type_info)
    }
}

/// 成员注入目标 trait
///
/// 非解析器实例化的对象（以及选择加入成员注入的受管组件）
/// 通过实现此 trait 接收注入值
pub trait InjectTarget: Send + Sync + 'static {
    /// 接收一个注入点的值
    fn receive(&self, point: &str, value: AnyInstance) -> Result<(), BoxError>;
}

/// 对目标应用其类型的全部注入点
pub fn apply_injection_points<T: InjectTarget>(
    target: &T,
    resolver: &dyn ComponentResolver,
) -> DependencyResult<()> {
    let type_info = TypeInfo::of::<T>();
    let points = resolver.injection_points(&type_info);
    for point in points.iter() {
        let value = (point.producer)(resolver)?;
        target
            .receive(&point.name, value)
            .map_err(|source| DependencyError::SupplyFailed {
                key: Key::of::<T>(),
                source,
            })?;
    }
    Ok(())
}
