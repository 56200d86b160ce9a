//! 即时成员绑定引擎
//!
//! 首次遇到某个具体类型时调用即时绑定器扫描其注入点，
//! 结果按类型缓存；未配置即时绑定器时所有类型的清单为空。

use crate::container::ComponentResolverImpl;
use resolver_abstractions::{apply_injection_points, InjectTarget, InjectionPoint};
use resolver_common::{DependencyResult, TypeInfo};
use std::sync::Arc;
use tracing::debug;

impl ComponentResolverImpl {
    pub(crate) fn injection_points_cached(&self, type_info: &TypeInfo) -> Arc<Vec<InjectionPoint>> {
        let Some(binder) = &self.on_the_fly else {
            return Arc::new(Vec::new());
        };
        self.injection_cache
            .entry(type_info.id)
            .or_insert_with(|| {
                debug!("扫描注入点: {}", type_info.short_name());
                Arc::new(binder.scan(type_info))
            })
            .clone()
    }

    /// 为非解析器实例化的对象补齐成员依赖
    ///
    /// 对象本身不进入容器管理，只应用其类型扫描出的注入点
    pub fn inject_members<T: InjectTarget>(&self, target: &T) -> DependencyResult<()> {
        apply_injection_points(target, self)
    }
}
