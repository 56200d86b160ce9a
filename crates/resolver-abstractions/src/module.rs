//! 模块配置表面
//!
//! 模块是接收可变绑定器的配置回调；多个模块通过 [`extend`]
//! 组合为并集，原模块保持不变。

use crate::binder::Binder;
use resolver_common::ConfigurationResult;
use std::sync::Arc;

/// 配置模块 trait
///
/// 普通函数和闭包天然满足此契约
pub trait Module: Send + Sync {
    /// 向绑定器发出 `bind` 调用
    fn configure(&self, binder: &mut Binder) -> ConfigurationResult<()>;
}

impl<F> Module for F
where
    F: Fn(&mut Binder) -> ConfigurationResult<()> + Send + Sync,
{
    fn configure(&self, binder: &mut Binder) -> ConfigurationResult<()> {
        (self)(binder)
    }
}

/// 组合模块
///
/// 按加入顺序依次配置；`extend` 的结果仍是模块，可继续组合
#[derive(Clone, Default)]
pub struct CombinedModule {
    modules: Vec<Arc<dyn Module>>,
}

impl CombinedModule {
    /// 创建空的组合模块
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个模块
    pub fn with(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    /// 已组合的模块数量
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Module for CombinedModule {
    fn configure(&self, binder: &mut Binder) -> ConfigurationResult<()> {
        for module in &self.modules {
            module.configure(binder)?;
        }
        Ok(())
    }
}

/// 组合两个模块为并集，原模块保持不变
pub fn extend(first: impl Module + 'static, second: impl Module + 'static) -> CombinedModule {
    CombinedModule::new().with(first).with(second)
}
