//! 初始化链
//!
//! 供给策略产出实例之后、实例对请求方可见之前的固定步骤：
//! 先补齐成员依赖，再调用启动钩子。任一步失败都视为该键
//! 解析失败，实例不缓存、不记录为已启动。

use crate::container::ComponentResolverImpl;
use crate::registry::BindingEntry;
use resolver_common::{AnyInstance, DependencyError, DependencyResult};
use tracing::debug;

pub(crate) fn run_initializer_chain(
    resolver: &ComponentResolverImpl,
    binding: &BindingEntry,
    value: &AnyInstance,
) -> DependencyResult<()> {
    if let Some(inject) = &binding.member_injection {
        debug!("应用成员注入: {}", binding.key);
        inject(value, resolver)?;
    }

    if let Some(hooks) = &binding.lifecycle {
        debug!("调用启动钩子: {}", binding.key);
        (hooks.start)(value).map_err(|source| DependencyError::InitializationFailed {
            key: binding.key.clone(),
            source,
        })?;
        resolver.record_started(binding.key.clone(), value.clone(), hooks.stop.clone());
    }

    Ok(())
}
