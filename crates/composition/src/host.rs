//! 运行期宿主
//!
//! 持有封闭后的解析器并管理其关闭时机：等待中断信号，
//! 随后按启动顺序逆序停止组件。

use chrono::{DateTime, Duration, Utc};
use resolver_common::{BindingDescriptor, InfrastructureError, InfrastructureResult};
use resolver_impl::{ComponentResolverImpl, ResolverStats};
use std::sync::Arc;
use tracing::info;

/// 运行期宿主
pub struct ResolutionHost {
    resolver: Arc<ComponentResolverImpl>,
    started_at: DateTime<Utc>,
}

impl ResolutionHost {
    pub(crate) fn new(resolver: Arc<ComponentResolverImpl>) -> Self {
        Self {
            resolver,
            started_at: Utc::now(),
        }
    }

    /// 封闭后的解析器
    pub fn resolver(&self) -> &Arc<ComponentResolverImpl> {
        &self.resolver
    }

    /// 宿主已运行时长
    pub fn uptime(&self) -> Duration {
        Utc::now() - self.started_at
    }

    /// 容器运行统计快照
    pub fn stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    /// 注册表的诊断描述符
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.resolver.descriptors()
    }

    /// 等待中断信号后关闭
    pub async fn wait_for_shutdown(&self) -> InfrastructureResult<()> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("等待关闭信号失败: {}", e),
            })?;
        info!("收到关闭信号");
        self.shutdown()
    }

    /// 立即关闭，按启动顺序逆序停止组件
    pub fn shutdown(&self) -> InfrastructureResult<()> {
        info!("宿主关闭, 已运行 {} 秒", self.uptime().num_seconds());
        self.resolver.shutdown()?;
        Ok(())
    }
}

impl std::fmt::Debug for ResolutionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionHost")
            .field("resolver", &self.resolver)
            .field("started_at", &self.started_at)
            .finish()
    }
}
