//! 组合根构建器

use crate::host::ResolutionHost;
use resolver_abstractions::{CombinedModule, Module, OnTheFlyBinder};
use resolver_common::{InfrastructureError, InfrastructureResult};
use resolver_impl::ResolverBuilder;
use std::sync::Arc;
use tracing::info;

/// 组合根构建器
///
/// 应用入口用建造者模式组装模块、即时绑定器和日志配置，
/// 一次性封闭为运行期宿主
pub struct CompositionBuilder {
    /// 配置模块集
    modules: CombinedModule,
    /// 即时成员绑定器
    on_the_fly: Option<Arc<dyn OnTheFlyBinder>>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl CompositionBuilder {
    /// 创建新的组合根构建器
    pub fn new() -> Self {
        Self {
            modules: CombinedModule::new(),
            on_the_fly: None,
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加配置模块，按加入顺序配置
    pub fn add_module<M: Module + 'static>(mut self, module: M) -> Self {
        info!("添加配置模块");
        self.modules = self.modules.with(module);
        self
    }

    /// 设置即时成员绑定器
    pub fn with_on_the_fly_binder<B: OnTheFlyBinder + 'static>(mut self, binder: B) -> Self {
        info!("设置即时成员绑定器");
        self.on_the_fly = Some(Arc::new(binder));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 封闭并构建运行期宿主
    pub fn build(self) -> InfrastructureResult<ResolutionHost> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        info!("开始构建组合根, 共 {} 个模块", self.modules.len());

        let mut builder = ResolverBuilder::new().with_module(self.modules);
        if let Some(binder) = self.on_the_fly {
            builder = builder.with_on_the_fly_binder(binder);
        }
        let resolver = builder.build()?;

        info!("组合根构建完成");
        Ok(ResolutionHost::new(resolver))
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}
