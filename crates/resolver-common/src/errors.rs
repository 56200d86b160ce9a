//! 错误类型定义

use crate::key::Key;
use crate::BoxError;
use thiserror::Error;

/// 配置错误类型
///
/// 在封闭（seal/build）阶段检测，对容器启动是致命的，不会重试
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("重复绑定: {key}")]
    DuplicateBinding { key: Key },

    #[error("绑定缺少供给策略: {key} 未提供实例、工厂或构造函数")]
    MissingProvider { key: Key },

    #[error("模块配置失败: {message}")]
    ModuleFailed { message: String },
}

/// 依赖解析错误类型
///
/// 每个变体都指明出错的键
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未找到绑定: {key}")]
    NoSuchBinding { key: Key },

    #[error("绑定未产生有效值: {key}")]
    EmptyValue { key: Key },

    #[error("组件创建失败: {key}, 原因: {source}")]
    SupplyFailed {
        key: Key,
        #[source]
        source: BoxError,
    },

    #[error("组件初始化失败: {key}, 原因: {source}")]
    InitializationFailed {
        key: Key,
        #[source]
        source: BoxError,
    },

    #[error("构造期循环依赖: {key} 在自身构造过程中被再次请求")]
    CircularDependency { key: Key },

    #[error("延迟引用尚未就绪: {key}")]
    DeferredNotReady { key: Key },

    #[error("类型转换失败: {key}, 期望类型 {expected}")]
    TypeMismatch { key: Key, expected: String },

    #[error("集合绑定为空: 没有任何 {type_name} 的绑定")]
    EmptyCollection { type_name: String },
}

/// 生命周期管理错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("组件停止失败: {failed:?}")]
    ShutdownFailed { failed: Vec<String> },
}

/// 构建错误类型
///
/// 饥饿单例在封闭时实例化失败会透传原始解析错误，而不是包装后的错误
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolution(#[from] DependencyError),
}

/// 组合层错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("容器构建失败: {source}")]
    BuildFailed {
        #[from]
        source: BuildError,
    },

    #[error("生命周期错误: {source}")]
    LifecycleError {
        #[from]
        source: LifecycleError,
    },

    #[error("组合根启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type BuildResult<T> = Result<T, BuildError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
