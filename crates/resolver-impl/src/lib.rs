//! # Resolver Impl
//!
//! 组件解析核心的封闭容器实现。
//!
//! ## 核心类型
//!
//! - [`ResolverBuilder`] - 收集模块并封闭构建解析器
//! - [`ComponentResolverImpl`] - 封闭后的解析器，支持父子层级
//! - [`SealedRegistry`] - 封闭后的只读绑定注册表
//!
//! ## 关键保证
//!
//! - 单例在并发首次解析下至多构造一次
//! - 同一线程内的构造期回环交出延迟引用或循环依赖错误，不死锁
//! - 构造失败不缓存，后续解析可重试

pub mod container;
pub mod registry;

mod initializer;
mod injection;

pub use container::{ComponentResolverImpl, ResolverBuilder, ResolverStats};
pub use registry::{BindingEntry, SealedRegistry};
