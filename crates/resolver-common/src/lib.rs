//! # Resolver Common
//!
//! 组件解析核心的公共类型层：键、绑定元数据、延迟引用、
//! 生命周期能力以及错误类型。
//!
//! ## 核心类型
//!
//! - [`Key`] - 组件寻址键（能力类型 + 可选限定名）
//! - [`Scope`] - 绑定的生命周期作用域
//! - [`Deferred`] - 用于打破构造期循环依赖的延迟引用
//! - [`Lifecycle`] - 组件启动/停止能力
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 键是进入解析器的唯一寻址机制，不存在隐式查找
//! - 每个失败路径都指明出错的键

pub mod binding;
pub mod deferred;
pub mod errors;
pub mod key;
pub mod lifecycle;
pub mod metadata;

pub use binding::*;
pub use deferred::*;
pub use errors::*;
pub use key::*;
pub use lifecycle::*;
pub use metadata::*;

use std::any::Any;
use std::sync::Arc;

/// 容器中流转的类型擦除实例
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// 供给策略和生命周期钩子使用的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
