//! # Resolver Abstractions
//!
//! 组件解析核心的契约层，定义绑定配置和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentResolver`] - 对象安全的解析器契约
//! - [`ResolverExt`] - 泛型便捷层（get/require/deferred）
//! - [`Binder`] / [`BindingBuilder`] - 可变注册阶段的配置表面
//! - [`Module`] - 配置回调，通过 [`extend`] 组合
//! - [`OnTheFlyBinder`] - 即时成员绑定扩展点

pub mod binder;
pub mod injection;
pub mod module;
pub mod provider;
pub mod resolver;

pub use binder::*;
pub use injection::*;
pub use module::*;
pub use provider::*;
pub use resolver::*;
