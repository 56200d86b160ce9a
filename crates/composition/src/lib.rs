//! # Composition
//!
//! 组件解析核心的组合根层：应用入口在此组装模块、
//! 即时绑定器和日志配置，封闭为运行期宿主。
//!
//! ## 使用方式
//!
//! ```ignore
//! let host = CompositionBuilder::new()
//!     .add_module(app_module)
//!     .with_logging(LoggingConfig::development())
//!     .build()?;
//!
//! let service = host.resolver().require::<AppService>()?;
//! host.wait_for_shutdown().await?;
//! ```

pub mod builder;
pub mod host;

pub use builder::{CompositionBuilder, LoggingConfig};
pub use host::ResolutionHost;
