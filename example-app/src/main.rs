//! # 示例应用程序
//!
//! 演示组件解析核心的典型用法：模块化绑定、限定名、
//! 生命周期管理、构造期循环和运行统计。

use clap::Parser;
use composition::{CompositionBuilder, LoggingConfig, ResolutionHost};
use resolver_abstractions::{Binder, ResolverExt};
use resolver_common::{BoxError, ConfigurationResult, Deferred, Lifecycle};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "组件解析核心示例应用")]
struct Args {
    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 是否以 JSON 格式输出日志
    #[arg(long)]
    json_log: bool,

    /// 构建后是否驻留等待退出信号
    #[arg(long)]
    wait: bool,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppConfig {
    name: String,
    max_requests: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "示例应用".to_string(),
            max_requests: 64,
        }
    }
}

/// 问候服务，演示同一类型的多个限定名绑定
struct GreetingService {
    template: String,
}

impl GreetingService {
    fn greet(&self, who: &str) -> String {
        self.template.replace("{}", who)
    }
}

/// 指标收集器，演示生命周期管理
#[derive(Default)]
struct MetricsCollector {
    recorded: AtomicUsize,
}

impl MetricsCollector {
    fn record(&self) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
    }
}

impl Lifecycle for MetricsCollector {
    fn on_start(&self) -> Result<(), BoxError> {
        info!("指标收集器已启动");
        Ok(())
    }

    fn on_stop(&self) -> Result<(), BoxError> {
        info!(
            "指标收集器已停止, 共记录 {} 条",
            self.recorded.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

/// 事件总线与审计日志互相引用，演示构造期循环
struct EventBus {
    audit: Deferred<AuditTrail>,
}

struct AuditTrail {
    bus: Arc<EventBus>,
}

/// 应用模块
fn app_module(binder: &mut Binder) -> ConfigurationResult<()> {
    binder.bind_instance(AppConfig::default());

    binder
        .bind::<GreetingService>()
        .named("正式")
        .singleton()
        .to_instance(GreetingService {
            template: "您好, {}".to_string(),
        });
    binder
        .bind::<GreetingService>()
        .named("随意")
        .singleton()
        .to_instance(GreetingService {
            template: "嗨, {}!".to_string(),
        });

    binder
        .bind::<MetricsCollector>()
        .eager_singleton()
        .with_lifecycle()
        .to_supplier(|| Ok::<_, BoxError>(MetricsCollector::default()));

    binder
        .bind::<EventBus>()
        .singleton()
        .to_constructor(|resolver| {
            Ok(EventBus {
                audit: resolver.deferred::<AuditTrail>()?,
            })
        });
    binder
        .bind::<AuditTrail>()
        .singleton()
        .to_constructor(|resolver| {
            Ok(AuditTrail {
                bus: resolver.require::<EventBus>()?,
            })
        });

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: parse_log_level(&args.log_level),
        json_format: args.json_log,
        ..LoggingConfig::default()
    };

    let host = CompositionBuilder::new()
        .add_module(app_module)
        .with_logging(logging)
        .build()?;

    info!("组合根就绪, 开始演示");
    demonstrate_resolution(&host)?;
    demonstrate_cycle(&host)?;

    let stats = serde_json::to_string_pretty(&host.stats())?;
    println!("{}", stats);

    if args.wait {
        info!("等待退出信号");
        host.wait_for_shutdown().await?;
    } else {
        host.shutdown()?;
    }

    info!("应用已关闭");
    Ok(())
}

/// 演示基本解析与限定名
fn demonstrate_resolution(host: &ResolutionHost) -> anyhow::Result<()> {
    let resolver = host.resolver();

    let config = resolver.require::<AppConfig>()?;
    info!("应用配置: {} (上限 {})", config.name, config.max_requests);

    let formal = resolver.require_named::<GreetingService>("正式")?;
    let casual = resolver.require_named::<GreetingService>("随意")?;
    info!("{}", formal.greet("世界"));
    info!("{}", casual.greet("世界"));

    let metrics = resolver.require::<MetricsCollector>()?;
    metrics.record();
    metrics.record();

    Ok(())
}

/// 演示通过延迟引用解析构造期循环
fn demonstrate_cycle(host: &ResolutionHost) -> anyhow::Result<()> {
    let resolver = host.resolver();

    let audit = resolver.require::<AuditTrail>()?;
    let bus_audit = audit.bus.audit.get()?;
    assert!(Arc::ptr_eq(&bus_audit, &audit));
    info!("事件总线与审计日志已互相接通");

    Ok(())
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
