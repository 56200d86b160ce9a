//! 组件解析核心的集中集成测试
//!
//! 覆盖作用域语义、限定名隔离、父子层级、构造期循环、
//! 即时成员注入和生命周期关闭顺序。

use resolver_abstractions::{
    Binder, ComponentResolver, InjectTarget, InjectionPoint, OnTheFlyBinder, ResolverExt,
};
use resolver_common::{
    AnyInstance, BoxError, ConfigurationResult, Deferred, DependencyError, Key, Lifecycle,
    TypeInfo,
};
use resolver_impl::{ComponentResolverImpl, ResolverBuilder};
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// 作用域语义
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Counter {
    value: usize,
}

#[test]
fn singleton_resolves_to_the_same_instance() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();
    let resolver = ComponentResolverImpl::build(move |binder: &mut Binder| -> ConfigurationResult<()> {
        let counter = counter.clone();
        binder.bind::<Counter>().singleton().to_supplier(move || {
            Ok::<_, BoxError>(Counter {
                value: counter.fetch_add(1, Ordering::SeqCst),
            })
        });
        Ok(())
    })
    .unwrap();

    let first = resolver.require::<Counter>().unwrap();
    let second = resolver.require::<Counter>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn prototype_resolves_to_distinct_instances() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();
    let resolver = ComponentResolverImpl::build(move |binder: &mut Binder| -> ConfigurationResult<()> {
        let counter = counter.clone();
        binder.bind::<Counter>().to_supplier(move || {
            Ok::<_, BoxError>(Counter {
                value: counter.fetch_add(1, Ordering::SeqCst),
            })
        });
        Ok(())
    })
    .unwrap();

    let first = resolver.require::<Counter>().unwrap();
    let second = resolver.require::<Counter>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.value, second.value);
    assert_eq!(constructions.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_first_resolution_constructs_singleton_at_most_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();
    let resolver = ComponentResolverImpl::build(move |binder: &mut Binder| -> ConfigurationResult<()> {
        let counter = counter.clone();
        binder.bind::<Counter>().singleton().to_supplier(move || {
            // 放大竞态窗口
            std::thread::sleep(Duration::from_millis(30));
            Ok::<_, BoxError>(Counter {
                value: counter.fetch_add(1, Ordering::SeqCst),
            })
        });
        Ok(())
    })
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            std::thread::spawn(move || resolver.require::<Counter>().unwrap())
        })
        .collect();

    let instances: Vec<Arc<Counter>> =
        handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resolver_is_shareable_across_async_tasks() -> anyhow::Result<()> {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder
            .bind::<Counter>()
            .singleton()
            .to_supplier(|| Ok::<_, BoxError>(Counter { value: 7 }));
        Ok(())
    })?;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.require::<Counter>().unwrap()
        }));
    }

    let first = resolver.require::<Counter>()?;
    for handle in handles {
        let instance = handle.await?;
        assert!(Arc::ptr_eq(&first, &instance));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 键与限定名
// ---------------------------------------------------------------------------

#[test]
fn qualifiers_isolate_bindings_of_the_same_type() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().singleton().to_instance("无限定".to_string());
        binder
            .bind::<String>()
            .named("主")
            .singleton()
            .to_instance("主实例".to_string());
        binder
            .bind::<String>()
            .named("备")
            .singleton()
            .to_instance("备实例".to_string());
        Ok(())
    })
    .unwrap();

    assert_eq!(*resolver.require::<String>().unwrap(), "无限定");
    assert_eq!(*resolver.require_named::<String>("主").unwrap(), "主实例");
    assert_eq!(*resolver.require_named::<String>("备").unwrap(), "备实例");
}

#[test]
fn empty_qualifier_is_the_unqualified_binding() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().named("").to_instance("归一化".to_string());
        Ok(())
    })
    .unwrap();

    // 空字符串限定名与无限定名是同一个键
    assert_eq!(*resolver.require::<String>().unwrap(), "归一化");
    assert_eq!(*resolver.require_named::<String>("").unwrap(), "归一化");
}

#[test]
fn unbound_key_fails_loudly_and_names_the_key() {
    let resolver = ComponentResolverImpl::build(|_: &mut Binder| -> ConfigurationResult<()> {
        Ok(())
    })
    .unwrap();

    let error = resolver.require::<Counter>().unwrap_err();
    assert!(matches!(error, DependencyError::NoSuchBinding { .. }));
    assert!(error.to_string().contains("Counter"));

    assert!(resolver.get::<Counter>().unwrap().is_none());
    assert!(!resolver.is_bound::<Counter>());
}

#[test]
fn unbound_qualified_key_error_names_capability_and_qualifier() {
    let resolver = ComponentResolverImpl::build(|_: &mut Binder| -> ConfigurationResult<()> {
        Ok(())
    })
    .unwrap();

    let error = resolver.require_named::<Counter>("主").unwrap_err();
    assert!(matches!(error, DependencyError::NoSuchBinding { .. }));

    // 失败报文同时点名能力类型和限定名
    let message = error.to_string();
    assert!(message.contains("Counter"));
    assert!(message.contains("主"));
}

#[test]
fn get_all_returns_bindings_in_declaration_order() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().to_instance("第一".to_string());
        binder.bind::<String>().named("乙").to_instance("第二".to_string());
        binder.bind::<String>().named("丙").to_instance("第三".to_string());
        Ok(())
    })
    .unwrap();

    let all = resolver.get_all::<String>().unwrap();
    let values: Vec<&str> = all.iter().map(|value| value.as_str()).collect();
    assert_eq!(values, vec!["第一", "第二", "第三"]);

    assert!(matches!(
        resolver.require_all::<u128>(),
        Err(DependencyError::EmptyCollection { .. })
    ));
}

// ---------------------------------------------------------------------------
// 空值绑定
// ---------------------------------------------------------------------------

#[test]
fn binding_that_produces_no_value_is_distinct_from_unbound() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder
            .bind::<Counter>()
            .singleton()
            .to_optional_supplier(|| Ok::<_, BoxError>(None));
        Ok(())
    })
    .unwrap();

    // get 视为缺值, require 报告"未产生有效值"而不是"未绑定"
    assert!(resolver.get::<Counter>().unwrap().is_none());
    assert!(matches!(
        resolver.require::<Counter>(),
        Err(DependencyError::EmptyValue { .. })
    ));
    assert!(resolver.is_bound::<Counter>());
    // 空值不进入单例缓存
    assert_eq!(resolver.stats().cached_singletons, 0);
}

// ---------------------------------------------------------------------------
// 父子层级
// ---------------------------------------------------------------------------

struct Holder {
    value: String,
}

#[test]
fn child_falls_back_to_parent_and_shadows_with_own_bindings() {
    let parent = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().singleton().to_instance("父级".to_string());
        binder.bind::<Counter>().singleton().to_constructor(|_| {
            Ok(Counter { value: 42 })
        });
        Ok(())
    })
    .unwrap();

    let child = ResolverBuilder::new()
        .with_module(|binder: &mut Binder| -> ConfigurationResult<()> {
            binder.bind::<String>().singleton().to_instance("子级".to_string());
            Ok(())
        })
        .with_parent(parent.clone())
        .build()
        .unwrap();

    // 本级绑定遮蔽父级
    assert_eq!(*child.require::<String>().unwrap(), "子级");
    assert_eq!(*parent.require::<String>().unwrap(), "父级");

    // 本级缺失的键回退父级, 且与父级直接解析是同一个单例
    let from_child = child.require::<Counter>().unwrap();
    let from_parent = parent.require::<Counter>().unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));

    assert!(child.contains(&Key::of::<Counter>()));
}

#[test]
fn child_without_local_bindings_delegates_collection_to_parent() {
    let parent = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().to_instance("父一".to_string());
        binder.bind::<String>().named("乙").to_instance("父二".to_string());
        Ok(())
    })
    .unwrap();

    let child = ResolverBuilder::new()
        .with_module(|binder: &mut Binder| -> ConfigurationResult<()> {
            binder.bind_instance::<u32>(1);
            Ok(())
        })
        .with_parent(parent.clone())
        .build()
        .unwrap();

    // 本级没有该能力类型的绑定, 整个集合委托给父级, 保持父级声明顺序
    let all = child.get_all::<String>().unwrap();
    let values: Vec<&str> = all.iter().map(|value| value.as_str()).collect();
    assert_eq!(values, vec!["父一", "父二"]);

    // 本级一旦有自己的绑定, 集合不跨层合并
    let shadowing = ResolverBuilder::new()
        .with_module(|binder: &mut Binder| -> ConfigurationResult<()> {
            binder.bind::<String>().to_instance("子".to_string());
            Ok(())
        })
        .with_parent(parent)
        .build()
        .unwrap();

    let local = shadowing.get_all::<String>().unwrap();
    let values: Vec<&str> = local.iter().map(|value| value.as_str()).collect();
    assert_eq!(values, vec!["子"]);
}

#[test]
fn parent_constructed_component_resolves_dependencies_against_parent() {
    let parent = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<String>().singleton().to_instance("父级".to_string());
        binder.bind::<Holder>().singleton().to_constructor(|resolver| {
            Ok(Holder {
                value: resolver.require::<String>()?.as_ref().clone(),
            })
        });
        Ok(())
    })
    .unwrap();

    let child = ResolverBuilder::new()
        .with_module(|binder: &mut Binder| -> ConfigurationResult<()> {
            binder.bind::<String>().singleton().to_instance("子级".to_string());
            Ok(())
        })
        .with_parent(parent)
        .build()
        .unwrap();

    // Holder 绑定在父级, 其构造依赖也按父级解析
    assert_eq!(child.require::<Holder>().unwrap().value, "父级");
}

// ---------------------------------------------------------------------------
// 构造期循环
// ---------------------------------------------------------------------------

struct Alpha {
    beta: Arc<Beta>,
}

struct Beta {
    gamma: Arc<Gamma>,
}

struct Gamma {
    alpha: Deferred<Alpha>,
    alpha_ready_during_construction: bool,
}

#[test]
fn three_party_cycle_resolves_through_deferred_reference() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<Alpha>().singleton().to_constructor(|resolver| {
            Ok(Alpha {
                beta: resolver.require::<Beta>()?,
            })
        });
        binder.bind::<Beta>().singleton().to_constructor(|resolver| {
            Ok(Beta {
                gamma: resolver.require::<Gamma>()?,
            })
        });
        binder.bind::<Gamma>().singleton().to_constructor(|resolver| {
            let alpha = resolver.deferred::<Alpha>()?;
            Ok(Gamma {
                alpha_ready_during_construction: alpha.is_ready(),
                alpha,
            })
        });
        Ok(())
    })
    .unwrap();

    let alpha = resolver.require::<Alpha>().unwrap();
    let gamma = &alpha.beta.gamma;

    // 构造期间延迟引用尚未兑现, 完成后可取值且指向同一实例
    assert!(!gamma.alpha_ready_during_construction);
    assert!(gamma.alpha.is_ready());
    assert!(Arc::ptr_eq(&gamma.alpha.get().unwrap(), &alpha));
}

#[test]
fn deferred_reference_fails_loudly_before_fulfillment() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<Gamma>().singleton().to_constructor(|resolver| {
            let alpha = resolver.deferred::<Alpha>()?;
            // 构造期内取值必须响亮失败, 不交出半构造对象
            assert!(matches!(
                alpha.get(),
                Err(DependencyError::DeferredNotReady { .. })
            ));
            Ok(Gamma {
                alpha_ready_during_construction: alpha.is_ready(),
                alpha,
            })
        });
        binder.bind::<Alpha>().singleton().to_constructor(|resolver| {
            let gamma = resolver.require::<Gamma>()?;
            let _ = gamma;
            Err(DependencyError::EmptyValue {
                key: Key::of::<Alpha>(),
            })
        });
        Ok(())
    })
    .unwrap();

    // Gamma 构造期间请求了 Alpha 的延迟引用, 此时 Alpha 正在构造中
    assert!(resolver.require::<Alpha>().is_err());
}

#[test]
fn direct_self_request_is_reported_as_circular_dependency() {
    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder.bind::<Counter>().singleton().to_constructor(|resolver| {
            // 不走延迟引用, 直接在自身构造中请求自身
            let this = resolver.require::<Counter>()?;
            Ok(Counter { value: this.value })
        });
        Ok(())
    })
    .unwrap();

    assert!(matches!(
        resolver.require::<Counter>(),
        Err(DependencyError::CircularDependency { .. })
    ));
    // 失败不缓存, 容器仍可用
    assert_eq!(resolver.stats().cached_singletons, 0);
}

// ---------------------------------------------------------------------------
// 即时成员注入
// ---------------------------------------------------------------------------

struct NamedLogger {
    name: String,
}

struct Reporter {
    logger: Mutex<Option<Arc<NamedLogger>>>,
}

impl InjectTarget for Reporter {
    fn receive(&self, point: &str, value: AnyInstance) -> Result<(), BoxError> {
        match point {
            "logger" => {
                let logger = value
                    .downcast::<NamedLogger>()
                    .map_err(|_| "注入值类型不匹配")?;
                *self.logger.lock().unwrap() = Some(logger);
                Ok(())
            }
            other => Err(format!("未知注入点: {}", other).into()),
        }
    }
}

struct LoggerBinder;

impl OnTheFlyBinder for LoggerBinder {
    fn scan(&self, type_info: &TypeInfo) -> Vec<InjectionPoint> {
        if type_info.id != TypeId::of::<Reporter>() {
            return Vec::new();
        }
        vec![InjectionPoint::new("logger", |resolver| {
            resolver
                .require::<NamedLogger>()
                .map(|logger| logger as AnyInstance)
        })]
    }
}

fn injection_module(binder: &mut Binder) -> ConfigurationResult<()> {
    binder.bind::<NamedLogger>().singleton().to_supplier(|| {
        Ok::<_, BoxError>(NamedLogger {
            name: "审计".to_string(),
        })
    });
    binder
        .bind::<Reporter>()
        .singleton()
        .with_member_injection()
        .to_supplier(|| {
            Ok::<_, BoxError>(Reporter {
                logger: Mutex::new(None),
            })
        });
    Ok(())
}

#[test]
fn managed_component_receives_members_through_on_the_fly_binder() {
    let resolver = ResolverBuilder::new()
        .with_module(injection_module)
        .with_on_the_fly_binder(LoggerBinder)
        .build()
        .unwrap();

    let reporter = resolver.require::<Reporter>().unwrap();
    let logger = reporter.logger.lock().unwrap().clone().expect("注入点未应用");
    assert_eq!(logger.name, "审计");
    // 注入的是容器管理的单例
    assert!(Arc::ptr_eq(&logger, &resolver.require::<NamedLogger>().unwrap()));
}

#[test]
fn standalone_object_receives_members_through_inject_members() {
    let resolver = ResolverBuilder::new()
        .with_module(injection_module)
        .with_on_the_fly_binder(LoggerBinder)
        .build()
        .unwrap();

    let standalone = Reporter {
        logger: Mutex::new(None),
    };
    resolver.inject_members(&standalone).unwrap();
    assert!(standalone.logger.lock().unwrap().is_some());
}

#[test]
fn without_on_the_fly_binder_no_points_are_applied() {
    let resolver = ResolverBuilder::new()
        .with_module(injection_module)
        .build()
        .unwrap();

    let reporter = resolver.require::<Reporter>().unwrap();
    assert!(reporter.logger.lock().unwrap().is_none());
}

// ---------------------------------------------------------------------------
// 生命周期
// ---------------------------------------------------------------------------

struct StageOne {
    trace: Arc<Mutex<Vec<&'static str>>>,
}

struct StageTwo {
    trace: Arc<Mutex<Vec<&'static str>>>,
}

impl Lifecycle for StageOne {
    fn on_start(&self) -> Result<(), BoxError> {
        self.trace.lock().unwrap().push("启动一");
        Ok(())
    }

    fn on_stop(&self) -> Result<(), BoxError> {
        self.trace.lock().unwrap().push("停止一");
        Ok(())
    }
}

impl Lifecycle for StageTwo {
    fn on_start(&self) -> Result<(), BoxError> {
        self.trace.lock().unwrap().push("启动二");
        Ok(())
    }

    fn on_stop(&self) -> Result<(), BoxError> {
        self.trace.lock().unwrap().push("停止二");
        Ok(())
    }
}

#[test]
fn shutdown_stops_components_in_reverse_start_order() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let module = {
        let trace = trace.clone();
        move |binder: &mut Binder| -> ConfigurationResult<()> {
            let handle = trace.clone();
            binder
                .bind::<StageOne>()
                .eager_singleton()
                .with_lifecycle()
                .to_supplier(move || Ok::<_, BoxError>(StageOne { trace: handle.clone() }));
            let handle = trace.clone();
            binder
                .bind::<StageTwo>()
                .eager_singleton()
                .with_lifecycle()
                .to_supplier(move || Ok::<_, BoxError>(StageTwo { trace: handle.clone() }));
            Ok(())
        }
    };

    let resolver = ComponentResolverImpl::build(module).unwrap();
    assert_eq!(resolver.stats().started_components, 2);

    resolver.shutdown().unwrap();
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["启动一", "启动二", "停止二", "停止一"]
    );
    // 关闭是幂等的
    resolver.shutdown().unwrap();
}

#[test]
fn failed_start_hook_fails_resolution_and_nothing_is_cached() {
    struct Faulty;

    impl Lifecycle for Faulty {
        fn on_start(&self) -> Result<(), BoxError> {
            Err("启动钩子失败".into())
        }
    }

    let resolver = ComponentResolverImpl::build(|binder: &mut Binder| -> ConfigurationResult<()> {
        binder
            .bind::<Faulty>()
            .singleton()
            .with_lifecycle()
            .to_supplier(|| Ok::<_, BoxError>(Faulty));
        Ok(())
    })
    .unwrap();

    assert!(matches!(
        resolver.require::<Faulty>(),
        Err(DependencyError::InitializationFailed { .. })
    ));
    assert_eq!(resolver.stats().cached_singletons, 0);
    assert_eq!(resolver.stats().started_components, 0);
}
