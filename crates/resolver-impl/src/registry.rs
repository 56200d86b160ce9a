//! 封闭后注册表
//!
//! 封闭即把可变的绑定定义集固化为只读注册表：重复键在此刻
//! 检出并整体失败，缺少供给策略的定义同样在此刻指明违规类型。
//! 封闭之后查找路径完全无锁。

use resolver_abstractions::{Binder, BindingDefinition, LifecycleHooks, MemberInjectFn, Provider};
use resolver_common::{
    BindingDescriptor, ConfigurationError, ConfigurationResult, Key, Scope,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 封闭后的单个绑定
pub struct BindingEntry {
    /// 绑定键
    pub key: Key,
    /// 作用域
    pub scope: Scope,
    /// 供给策略
    pub provider: Provider,
    /// 生命周期钩子
    pub lifecycle: Option<LifecycleHooks>,
    /// 成员注入适配器
    pub member_injection: Option<MemberInjectFn>,
    /// 声明顺序索引
    pub declaration_index: usize,
}

impl std::fmt::Debug for BindingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingEntry")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("provider", &self.provider)
            .field("lifecycle", &self.lifecycle.is_some())
            .field("member_injection", &self.member_injection.is_some())
            .field("declaration_index", &self.declaration_index)
            .finish()
    }
}

/// 封闭后注册表
///
/// 保留声明顺序的绑定清单，外加按键和按能力类型的索引
pub struct SealedRegistry {
    bindings: Vec<Arc<BindingEntry>>,
    by_key: HashMap<Key, usize>,
    by_type: HashMap<TypeId, Vec<usize>>,
}

impl std::fmt::Debug for SealedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedRegistry")
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl SealedRegistry {
    /// 封闭一个绑定器
    ///
    /// 任何一条定义违规（重复键、缺少供给策略）都使整体封闭失败
    pub fn seal(binder: Binder) -> ConfigurationResult<Self> {
        let mut bindings: Vec<Arc<BindingEntry>> = Vec::new();
        let mut by_key: HashMap<Key, usize> = HashMap::new();

        for definition in binder.into_definitions() {
            let BindingDefinition {
                key,
                scope,
                provider,
                lifecycle,
                member_injection,
                is_rebind,
            } = definition;

            let provider =
                provider.ok_or_else(|| ConfigurationError::MissingProvider { key: key.clone() })?;

            if let Some(&existing) = by_key.get(&key) {
                if !is_rebind {
                    return Err(ConfigurationError::DuplicateBinding { key });
                }
                debug!("重绑定替换先前定义: {}", key);
                bindings[existing] = Arc::new(BindingEntry {
                    key,
                    scope,
                    provider,
                    lifecycle,
                    member_injection,
                    declaration_index: existing,
                });
                continue;
            }

            let declaration_index = bindings.len();
            by_key.insert(key.clone(), declaration_index);
            bindings.push(Arc::new(BindingEntry {
                key,
                scope,
                provider,
                lifecycle,
                member_injection,
                declaration_index,
            }));
        }

        let mut by_type: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (position, binding) in bindings.iter().enumerate() {
            by_type
                .entry(binding.key.type_id())
                .or_default()
                .push(position);
        }

        Ok(Self {
            bindings,
            by_key,
            by_type,
        })
    }

    /// 按键查找绑定
    pub fn binding(&self, key: &Key) -> Option<&Arc<BindingEntry>> {
        self.by_key.get(key).map(|&position| &self.bindings[position])
    }

    /// 能力类型的全部绑定（跨限定名），按声明顺序
    pub fn bindings_of(&self, type_id: TypeId) -> Vec<Arc<BindingEntry>> {
        self.by_type
            .get(&type_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| self.bindings[position].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 按声明顺序遍历全部绑定
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BindingEntry>> {
        self.bindings.iter()
    }

    /// 绑定数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 是否没有任何绑定
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 全部绑定的诊断描述符，按声明顺序
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.bindings
            .iter()
            .map(|binding| BindingDescriptor {
                key: binding.key.to_string(),
                type_name: binding.key.type_name().to_string(),
                qualifier: binding.key.qualifier().map(str::to_string),
                scope: binding.scope,
                provider_kind: binding.provider.kind(),
                declaration_index: binding.declaration_index,
                has_lifecycle: binding.lifecycle.is_some(),
            })
            .collect()
    }
}
