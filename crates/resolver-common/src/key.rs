//! 组件键定义
//!
//! 键由能力类型和可选限定名构成，是进入解析器的唯一寻址机制。

use crate::metadata::TypeInfo;
use std::any::TypeId;
use std::fmt;

/// 组件键
///
/// 结构化相等：两个键相等当且仅当能力类型和限定名都相等。
/// 空字符串限定名在构造时归一化为"无限定名"。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    type_info: TypeInfo,
    qualifier: Option<String>,
}

impl Key {
    /// 创建无限定名的键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    /// 创建带限定名的键
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    /// 替换限定名，空字符串归一化为无限定名
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        let qualifier = qualifier.into();
        self.qualifier = if qualifier.is_empty() {
            None
        } else {
            Some(qualifier)
        };
        self
    }

    /// 能力类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 能力类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_info.id
    }

    /// 能力类型名称
    pub fn type_name(&self) -> &str {
        self.type_info.short_name()
    }

    /// 限定名
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}(限定名={})", self.type_info.short_name(), qualifier),
            None => write!(f, "{}", self.type_info.short_name()),
        }
    }
}
