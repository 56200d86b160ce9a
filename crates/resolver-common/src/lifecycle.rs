//! 组件生命周期管理

use crate::BoxError;

/// 组件生命周期能力 trait
///
/// 组件通过显式实现此 trait 选择加入初始化链；解析器在实例构造完成后
/// 调用 [`on_start`](Lifecycle::on_start)，在容器关闭时按启动顺序的
/// 逆序调用 [`on_stop`](Lifecycle::on_stop)。
///
/// 钩子接收 `&self`：解析器以 `Arc` 共享实例，需要可变状态的组件
/// 使用内部可变性。
pub trait Lifecycle: Send + Sync + 'static {
    /// 组件启动
    fn on_start(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// 组件停止
    fn on_stop(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 受管实例的生命周期状态
///
/// 状态机：`Created → Constructed → Initialized`，容器关闭后进入 `Stopped`。
/// 初始化失败的实例被丢弃，不会以半初始化状态对外可见。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// 供给策略执行中
    Created,
    /// 物理构造完成，初始化链尚未运行
    Constructed,
    /// 初始化链运行完毕，实例对外可见
    Initialized,
    /// 已停止
    Stopped,
}
