// 教案级说明：运行时超时模块现阶段仅保留类型与函数签名。
//
// - **意图 (Why)**：为“纯契约”阶段提供最小可编译接口，约束调用方如何与超时设置交互，
//   同时彻底移除 `ArcSwap`、原子计数器等具体实现，避免隐含的时间或调度行为。
// - **契约 (What)**：暴露 `TimeoutSettings` 数据结构、`TimeoutRuntimeConfig` 管理器以及相关
//   错误与解析函数的签名，使未来真实实现能够无缝衔接；当前所有行为性方法均触发
//   `unimplemented!()` 以提醒调用方注入运行时实现。
// - **架构位置 (How)**：该文件由 `runtime::mod` 公开，依赖配置子系统 (`ResolvedConfiguration`)
//   与热更新抽象 (`HotReload*`) 的类型定义，用于描述交互契约但不承担任何逻辑。

use alloc::{borrow::Cow, sync::Arc};
use core::{fmt, marker::PhantomData};

type Duration = core::time::Duration;

use crate::configuration::ResolvedConfiguration;
use crate::observability::MetricsProvider;
use crate::runtime::{
    HotReloadApplyTimer, HotReloadFence, HotReloadReadGuard, HotReloadWriteGuard,
};

/// 描述运行时关键超时阈值。
///
/// ### 设计目的（Why）
/// - 将请求超时与空闲连接超时集中管理，避免各组件散落维护导致语义不一致。
/// - 作为动态配置的解析结果，便于通过 [`TimeoutRuntimeConfig`] 在热更新时原子替换。
///
/// ### 契约说明（What）
/// - `request_timeout`：单次请求允许的最大持续时间，超过后运行时应主动取消；
/// - `idle_timeout`：连接或通道在无活动时允许保持的最长时间，用于清理闲置资源；
/// - 默认值分别为 5 秒与 60 秒，可满足大多数 RPC 场景的安全基准。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeoutSettings {
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl TimeoutSettings {
    /// 构造带自定义阈值的设置。
    pub const fn new(request_timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            request_timeout,
            idle_timeout,
        }
    }

    /// 请求超时阈值。
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// 空闲超时阈值。
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// 从合并后的配置解析超时设置。
    pub fn from_configuration(
        config: &ResolvedConfiguration,
    ) -> crate::Result<Self, TimeoutConfigError> {
        let _ = config;
        unimplemented!(
            "TimeoutSettings::from_configuration 在纯契约阶段不可用；请由配置解析层提供实现"
        )
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(60))
    }
}

/// 热更新友好的超时配置容器。
///
/// ### 设计目的（Why）
/// - 历史实现依赖 ArcSwap 与纪元计数，实现“读无锁、写常数时间”的动态超时分发机制；纯契约阶段保留该交互设想以指导未来实现。
/// - 通过 `config_epoch()` 提供与观测面对齐的指标，便于确认配置是否生效。
///
/// ### 契约说明（What）
/// - `new`：接受初始设置并将纪元置零；
/// - `snapshot`：返回当前快照的 `Arc`，调用方可持久保存并在并发路径读取；
/// - `replace`：直接替换为给定设置；
/// - `update_from_configuration`：解析 [`ResolvedConfiguration`] 并在成功后递增纪元；
/// - 所有更新均原子生效，读者不需要额外同步原语。
pub struct TimeoutRuntimeConfig {
    _marker: PhantomData<()>,
}

impl TimeoutRuntimeConfig {
    /// 创建新的运行时配置容器。
    pub fn new(initial: TimeoutSettings) -> Self {
        let _ = initial;
        Self::default()
    }

    /// 使用共享栅栏构造运行时配置，支持跨组件同步切换。
    pub fn with_shared_fence(initial: TimeoutSettings, fence: HotReloadFence) -> Self {
        let _ = (initial, fence);
        Self::default()
    }

    /// 构造具备指标上报能力的运行时配置容器。
    pub fn with_observability(
        initial: TimeoutSettings,
        fence: HotReloadFence,
        metrics: Arc<dyn MetricsProvider>,
        component: impl Into<Cow<'static, str>>,
    ) -> Self {
        let _ = (initial, fence, metrics, component.into());
        Self::default()
    }

    /// 返回当前使用的热更新栅栏。
    pub fn fence(&self) -> HotReloadFence {
        let _ = self;
        unimplemented!("TimeoutRuntimeConfig::fence 在纯契约阶段不可用；请由运行时提供具体实现")
    }

    /// 返回当前配置快照，并在内部获取读锁以保证一致性。
    pub fn snapshot(&self) -> Arc<TimeoutSettings> {
        let _ = self;
        unimplemented!("TimeoutRuntimeConfig::snapshot 在纯契约阶段不可用；请由运行时提供具体实现")
    }

    /// 在调用方已持有读锁的情况下返回快照，避免重复加锁。
    pub fn snapshot_with_fence(&self, guard: &HotReloadReadGuard<'_>) -> Arc<TimeoutSettings> {
        let _ = (self, guard);
        unimplemented!(
            "TimeoutRuntimeConfig::snapshot_with_fence 在纯契约阶段不可用；请由运行时提供具体实现"
        )
    }

    /// 查询配置纪元（从 0 开始），可用于导出指标或调试日志。
    pub fn config_epoch(&self) -> u64 {
        let _ = self;
        unimplemented!(
            "TimeoutRuntimeConfig::config_epoch 在纯契约阶段不可用；请由运行时提供具体实现"
        )
    }

    /// 直接替换为新的设置。
    pub fn replace(&self, settings: TimeoutSettings) {
        let _ = (self, settings);
        unimplemented!("TimeoutRuntimeConfig::replace 在纯契约阶段不可用；请由运行时提供具体实现")
    }

    /// 在共享写锁的上下文中替换配置。
    pub fn replace_with_fence(
        &self,
        guard: &HotReloadWriteGuard<'_>,
        settings: TimeoutSettings,
        timer: HotReloadApplyTimer,
    ) {
        let _ = (self, guard, settings, timer);
        unimplemented!(
            "TimeoutRuntimeConfig::replace_with_fence 在纯契约阶段不可用；请由运行时提供具体实现"
        )
    }

    /// 解析并更新配置。
    pub fn update_from_configuration(
        &self,
        config: &ResolvedConfiguration,
    ) -> crate::Result<(), TimeoutConfigError> {
        let _ = (self, config);
        unimplemented!(
            "TimeoutRuntimeConfig::update_from_configuration 在纯契约阶段不可用；请由运行时提供具体实现"
        )
    }

    /// 在共享写锁的上下文中解析并更新配置。
    pub fn update_from_configuration_with_fence(
        &self,
        guard: &HotReloadWriteGuard<'_>,
        config: &ResolvedConfiguration,
        timer: HotReloadApplyTimer,
    ) -> crate::Result<(), TimeoutConfigError> {
        let _ = (self, guard, config, timer);
        unimplemented!(
            "TimeoutRuntimeConfig::update_from_configuration_with_fence 在纯契约阶段不可用；请由运行时提供具体实现"
        )
    }
}

impl Default for TimeoutRuntimeConfig {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

/// 超时配置解析过程中可能出现的错误。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeoutConfigError {
    InvalidValueType {
        field: TimeoutField,
        expected: &'static str,
    },
    NonPositiveDuration {
        field: TimeoutField,
        provided: i64,
    },
}

impl fmt::Display for TimeoutConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let _ = (self, f);
        unimplemented!("TimeoutConfigError::fmt 在纯契约阶段不可用；请由错误呈现层提供具体实现")
    }
}

impl crate::Error for TimeoutConfigError {
    fn source(&self) -> Option<&(dyn crate::Error + 'static)> {
        let _ = self;
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutField {
    Request,
    Idle,
}

impl fmt::Display for TimeoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutField::Request => f.write_str("timeouts.request"),
            TimeoutField::Idle => f.write_str("timeouts.idle"),
        }
    }
}
