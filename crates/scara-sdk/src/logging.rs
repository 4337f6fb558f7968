//! 日志初始化
//!
//! 日志级别由 `RUST_LOG` 控制，未设置时使用调用方给出的默认指令。

use tracing_subscriber::EnvFilter;

/// 安装全局 `tracing` 订阅者
///
/// 已经安装过订阅者时返回 `false`，不会覆盖已有配置。
pub fn try_init_logger(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// 初始化日志
///
/// ```
/// scara_sdk::init_logger!();
/// scara_sdk::init_logger!("scara_driver=trace,info");
/// ```
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::logging::try_init_logger("info")
    };
    ($directive:expr) => {
        $crate::logging::try_init_logger($directive)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_twice() {
        let _ = crate::init_logger!("warn");
        // 第二次安装不会覆盖
        assert!(!crate::init_logger!());
    }
}
