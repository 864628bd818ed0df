//! 工具模块
//!
//! 提供文件系统、shell 引号等常用工具函数

pub mod fs;
pub mod shell;

// 重导出
pub use fs::*;
pub use shell::*;
