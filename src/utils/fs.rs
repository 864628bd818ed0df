//! 文件系统工具
//!
//! 所有 I/O 失败都包装为 [`XfconfError::Io`]，保留出错路径。

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::error::XfconfError;

/// 安全读取文件内容
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| XfconfError::io(path, e).into())
}

/// 按字节读取文件
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| XfconfError::io(path, e).into())
}

/// 安全写入文件
pub fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    // 确保父目录存在
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    fs::write(path, content).map_err(|e| XfconfError::io(path, e).into())
}

/// 原样复制文件（目标父目录需已存在）
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let data = read_bytes(from)?;
    fs::write(to, data).map_err(|e| XfconfError::io(to, e).into())
}

/// 逐字节比较两个文件
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    Ok(read_bytes(a)? == read_bytes(b)?)
}

/// 检查文件是否存在
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// 检查目录是否存在
pub fn dir_exists(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// 创建目录（包括父目录）
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| XfconfError::io(path, e).into())
}

/// 删除目录树，不存在时忽略
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|e| XfconfError::io(path, e).into())
}

/// 重命名（同一文件系统内为原子操作）
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| XfconfError::io(from, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_kind;
    use tempfile::TempDir;

    #[test]
    fn test_read_write_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("nested/dir/test.txt");

        write_file(&file_path, b"Hello, World!").unwrap();

        let loaded = read_file(&file_path).unwrap();
        assert_eq!(loaded, "Hello, World!");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_file(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(error_kind(&err), Some(XfconfError::Io { .. })));
    }

    #[test]
    fn test_files_identical() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.json");
        let b = temp.path().join("b.json");
        let c = temp.path().join("c.json");

        write_file(&a, b"{\"ch\":{\"p\":\"1\"}}").unwrap();
        copy_file(&a, &b).unwrap();
        // 语义相同但字节不同
        write_file(&c, b"{ \"ch\": {\"p\": \"1\"} }").unwrap();

        assert!(files_identical(&a, &b).unwrap());
        assert!(!files_identical(&a, &c).unwrap());
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("state");

        remove_dir_all_if_exists(&dir).unwrap();

        create_dir_all(&dir.join("current")).unwrap();
        assert!(dir_exists(&dir));
        remove_dir_all_if_exists(&dir).unwrap();
        assert!(!dir_exists(&dir));
    }
}
