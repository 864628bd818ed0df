use std::fs;
use std::process::Command;

fn main() {
    // 读取 VERSION 文件
    let version = fs::read_to_string("VERSION")
        .expect("Failed to read VERSION file")
        .trim()
        .to_string();

    // 当前 commit（非 git 检出时为 none）
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "none".to_string());

    // 可复现构建：打包工具通过 SOURCE_DATE_EPOCH 传入构建时间
    let build_date = std::env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| "unknown".to_string());

    // 设置环境变量，供编译时使用
    println!("cargo:rustc-env=APP_VERSION={}", version);
    println!("cargo:rustc-env=APP_COMMIT={}", commit);
    println!("cargo:rustc-env=APP_BUILD_DATE={}", build_date);

    // 当 VERSION 文件变更时重新运行 build.rs
    println!("cargo:rerun-if-changed=VERSION");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
