// Shell Quoting Utilities

/// 单引号包裹，内部单引号转义为 '\''
pub fn quote_shell(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}
