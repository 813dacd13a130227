use std::fmt;
use std::path::PathBuf;

/// 去重记忆子系统的统一错误类型
#[derive(Debug)]
pub enum MemoryError {
    /// 存储文件读写错误
    Store(StoreError),
    /// 候选内容无法参与比较（URL 无法解析、空文本等）
    Candidate(CandidateError),
    /// 工具调用错误
    Tool(ToolError),
    /// 配置错误
    Config(ConfigError),
    /// IO 错误
    Io(std::io::Error),
}

/// 存储文件错误
///
/// 文件损坏不在此列：损坏的文件会被备份并重置，不会作为错误返回。
#[derive(Debug)]
pub enum StoreError {
    /// 读取存储文件失败（文件不存在除外）
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 原子写入失败；目标文件保持写入前的内容
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 序列化失败
    Serialization(String),
}

/// 候选内容错误
#[derive(Debug, PartialEq)]
pub enum CandidateError {
    /// URL 无法规范化
    InvalidUrl { url: String, reason: String },
    /// 空文本或纯空白文本
    EmptyText,
}

/// 工具调用错误
#[derive(Debug)]
pub enum ToolError {
    /// 工具未找到
    NotFound(String),
    /// 参数缺失
    MissingParameter(String),
    /// 参数类型错误
    InvalidParameter { name: String, message: String },
    /// 工具执行超时
    Timeout(String),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 配置值无效
    InvalidValue { field: String, message: String },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::Store(e) => write!(f, "Store Error: {}", e),
            MemoryError::Candidate(e) => write!(f, "Candidate Error: {}", e),
            MemoryError::Tool(e) => write!(f, "Tool Error: {}", e),
            MemoryError::Config(e) => write!(f, "Config Error: {}", e),
            MemoryError::Io(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "failed to read '{}': {}", path.display(), source)
            }
            StoreError::Write { path, source } => {
                write!(f, "failed to write '{}': {}", path.display(), source)
            }
            StoreError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl fmt::Display for CandidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateError::InvalidUrl { url, reason } => {
                write!(f, "invalid URL '{}': {}", url, reason)
            }
            CandidateError::EmptyText => write!(f, "candidate text is empty"),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool '{}' not found", name),
            ToolError::MissingParameter(name) => write!(f, "Missing parameter: {}", name),
            ToolError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{}': {}", name, message)
            }
            ToolError::Timeout(name) => write!(f, "Tool '{}' timed out", name),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid config value for '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemoryError::Store(e) => Some(e),
            MemoryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } | StoreError::Write { source, .. } => Some(source),
            StoreError::Serialization(_) => None,
        }
    }
}

impl std::error::Error for CandidateError {}
impl std::error::Error for ToolError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<std::io::Error> for MemoryError {
    fn from(err: std::io::Error) -> Self {
        MemoryError::Io(err)
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        MemoryError::Store(StoreError::Serialization(err.to_string()))
    }
}

impl From<serde_yaml::Error> for MemoryError {
    fn from(err: serde_yaml::Error) -> Self {
        MemoryError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<StoreError> for MemoryError {
    fn from(err: StoreError) -> Self {
        MemoryError::Store(err)
    }
}

impl From<CandidateError> for MemoryError {
    fn from(err: CandidateError) -> Self {
        MemoryError::Candidate(err)
    }
}

impl From<ToolError> for MemoryError {
    fn from(err: ToolError) -> Self {
        MemoryError::Tool(err)
    }
}

impl From<ConfigError> for MemoryError {
    fn from(err: ConfigError) -> Self {
        MemoryError::Config(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, MemoryError>;
