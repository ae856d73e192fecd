use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use mapsys_core::table::VertexAddressing;
use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "MAPSYS_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub decoding: DecodingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `MAPSYS_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 解码相关配置。
#[derive(Debug, Clone, Deserialize)]
pub struct DecodingConfig {
    /// 遗留字符串的代码页标签（WHATWG 名称，如 `windows-1250`）。
    #[serde(default = "DecodingConfig::default_code_page")]
    pub code_page: String,
    #[serde(default)]
    pub vertex_addressing: VertexAddressing,
}

impl DecodingConfig {
    fn default_code_page() -> String {
        "windows-1250".to_string()
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            code_page: Self::default_code_page(),
            vertex_addressing: VertexAddressing::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 摘要中每一节最多打印的行数。
    #[serde(default = "OutputConfig::default_summary_limit")]
    pub summary_limit: usize,
}

impl OutputConfig {
    fn default_summary_limit() -> usize {
        20
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_limit: Self::default_summary_limit(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
