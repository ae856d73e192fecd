use std::path::PathBuf;

use mapsys_engine::errors::EngineError;
use mapsys_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("输入路径 {path:?} 不存在")]
    InputNotFound { path: PathBuf },
    #[error("目录 {dir:?} 中没有 .pr5 主文件")]
    NoMainFile { dir: PathBuf },
    #[error("目录 {dir:?} 中存在多个 .pr5 主文件: {candidates:?}")]
    AmbiguousMainFile {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },
    #[error("未找到与 {stem} 同名的非空伴随文件")]
    NoCompanionFiles { stem: String },
    #[error("遍历目录 {dir:?} 失败: {source}")]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("{path:?} 第 {line} 行缺少 `=`: {content:?}")]
    KeyValue {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("读取 CSV 文件 {path:?} 失败: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("序列化 JSON 失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("写出结果失败: {0}")]
    Output(#[from] std::io::Error),
}
