//! 伴随文件的读取策略。除二进制表外，项目目录中还有若干文本、键值与 CSV 附属文件。

use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_8;
use mapsys_io::{decode_legacy, read_bytes};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::FrontendError;

/// 一个伴随文件应当如何读取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompanionFormat {
    /// VA50 家族二进制表，原始字节交给解码器。
    Va50,
    /// 结构未知的二进制数据，原样保留。
    Binary,
    TextLines,
    /// 每行一个 `键=值`。
    KeyValue,
    Csv,
    /// 内嵌关系数据库，本工具不读取。
    RelationalDump,
}

const REGISTRY: &[(&str, CompanionFormat)] = &[
    ("AL5", CompanionFormat::Va50),
    ("APP", CompanionFormat::TextLines),
    ("AR5", CompanionFormat::Va50),
    ("AS5", CompanionFormat::Va50),
    ("AT5", CompanionFormat::Va50),
    ("CRS", CompanionFormat::TextLines),
    ("CSI", CompanionFormat::Csv),
    ("DEL", CompanionFormat::TextLines),
    ("DTS", CompanionFormat::Binary),
    ("EAD", CompanionFormat::TextLines),
    ("IMS", CompanionFormat::TextLines),
    ("JLK", CompanionFormat::TextLines),
    ("LGN", CompanionFormat::TextLines),
    ("LGS", CompanionFormat::TextLines),
    ("MDB", CompanionFormat::RelationalDump),
    ("MEI", CompanionFormat::KeyValue),
    ("NO5", CompanionFormat::Va50),
    ("NS5", CompanionFormat::Va50),
    ("OL5", CompanionFormat::Binary),
    ("PR5", CompanionFormat::Binary),
    ("PRJ", CompanionFormat::TextLines),
    ("PXT", CompanionFormat::KeyValue),
    ("QS5", CompanionFormat::Va50),
    ("QT5", CompanionFormat::Va50),
    ("RAL", CompanionFormat::TextLines),
    ("REF", CompanionFormat::TextLines),
    ("TE5", CompanionFormat::Va50),
    ("THL", CompanionFormat::TextLines),
    ("TS5", CompanionFormat::Va50),
];

/// 按扩展名（不区分大小写）查找读取策略。
pub fn format_for_extension(extension: &str) -> Option<CompanionFormat> {
    let upper = extension.trim_start_matches('.').to_ascii_uppercase();
    REGISTRY
        .iter()
        .find(|(ext, _)| *ext == upper)
        .map(|(_, format)| *format)
}

pub fn known_extensions() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(ext, _)| *ext)
}

/// 按策略读取后的附属文件内容。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum Companion {
    Raw {
        size: usize,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
    TextLines {
        lines: Vec<String>,
    },
    KeyValue {
        entries: BTreeMap<String, String>,
    },
    Csv {
        rows: Vec<Vec<String>>,
    },
    Skipped,
}

impl Companion {
    /// 摘要中显示的条目数量。
    pub fn item_count(&self) -> usize {
        match self {
            Companion::Raw { size, .. } => *size,
            Companion::TextLines { lines } => lines.len(),
            Companion::KeyValue { entries } => entries.len(),
            Companion::Csv { rows } => rows.len(),
            Companion::Skipped => 0,
        }
    }
}

pub fn read_companion(path: &Path, format: CompanionFormat) -> Result<Companion, FrontendError> {
    debug!(path = %path.display(), ?format, "读取伴随文件");
    match format {
        CompanionFormat::Va50 | CompanionFormat::Binary => {
            let bytes = read_bytes(path)?;
            Ok(Companion::Raw {
                size: bytes.len(),
                bytes,
            })
        }
        CompanionFormat::TextLines => Ok(Companion::TextLines {
            lines: read_text(path)?.lines().map(str::to_string).collect(),
        }),
        CompanionFormat::KeyValue => Ok(Companion::KeyValue {
            entries: parse_key_values(path, &read_text(path)?)?,
        }),
        CompanionFormat::Csv => Ok(Companion::Csv {
            rows: parse_csv(path, &read_text(path)?)?,
        }),
        CompanionFormat::RelationalDump => {
            info!(path = %path.display(), "跳过内嵌数据库文件");
            Ok(Companion::Skipped)
        }
    }
}

fn read_text(path: &Path) -> Result<String, FrontendError> {
    Ok(decode_legacy(&read_bytes(path)?, UTF_8))
}

fn parse_key_values(path: &Path, text: &str) -> Result<BTreeMap<String, String>, FrontendError> {
    let mut entries = BTreeMap::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(FrontendError::KeyValue {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            });
        };
        entries.insert(key.to_string(), value.to_string());
    }
    Ok(entries)
}

fn parse_csv(path: &Path, text: &str) -> Result<Vec<Vec<String>>, FrontendError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| FrontendError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
