pub mod content;

pub use content::{
    Content, ContentBuilder, Label, LayerResolution, LoadOptions, LoadReport, ResolvedPolyline,
    TableHeaders,
};

pub mod errors {
    use std::fmt;

    use mapsys_core::table::TableKind;
    use mapsys_io::FormatError;
    use serde::Serialize;
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum EngineError {
        #[error("failed to decode {table}: {source}")]
        Decode {
            table: TableKind,
            #[source]
            source: FormatError,
        },
        #[error("{0} is not loaded")]
        MissingTable(TableKind),
    }

    /// 不中断处理的结构异常。每个异常都会同时以 `tracing` 事件输出。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(tag = "kind", rename_all = "kebab-case")]
    pub enum Anomaly {
        /// 最后一条完整记录之后的多余字节。
        TrailingBytes { table: TableKind, bytes: usize },
        /// 多段线请求的偏移区间超出偏移表长度，只保留范围内的前缀。
        OffsetRunClamped {
            line_id: u32,
            requested: usize,
            available: usize,
        },
        /// 偏移值指向点表之外。
        PointOutOfRange {
            line_id: u32,
            point_index: usize,
            points: usize,
        },
        /// 按字节偏移解释时，原始值落在表头内或未对齐记录边界。
        MisalignedOffset { line_id: u32, raw: u32 },
        /// 解析后少于两个顶点。
        DegeneratePolyline { line_id: u32, vertices: usize },
        /// 文字元数据的偏移在文字存储中没有对应字符串。
        TextNotFound { text_id: u32, offset: u32 },
    }

    impl fmt::Display for Anomaly {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Anomaly::TrailingBytes { table, bytes } => {
                    write!(f, "{table}: {bytes} trailing bytes after the last record")
                }
                Anomaly::OffsetRunClamped {
                    line_id,
                    requested,
                    available,
                } => write!(
                    f,
                    "polyline {line_id}: {requested} vertex offsets requested, {available} available"
                ),
                Anomaly::PointOutOfRange {
                    line_id,
                    point_index,
                    points,
                } => write!(
                    f,
                    "polyline {line_id}: point index {point_index} outside {points} points"
                ),
                Anomaly::MisalignedOffset { line_id, raw } => {
                    write!(f, "polyline {line_id}: offset {raw} is not a point record boundary")
                }
                Anomaly::DegeneratePolyline { line_id, vertices } => {
                    write!(f, "polyline {line_id}: only {vertices} resolvable vertices")
                }
                Anomaly::TextNotFound { text_id, offset } => {
                    write!(f, "text {text_id}: no string at offset {offset}")
                }
            }
        }
    }
}

pub mod source {
    use std::collections::HashMap;

    use mapsys_core::table::TableKind;

    /// 按表类型提供原始字节的协作者；返回 `None` 表示该伴随文件不存在。
    /// 解码器本身从不做 I/O。
    pub trait TableSource {
        fn read_table(&self, kind: TableKind) -> Option<Vec<u8>>;
    }

    impl<F> TableSource for F
    where
        F: Fn(TableKind) -> Option<Vec<u8>>,
    {
        fn read_table(&self, kind: TableKind) -> Option<Vec<u8>> {
            self(kind)
        }
    }

    /// 预先读入内存的表集合。
    #[derive(Debug, Clone, Default)]
    pub struct MemorySource {
        tables: HashMap<TableKind, Vec<u8>>,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, kind: TableKind, bytes: Vec<u8>) -> Option<Vec<u8>> {
            self.tables.insert(kind, bytes)
        }

        pub fn with(mut self, kind: TableKind, bytes: Vec<u8>) -> Self {
            self.insert(kind, bytes);
            self
        }

        #[inline]
        pub fn contains(&self, kind: TableKind) -> bool {
            self.tables.contains_key(&kind)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.tables.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.tables.is_empty()
        }
    }

    impl TableSource for MemorySource {
        fn read_table(&self, kind: TableKind) -> Option<Vec<u8>> {
            self.tables.get(&kind).cloned()
        }
    }
}
