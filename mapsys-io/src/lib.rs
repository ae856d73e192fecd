use std::fs;
use std::path::{Path, PathBuf};

use mapsys_core::table::TableKind;
use thiserror::Error;

mod codec;
pub mod offsets;
pub mod points;
pub mod poly_layers;
pub mod polylines;
pub mod project;
mod strings;
pub mod text_meta;
pub mod text_store;

pub use codec::{
    Decoded, FixedLayout, RecordReader, RecordWriter, VA50_HEADER_SIZE, decode_table,
    encode_table,
};
pub use offsets::{decode_vertex_offsets, encode_vertex_offsets};
pub use points::{decode_point_table, encode_point_table};
pub use poly_layers::{decode_poly_layers, encode_poly_layers};
pub use polylines::{decode_polyline_table, encode_polyline_table};
pub use project::{
    PROJECT_FILE_SIZE, decode_project_file, decode_project_file_with, encode_project_file,
    encode_project_file_with,
};
pub use strings::{
    decode_fixed_c_string, decode_legacy, default_code_page, encode_fixed_c_string,
    encode_legacy,
};
pub use text_meta::{decode_text_meta, encode_text_meta};
pub use text_store::{
    decode_text_store, decode_text_store_with, encode_text_store, encode_text_store_with,
};

/// 单张表解码失败的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("{table}: truncated while reading {block} (needed {needed} bytes, {available} available)")]
    Truncated {
        table: TableKind,
        block: String,
        needed: usize,
        available: usize,
    },
    #[error("{table}: unrecognized signature {found:?}")]
    BadSignature { table: TableKind, found: Vec<u8> },
    #[error("{table}: header carries no data (unknown byte and reserved words are all zero)")]
    BlankHeader { table: TableKind },
    #[error("{table}: string offset {offset} exceeds the 32-bit range")]
    OffsetOverflow { table: TableKind, offset: usize },
}

impl FormatError {
    pub fn table(&self) -> TableKind {
        match self {
            FormatError::Truncated { table, .. }
            | FormatError::BadSignature { table, .. }
            | FormatError::BlankHeader { table }
            | FormatError::OffsetOverflow { table, .. } => *table,
        }
    }
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 读取整个伴随文件。
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_names_table_and_block() {
        let err = FormatError::Truncated {
            table: TableKind::Project,
            block: "layer 17".to_string(),
            needed: 352,
            available: 10,
        };
        let message = err.to_string();
        assert!(message.contains("PR5"));
        assert!(message.contains("layer 17"));
        assert_eq!(err.table(), TableKind::Project);
    }

    #[test]
    fn read_missing_file_reports_path() {
        let err = read_bytes(Path::new("/definitely/missing/file.NO5")).unwrap_err();
        assert!(matches!(err, IoError::ReadError { .. }));
        assert!(err.to_string().contains("file.NO5"));
    }
}
