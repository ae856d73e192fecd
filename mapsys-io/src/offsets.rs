//! 顶点偏移表（AS5）：通用表头后跟连续的 32 位原始值。

use mapsys_core::records::{Va50Header, VertexOffset};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter, decode_table, encode_table};

pub const VERTEX_OFFSET_SIZE: usize = 4;

impl FixedLayout for VertexOffset {
    const SIZE: usize = VERTEX_OFFSET_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self(reader.u32()?))
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.u32(self.0);
    }
}

pub fn decode_vertex_offsets(
    data: &[u8],
) -> Result<Decoded<Va50Header, VertexOffset>, FormatError> {
    decode_table(data, TableKind::VertexOffsets)
}

pub fn encode_vertex_offsets(header: &Va50Header, offsets: &[VertexOffset]) -> Vec<u8> {
    encode_table(header, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VA50_HEADER_SIZE;

    #[test]
    fn decodes_raw_values() {
        let offsets: Vec<VertexOffset> = [0u32, 1, 1_000_000, u32::MAX]
            .into_iter()
            .map(VertexOffset::from)
            .collect();
        let bytes = encode_vertex_offsets(&Va50Header::default(), &offsets);
        assert_eq!(bytes.len(), VA50_HEADER_SIZE + 16);
        let decoded = decode_vertex_offsets(&bytes).unwrap();
        assert_eq!(decoded.records, offsets);
    }

    #[test]
    fn header_only_yields_empty_sequence() {
        let bytes = encode_vertex_offsets(&Va50Header::default(), &[]);
        let decoded = decode_vertex_offsets(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = decode_vertex_offsets(b"VA50\x01\x00").unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                table: TableKind::VertexOffsets,
                ..
            }
        ));
    }
}
