//! 多段线索引表（AR5）：表头与 9 字节填充后跟 29 字节的多段线记录。

use mapsys_core::records::{PolylineRecord, PolylineTableHeader};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter, decode_table, encode_table};

pub const POLYLINE_HEADER_SIZE: usize = 29;
pub const POLYLINE_RECORD_SIZE: usize = 29;

impl FixedLayout for PolylineTableHeader {
    const SIZE: usize = POLYLINE_HEADER_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        let signature = reader.signature()?;
        let reserved = reader.u32_array()?;
        reader.enter("file-level filler");
        let filler = reader.array()?;
        Ok(Self {
            signature,
            reserved,
            filler,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.signature(self.signature);
        writer.u32_slice(&self.reserved);
        writer.bytes(&self.filler);
    }
}

impl FixedLayout for PolylineRecord {
    const SIZE: usize = POLYLINE_RECORD_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            category: reader.u8()?,
            line_id: reader.u32()?,
            line_number: reader.u32()?,
            reserved: reader.u32()?,
            vertex_offset_index: reader.u32()?,
            vertex_count: reader.u16()?,
            layer_row: reader.u32()?,
            layer_count: reader.u8()?,
            tag: reader.u32()?,
            kind: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.u8(self.category);
        writer.u32(self.line_id);
        writer.u32(self.line_number);
        writer.u32(self.reserved);
        writer.u32(self.vertex_offset_index);
        writer.u16(self.vertex_count);
        writer.u32(self.layer_row);
        writer.u8(self.layer_count);
        writer.u32(self.tag);
        writer.u8(self.kind);
    }
}

pub fn decode_polyline_table(
    data: &[u8],
) -> Result<Decoded<PolylineTableHeader, PolylineRecord>, FormatError> {
    decode_table(data, TableKind::Polylines)
}

pub fn encode_polyline_table(header: &PolylineTableHeader, records: &[PolylineRecord]) -> Vec<u8> {
    encode_table(header, records)
}
