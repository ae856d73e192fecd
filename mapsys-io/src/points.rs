//! 点表（NO5）：29 字节表头后跟 35 字节的点记录。

use mapsys_core::records::{PointRecord, PointTableHeader};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter, decode_table, encode_table};

pub const POINT_HEADER_SIZE: usize = 29;
pub const POINT_RECORD_SIZE: usize = 35;

impl FixedLayout for PointTableHeader {
    const SIZE: usize = POINT_HEADER_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            signature: reader.signature()?,
            reserved: reader.u32_array()?,
            pad: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.signature(self.signature);
        writer.u32_slice(&self.reserved);
        writer.u8(self.pad);
    }
}

impl FixedLayout for PointRecord {
    const SIZE: usize = POINT_RECORD_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            kind: reader.u8()?,
            id: reader.u32()?,
            layer: reader.u8()?,
            number: reader.u32()?,
            east: reader.f64()?,
            north: reader.f64()?,
            elevation: reader.f32()?,
            uniq: reader.u32()?,
            connections: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.u8(self.kind);
        writer.u32(self.id);
        writer.u8(self.layer);
        writer.u32(self.number);
        writer.f64(self.east);
        writer.f64(self.north);
        writer.f32(self.elevation);
        writer.u32(self.uniq);
        writer.u8(self.connections);
    }
}

pub fn decode_point_table(
    data: &[u8],
) -> Result<Decoded<PointTableHeader, PointRecord>, FormatError> {
    decode_table(data, TableKind::Points)
}

pub fn encode_point_table(header: &PointTableHeader, records: &[PointRecord]) -> Vec<u8> {
    encode_table(header, records)
}

/// 点表文件内的字节偏移换算为记录序号；落在表头内或未对齐记录边界时返回 `None`。
pub fn point_index_for_byte_offset(raw: u32) -> Option<usize> {
    let body = (raw as usize).checked_sub(POINT_HEADER_SIZE)?;
    (body % POINT_RECORD_SIZE == 0).then_some(body / POINT_RECORD_SIZE)
}

#[inline]
pub fn byte_offset_for_point_index(index: usize) -> usize {
    POINT_HEADER_SIZE + index * POINT_RECORD_SIZE
}
