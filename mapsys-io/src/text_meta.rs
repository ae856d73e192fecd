//! 文字元数据表（TE5）：29 字节表头后跟 49 字节记录。

use mapsys_core::records::{TextMetaHeader, TextMetaRecord};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter, decode_table, encode_table};

pub const TEXT_META_HEADER_SIZE: usize = 29;
pub const TEXT_META_RECORD_SIZE: usize = 49;

impl FixedLayout for TextMetaHeader {
    const SIZE: usize = TEXT_META_HEADER_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        let header = Self {
            signature: reader.signature()?,
            unknown: reader.u8()?,
            reserved: reader.u32_array()?,
        };
        if header.is_blank() {
            return Err(FormatError::BlankHeader {
                table: reader.table(),
            });
        }
        Ok(header)
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.signature(self.signature);
        writer.u8(self.unknown);
        writer.u32_slice(&self.reserved);
    }
}

impl FixedLayout for TextMetaRecord {
    const SIZE: usize = TEXT_META_RECORD_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            deleted: reader.u8()?,
            text_id: reader.u32()?,
            layer: reader.u8()?,
            font: reader.u8()?,
            flags: reader.u8()?,
            height: reader.f32()?,
            rotation: reader.f32()?,
            east: reader.f64()?,
            north: reader.f64()?,
            align_east: reader.f32()?,
            align_north: reader.f32()?,
            elevation: reader.f32()?,
            offset: reader.u32()?,
            stored_length: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.u8(self.deleted);
        writer.u32(self.text_id);
        writer.u8(self.layer);
        writer.u8(self.font);
        writer.u8(self.flags);
        writer.f32(self.height);
        writer.f32(self.rotation);
        writer.f64(self.east);
        writer.f64(self.north);
        writer.f32(self.align_east);
        writer.f32(self.align_north);
        writer.f32(self.elevation);
        writer.u32(self.offset);
        writer.u8(self.stored_length);
    }
}

/// 表头的未知字节与保留字全为 0 时返回 `FormatError::BlankHeader`。
pub fn decode_text_meta(
    data: &[u8],
) -> Result<Decoded<TextMetaHeader, TextMetaRecord>, FormatError> {
    decode_table(data, TableKind::TextMeta)
}

pub fn encode_text_meta(header: &TextMetaHeader, records: &[TextMetaRecord]) -> Vec<u8> {
    encode_table(header, records)
}
