//! 多段线图层行表（AL5）：通用表头后跟 3 字节记录。

use mapsys_core::records::{PolyLayerRecord, Va50Header};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter, decode_table, encode_table};

pub const POLY_LAYER_RECORD_SIZE: usize = 3;

impl FixedLayout for PolyLayerRecord {
    const SIZE: usize = POLY_LAYER_RECORD_SIZE;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError> {
        Ok(Self {
            layer: reader.u8()?,
            style: reader.u8()?,
            flag: reader.u8()?,
        })
    }

    fn encode(&self, writer: &mut RecordWriter) {
        writer.u8(self.layer);
        writer.u8(self.style);
        writer.u8(self.flag);
    }
}

pub fn decode_poly_layers(
    data: &[u8],
) -> Result<Decoded<Va50Header, PolyLayerRecord>, FormatError> {
    decode_table(data, TableKind::PolyLayers)
}

pub fn encode_poly_layers(header: &Va50Header, records: &[PolyLayerRecord]) -> Vec<u8> {
    encode_table(header, records)
}
