//! 项目文件（PR5）：定长表头、256 个图层样式、256 条辅助记录与尾部区块。
//!
//! 每个区块都按固定长度读取，缺失任意一个区块都会报告该区块的名称。

use encoding_rs::Encoding;
use mapsys_core::project::{
    AfterLayerRecord, FONT_COUNT, FontEntry, LAYER_ATTRIBUTE_COUNT, LAYER_COUNT, LayerAttribute,
    LayerStyle, PROJECT_SIGNATURE, ProjectFile, ProjectHeader,
};
use mapsys_core::table::TableKind;
use tracing::debug;

use crate::FormatError;
use crate::codec::{RecordReader, RecordWriter};
use crate::strings::{decode_fixed_c_string, default_code_page, encode_fixed_c_string};

pub const PROJECT_HEADER_SIZE: usize = 664;
pub const LAYER_STYLE_SIZE: usize = 352;
pub const LAYER_ATTRIBUTE_SIZE: usize = 21;
pub const AFTER_LAYER_RECORD_SIZE: usize = 99;
pub const FONT_ENTRY_SIZE: usize = 13;
const PATH_SIZE: usize = 256;
const LAYER_TITLE_SIZE: usize = 64;
const LAYER_OPAQUE_B_SIZE: usize = 81;
const AFTER_LAYER_NAME_SIZE: usize = 64;
const TRAILER_BLOCK_SIZE: usize = 256;

/// 完整项目文件的字节长度。
pub const PROJECT_FILE_SIZE: usize = PROJECT_HEADER_SIZE
    + LAYER_COUNT * LAYER_STYLE_SIZE
    + LAYER_COUNT * AFTER_LAYER_RECORD_SIZE
    + 4
    + 2 * TRAILER_BLOCK_SIZE
    + FONT_COUNT * FONT_ENTRY_SIZE
    + 6
    + PATH_SIZE
    + TRAILER_BLOCK_SIZE;

pub fn decode_project_file(data: &[u8]) -> Result<ProjectFile, FormatError> {
    decode_project_file_with(data, default_code_page())
}

/// 先校验 6 字节签名，再依次读取各个定长区块。
pub fn decode_project_file_with(
    data: &[u8],
    encoding: &'static Encoding,
) -> Result<ProjectFile, FormatError> {
    let mut reader = RecordReader::new(data, TableKind::Project);
    let header = decode_header(&mut reader, encoding)?;

    let mut layers = Vec::with_capacity(LAYER_COUNT);
    for index in 0..LAYER_COUNT {
        reader.enter(format!("layer {index}"));
        reader.require(LAYER_STYLE_SIZE)?;
        layers.push(decode_layer(&mut reader, encoding)?);
    }

    let mut after_layers = Vec::with_capacity(LAYER_COUNT);
    for index in 0..LAYER_COUNT {
        reader.enter(format!("after-layer record {index}"));
        reader.require(AFTER_LAYER_RECORD_SIZE)?;
        after_layers.push(decode_after_layer(&mut reader, encoding)?);
    }

    reader.enter("trailer lead");
    let trailer_lead = reader.array()?;
    reader.enter("character table");
    let characters = reader.take(TRAILER_BLOCK_SIZE)?.to_vec();
    reader.enter("ones table");
    let ones = reader.take(TRAILER_BLOCK_SIZE)?.to_vec();

    reader.enter("font table");
    reader.require(FONT_COUNT * FONT_ENTRY_SIZE)?;
    let mut fonts = Vec::with_capacity(FONT_COUNT);
    for _ in 0..FONT_COUNT {
        let raw: [u8; FONT_ENTRY_SIZE] = reader.array()?;
        fonts.push(FontEntry {
            name: decode_fixed_c_string(&raw[..FONT_ENTRY_SIZE - 1], encoding),
            raw,
        });
    }

    reader.enter("trailer values");
    let trailer_value_a = reader.u16()?;
    let trailer_value_b = reader.u16()?;
    let trailer_pad = reader.array()?;
    reader.enter("database path");
    let database_path = decode_fixed_c_string(reader.take(PATH_SIZE)?, encoding);
    reader.enter("zero tail");
    let tail = reader.take(TRAILER_BLOCK_SIZE)?.to_vec();

    if reader.remaining() > 0 {
        debug!(trailing = reader.remaining(), "项目文件末尾存在多余字节");
    }

    Ok(ProjectFile {
        header,
        layers,
        after_layers,
        trailer_lead,
        characters,
        ones,
        fonts,
        trailer_value_a,
        trailer_value_b,
        trailer_pad,
        database_path,
        tail,
    })
}

fn decode_header(
    reader: &mut RecordReader<'_>,
    encoding: &'static Encoding,
) -> Result<ProjectHeader, FormatError> {
    reader.enter("signature");
    let signature: [u8; 6] = reader.array()?;
    if &signature != PROJECT_SIGNATURE {
        return Err(FormatError::BadSignature {
            table: TableKind::Project,
            found: signature.to_vec(),
        });
    }

    reader.enter("header");
    reader.require(PROJECT_HEADER_SIZE - PROJECT_SIGNATURE.len())?;
    Ok(ProjectHeader {
        signature,
        zero: reader.u8()?,
        unk_1: reader.array()?,
        file_path: decode_fixed_c_string(reader.take(PATH_SIZE)?, encoding),
        dir_path: decode_fixed_c_string(reader.take(PATH_SIZE)?, encoding),
        unk_2: [reader.u16()?, reader.u16()?, reader.u16()?],
        unk_3: reader.array()?,
        scale: reader.f64()?,
        false_east: reader.f64()?,
        false_north: reader.f64()?,
        reserved_a: reader.f64()?,
        reserved_b: reader.f64()?,
        ff_pad: reader.u8()?,
        east_min: reader.f64()?,
        east_max: reader.f64()?,
        north_min: reader.f64()?,
        north_max: reader.f64()?,
        two: reader.u16()?,
        reserved_blocks: {
            let mut blocks = [[0u8; 6]; 9];
            for block in &mut blocks {
                *block = reader.array()?;
            }
            blocks
        },
        trailing_pad: reader.u8()?,
    })
}

fn decode_layer(
    reader: &mut RecordReader<'_>,
    encoding: &'static Encoding,
) -> Result<LayerStyle, FormatError> {
    let lead = reader.array()?;
    let title = decode_fixed_c_string(reader.take(LAYER_TITLE_SIZE)?, encoding);
    let opaque_a = reader.array()?;
    let color = reader.u8()?;
    let weight = reader.u8()?;
    let opaque_b = reader.take(LAYER_OPAQUE_B_SIZE)?.to_vec();
    let mut attributes = Vec::with_capacity(LAYER_ATTRIBUTE_COUNT);
    for _ in 0..LAYER_ATTRIBUTE_COUNT {
        attributes.push(LayerAttribute {
            height: reader.f32()?,
            opaque_a: reader.array()?,
            scale: reader.u8()?,
            opaque_b: reader.array()?,
            color: reader.u8()?,
            content: reader.u8()?,
            dx: reader.f32()?,
            dy: reader.f32()?,
        });
    }
    Ok(LayerStyle {
        lead,
        title,
        opaque_a,
        color,
        weight,
        opaque_b,
        attributes,
    })
}

fn decode_after_layer(
    reader: &mut RecordReader<'_>,
    encoding: &'static Encoding,
) -> Result<AfterLayerRecord, FormatError> {
    Ok(AfterLayerRecord {
        lead: reader.u32()?,
        zero_two: reader.u16()?,
        name: decode_fixed_c_string(reader.take(AFTER_LAYER_NAME_SIZE)?, encoding),
        terminator: reader.u8()?,
        reserved: reader.array()?,
        has_value_1: reader.u8()?,
        has_value_2: reader.u8()?,
        opaque: reader.array()?,
    })
}

pub fn encode_project_file(project: &ProjectFile) -> Vec<u8> {
    encode_project_file_with(project, default_code_page())
}

/// 始终写出完整长度的项目文件：签名固定为 `MapSys`，
/// 缺少的图层、辅助记录与字体以全 0 补齐，变长的不透明区按固定长度截断或补 0。
pub fn encode_project_file_with(project: &ProjectFile, encoding: &'static Encoding) -> Vec<u8> {
    let mut writer = RecordWriter::with_capacity(PROJECT_FILE_SIZE);
    encode_header(&mut writer, &project.header, encoding);

    let blank_layer = LayerStyle::default();
    for index in 0..LAYER_COUNT {
        let layer = project.layers.get(index).unwrap_or(&blank_layer);
        encode_layer(&mut writer, layer, encoding);
    }

    let blank_record = AfterLayerRecord::default();
    for index in 0..LAYER_COUNT {
        let record = project.after_layers.get(index).unwrap_or(&blank_record);
        writer.u32(record.lead);
        writer.u16(record.zero_two);
        writer.bytes(&encode_fixed_c_string(
            &record.name,
            AFTER_LAYER_NAME_SIZE,
            encoding,
        ));
        writer.u8(record.terminator);
        writer.bytes(&record.reserved);
        writer.u8(record.has_value_1);
        writer.u8(record.has_value_2);
        writer.bytes(&record.opaque);
    }

    writer.bytes(&project.trailer_lead);
    writer.fixed_bytes(&project.characters, TRAILER_BLOCK_SIZE);
    writer.fixed_bytes(&project.ones, TRAILER_BLOCK_SIZE);

    let blank_font = FontEntry::default();
    for index in 0..FONT_COUNT {
        let font = project.fonts.get(index).unwrap_or(&blank_font);
        writer.bytes(&encode_fixed_c_string(
            &font.name,
            FONT_ENTRY_SIZE - 1,
            encoding,
        ));
        writer.u8(font.raw[FONT_ENTRY_SIZE - 1]);
    }

    writer.u16(project.trailer_value_a);
    writer.u16(project.trailer_value_b);
    writer.bytes(&project.trailer_pad);
    writer.bytes(&encode_fixed_c_string(
        &project.database_path,
        PATH_SIZE,
        encoding,
    ));
    writer.fixed_bytes(&project.tail, TRAILER_BLOCK_SIZE);
    writer.into_bytes()
}

fn encode_header(writer: &mut RecordWriter, header: &ProjectHeader, encoding: &'static Encoding) {
    writer.bytes(PROJECT_SIGNATURE);
    writer.u8(header.zero);
    writer.bytes(&header.unk_1);
    writer.bytes(&encode_fixed_c_string(&header.file_path, PATH_SIZE, encoding));
    writer.bytes(&encode_fixed_c_string(&header.dir_path, PATH_SIZE, encoding));
    for value in header.unk_2 {
        writer.u16(value);
    }
    writer.bytes(&header.unk_3);
    writer.f64(header.scale);
    writer.f64(header.false_east);
    writer.f64(header.false_north);
    writer.f64(header.reserved_a);
    writer.f64(header.reserved_b);
    writer.u8(header.ff_pad);
    writer.f64(header.east_min);
    writer.f64(header.east_max);
    writer.f64(header.north_min);
    writer.f64(header.north_max);
    writer.u16(header.two);
    for block in &header.reserved_blocks {
        writer.bytes(block);
    }
    writer.u8(header.trailing_pad);
}

fn encode_layer(writer: &mut RecordWriter, layer: &LayerStyle, encoding: &'static Encoding) {
    writer.bytes(&layer.lead);
    writer.bytes(&encode_fixed_c_string(
        &layer.title,
        LAYER_TITLE_SIZE,
        encoding,
    ));
    writer.bytes(&layer.opaque_a);
    writer.u8(layer.color);
    writer.u8(layer.weight);
    writer.fixed_bytes(&layer.opaque_b, LAYER_OPAQUE_B_SIZE);
    let blank = LayerAttribute::default();
    for index in 0..LAYER_ATTRIBUTE_COUNT {
        let attribute = layer.attributes.get(index).unwrap_or(&blank);
        writer.f32(attribute.height);
        writer.bytes(&attribute.opaque_a);
        writer.u8(attribute.scale);
        writer.bytes(&attribute.opaque_b);
        writer.u8(attribute.color);
        writer.u8(attribute.content);
        writer.f32(attribute.dx);
        writer.f32(attribute.dy);
    }
}
