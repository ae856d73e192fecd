use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};
use mapsys_core::records::Va50Header;
use mapsys_core::table::{Signature, TableKind};
use tracing::debug;

use crate::FormatError;

/// 固定长度、小端、无隐式填充的结构布局。表头和记录都通过它解码与编码。
pub trait FixedLayout: Sized {
    /// 布局的字节长度。
    const SIZE: usize;

    fn decode(reader: &mut RecordReader<'_>) -> Result<Self, FormatError>;

    fn encode(&self, writer: &mut RecordWriter);
}

/// 一张表的解码结果：表头、按文件顺序排列的记录，以及消费位置与剩余字节数。
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<H, R> {
    pub header: H,
    pub records: Vec<R>,
    /// 最后一条完整记录之后的位置。
    pub consumed: usize,
    /// 不足一条记录、被丢弃的尾部字节数。
    pub trailing: usize,
}

impl<H, R> Decoded<H, R> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 对只读字节缓冲区的单向游标。所有读取都做越界检查，失败时报告当前正在读取的块。
#[derive(Debug)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    position: usize,
    table: TableKind,
    block: Cow<'static, str>,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8], table: TableKind) -> Self {
        Self {
            data,
            position: 0,
            table,
            block: Cow::Borrowed("header"),
        }
    }

    #[inline]
    pub fn table(&self) -> TableKind {
        self.table
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// 标记接下来要读取的块，用于错误信息。
    pub fn enter(&mut self, block: impl Into<Cow<'static, str>>) {
        self.block = block.into();
    }

    /// 确认剩余字节足够容纳 `needed` 字节。
    pub fn require(&self, needed: usize) -> Result<(), FormatError> {
        let available = self.remaining();
        if available < needed {
            return Err(FormatError::Truncated {
                table: self.table,
                block: self.block.to_string(),
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        self.require(len)?;
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    /// 读取到缓冲区末尾的全部剩余字节。
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.position..];
        self.position = self.data.len();
        slice
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    #[inline]
    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    #[inline]
    pub fn f32(&mut self) -> Result<f32, FormatError> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    #[inline]
    pub fn f64(&mut self) -> Result<f64, FormatError> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn u32_array<const N: usize>(&mut self) -> Result<[u32; N], FormatError> {
        let mut out = [0u32; N];
        for slot in &mut out {
            *slot = self.u32()?;
        }
        Ok(out)
    }

    /// 读取并校验 4 字节 VA50 标记。
    pub fn signature(&mut self) -> Result<Signature, FormatError> {
        let tag = self.array::<4>()?;
        Signature::from_tag(tag).ok_or_else(|| FormatError::BadSignature {
            table: self.table,
            found: tag.to_vec(),
        })
    }
}

/// 小端字节写入器，是 `RecordReader` 的逆操作。
#[derive(Debug, Default)]
pub struct RecordWriter {
    buffer: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// 写入恰好 `size` 字节：过长截断，不足补 0。
    pub fn fixed_bytes(&mut self, bytes: &[u8], size: usize) {
        let len = bytes.len().min(size);
        self.buffer.extend_from_slice(&bytes[..len]);
        self.buffer.resize(self.buffer.len() + (size - len), 0);
    }

    #[inline]
    pub fn u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn f32(&mut self, value: f32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn f64(&mut self, value: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.buffer.extend_from_slice(&buf);
    }

    pub fn u32_slice(&mut self, values: &[u32]) {
        for value in values {
            self.u32(*value);
        }
    }

    pub fn signature(&mut self, signature: Signature) {
        self.bytes(&signature.tag());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// 解码“表头 + 重复的定长记录直到缓冲区结束”的通用骨架。
///
/// 缓冲区短于表头或标记不符时失败；尾部不足一条记录的字节不会被解释为记录，
/// 只记录在 `Decoded::trailing` 中。
pub fn decode_table<H, R>(data: &[u8], table: TableKind) -> Result<Decoded<H, R>, FormatError>
where
    H: FixedLayout,
    R: FixedLayout,
{
    debug_assert!(R::SIZE > 0);
    let mut reader = RecordReader::new(data, table);
    let header = H::decode(&mut reader)?;

    reader.enter("records");
    let mut records = Vec::with_capacity(reader.remaining() / R::SIZE);
    while reader.remaining() >= R::SIZE {
        records.push(R::decode(&mut reader)?);
    }

    let trailing = reader.remaining();
    if trailing > 0 {
        debug!(
            table = %table,
            trailing,
            records = records.len(),
            "最后一条完整记录之后存在多余字节"
        );
    }

    Ok(Decoded {
        header,
        records,
        consumed: reader.position(),
        trailing,
    })
}

/// `decode_table` 的逆操作。
pub fn encode_table<H, R>(header: &H, records: &[R]) -> Vec<u8>
where
    H: FixedLayout,
    R: FixedLayout,
{
    let mut writer = RecordWriter::with_capacity(H::SIZE + records.len() * R::SIZE);
    header.encode(&mut writer);
    for record in records {
        record.encode(&mut writer);
    }
    writer.into_bytes()
}

pub const VA50_HEADER_SIZE: usize = 21;

impl FixedLayout for Va50Header {
    const SIZE: usize = VA50_HEADER_SIZE;

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
