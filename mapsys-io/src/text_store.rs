//! 文字存储（TS5）：通用表头后跟以 NUL 结尾的字符串块。

use encoding_rs::Encoding;
use mapsys_core::records::{TextEntry, Va50Header};
use mapsys_core::table::TableKind;

use crate::FormatError;
use crate::codec::{Decoded, FixedLayout, RecordReader, RecordWriter};
use crate::strings::{decode_legacy, default_code_page, encode_legacy};

pub fn decode_text_store(data: &[u8]) -> Result<Decoded<Va50Header, TextEntry>, FormatError> {
    decode_text_store_with(data, default_code_page())
}

/// 按给定代码页解码字符串块。
///
/// 相邻的两个 NUL 产生一个空字符串条目；末尾缺少 NUL 的片段同样作为一个条目。
/// 每个条目的偏移相对字符串块起点（即表头之后）计算。
pub fn decode_text_store_with(
    data: &[u8],
    encoding: &'static Encoding,
) -> Result<Decoded<Va50Header, TextEntry>, FormatError> {
    let mut reader = RecordReader::new(data, TableKind::TextStore);
    let header = Va50Header::decode(&mut reader)?;
    let block = reader.rest();

    let mut entries = Vec::new();
    let mut start = 0usize;
    while start < block.len() {
        let (raw, next) = match block[start..].iter().position(|byte| *byte == 0) {
            Some(len) => (&block[start..start + len], start + len + 1),
            None => (&block[start..], block.len()),
        };
        let offset = u32::try_from(start).map_err(|_| FormatError::OffsetOverflow {
            table: TableKind::TextStore,
            offset: start,
        })?;
        entries.push(TextEntry {
            offset,
            text: decode_legacy(raw, encoding),
        });
        start = next;
    }

    Ok(Decoded {
        header,
        records: entries,
        consumed: data.len(),
        trailing: 0,
    })
}

pub fn encode_text_store<S: AsRef<str>>(header: &Va50Header, texts: &[S]) -> Vec<u8> {
    encode_text_store_with(header, texts, default_code_page())
}

/// 每个字符串后写入一个 NUL。
pub fn encode_text_store_with<S: AsRef<str>>(
    header: &Va50Header,
    texts: &[S],
    encoding: &'static Encoding,
) -> Vec<u8> {
    let mut writer = RecordWriter::new();
    header.encode(&mut writer);
    for text in texts {
        writer.bytes(&encode_legacy(text.as_ref(), encoding));
        writer.u8(0);
    }
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VA50_HEADER_SIZE;

    fn store(body: &[u8]) -> Vec<u8> {
        let mut bytes = encode_text_store::<&str>(&Va50Header::default(), &[]);
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn offsets_are_relative_to_block_start() {
        let decoded = decode_text_store(&store(b"Abc\0De\0")).unwrap();
        let pairs: Vec<(u32, &str)> = decoded
            .records
            .iter()
            .map(|entry| (entry.offset, entry.text.as_str()))
            .collect();
        assert_eq!(pairs, vec![(0, "Abc"), (4, "De")]);
    }

    #[test]
    fn empty_strings_between_terminators_are_kept() {
        let decoded = decode_text_store(&store(b"A\0\0B\0")).unwrap();
        let pairs: Vec<(u32, &str)> = decoded
            .records
            .iter()
            .map(|entry| (entry.offset, entry.text.as_str()))
            .collect();
        assert_eq!(pairs, vec![(0, "A"), (2, ""), (3, "B")]);
    }

    #[test]
    fn unterminated_tail_is_accepted() {
        let decoded = decode_text_store(&store(b"X\0tail")).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[1].offset, 2);
        assert_eq!(decoded.records[1].text, "tail");
    }

    #[test]
    fn header_only_store_is_empty() {
        let decoded = decode_text_store(&store(b"")).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn decodes_code_page_letters() {
        let decoded = decode_text_store(&store(&[b'P', 0xE3, b'r', b'u', 0])).unwrap();
        assert_eq!(decoded.records[0].text, "Păru");
    }

    #[test]
    fn encoder_terminates_every_entry() {
        let bytes = encode_text_store(&Va50Header::default(), &["Ion", "", "ă"]);
        assert_eq!(&bytes[VA50_HEADER_SIZE..], &[b'I', b'o', b'n', 0, 0, 0xE3, 0]);
    }

    #[test]
    fn signature_mismatch_is_rejected() {
        let mut bytes = store(b"A\0");
        bytes[0] = b'Z';
        let err = decode_text_store(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::BadSignature { .. }));
    }
}
