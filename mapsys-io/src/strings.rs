use encoding_rs::{Encoding, WINDOWS_1250};
use tracing::debug;

/// 遗留文件使用的单字节代码页。
pub fn default_code_page() -> &'static Encoding {
    WINDOWS_1250
}

/// WHATWG 的 windows-* 代码页把未分配的字节映射为 C1 控制字符，视为无效。
fn has_unassigned_c1(encoding: &'static Encoding, text: &str) -> bool {
    encoding.name().starts_with("windows-")
        && text.chars().any(|ch| ('\u{80}'..='\u{9F}').contains(&ch))
}

/// 按代码页解码；字节序列对该代码页无效时退回 UTF-8 替换解码，永不失败。
pub fn decode_legacy(raw: &[u8], encoding: &'static Encoding) -> String {
    match encoding.decode_without_bom_handling_and_without_replacement(raw) {
        Some(text) if !has_unassigned_c1(encoding, &text) => text.into_owned(),
        _ => {
            debug!(
                encoding = encoding.name(),
                len = raw.len(),
                "代码页解码失败，改用 UTF-8 替换解码"
            );
            String::from_utf8_lossy(raw).into_owned()
        }
    }
}

/// 解码定长、以 NUL 填充的 C 字符串：截断到第一个 NUL，并去掉首尾空白。
pub fn decode_fixed_c_string(buffer: &[u8], encoding: &'static Encoding) -> String {
    let end = buffer
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(buffer.len());
    decode_legacy(&buffer[..end], encoding).trim().to_string()
}

pub fn encode_legacy(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        debug!(encoding = encoding.name(), "文本包含代码页无法表示的字符");
    }
    bytes.into_owned()
}

/// 编码为恰好 `size` 字节的 C 字符串，至少保留一个结尾 NUL。
pub fn encode_fixed_c_string(text: &str, size: usize, encoding: &'static Encoding) -> Vec<u8> {
    let mut bytes = encode_legacy(text, encoding);
    bytes.truncate(size.saturating_sub(1));
    bytes.resize(size, 0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;

    #[test]
    fn windows_1250_letters_decode() {
        // "Ţară" 中的 Ţ、ă 在 Windows-1250 下分别为 0xDE、0xE3
        let raw = [0xDE, b'a', b'r', 0xE3];
        assert_eq!(decode_legacy(&raw, default_code_page()), "Ţară");
    }

    #[test]
    fn invalid_sequence_falls_back_to_replacement() {
        let raw = [b'o', b'k', 0xFF, b'!'];
        assert_eq!(decode_legacy(&raw, UTF_8), "ok\u{FFFD}!");
    }

    #[test]
    fn unassigned_code_page_bytes_fall_back_to_utf8() {
        for byte in [0x81, 0x83, 0x88, 0x90, 0x98] {
            assert_eq!(
                decode_legacy(&[b'a', byte, b'b'], default_code_page()),
                "a\u{FFFD}b",
                "byte = {byte:#x}"
            );
        }
        // 回退按 UTF-8 解释整段字节
        let raw = "Ş".as_bytes().iter().copied().chain([0x81]).collect::<Vec<_>>();
        assert_eq!(decode_legacy(&raw, default_code_page()), "Ş\u{FFFD}");
        // 已分配的 0x80-0x9F 字节照常按代码页解码
        assert_eq!(decode_legacy(&[0x80, 0x8A], default_code_page()), "€Š");
    }

    #[test]
    fn fixed_c_string_stops_at_nul_and_trims() {
        let mut buffer = b"  Drumuri \0garbage".to_vec();
        buffer.resize(32, 0);
        assert_eq!(
            decode_fixed_c_string(&buffer, default_code_page()),
            "Drumuri"
        );
        assert_eq!(decode_fixed_c_string(b"no-terminator", UTF_8), "no-terminator");
    }

    #[test]
    fn fixed_c_string_encoding_keeps_terminator() {
        let encoded = encode_fixed_c_string("abcdef", 4, default_code_page());
        assert_eq!(encoded, b"abc\0".to_vec());
        let encoded = encode_fixed_c_string("ă", 3, default_code_page());
        assert_eq!(encoded, vec![0xE3, 0, 0]);
    }
}
