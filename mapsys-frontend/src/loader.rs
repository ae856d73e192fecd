use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::Encoding;
use mapsys_config::AppConfig;
use mapsys_core::table::TableKind;
use mapsys_engine::{Content, LoadOptions, LoadReport};
use mapsys_io::default_code_page;
use tracing::{debug, info, warn};

use crate::companion::{Companion, format_for_extension, read_companion};
use crate::discovery::{ProjectFiles, resolve_input};
use crate::errors::FrontendError;

/// 统一封装加载后的项目内容与元信息。
#[derive(Debug)]
pub struct LoadedProject {
    pub files: ProjectFiles,
    pub content: Content,
    pub report: LoadReport,
    /// 二进制表以外的附属文件，按大写扩展名索引。
    pub sidecars: BTreeMap<String, Companion>,
    /// 读取失败的附属文件，不影响其余内容。
    pub sidecar_errors: Vec<(String, FrontendError)>,
}

/// 由配置得到解码选项；无法识别的代码页退回 Windows-1250。
pub fn load_options_from_config(config: &AppConfig) -> LoadOptions {
    let label = config.decoding.code_page.trim();
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        warn!(code_page = label, "无法识别的代码页，改用 windows-1250");
        default_code_page()
    });
    LoadOptions {
        encoding,
        addressing: config.decoding.vertex_addressing,
    }
}

/// 加载项目：输入可以是项目中的任意文件，也可以是只含一个 `.pr5` 的目录。
pub fn load_project(input: &Path, options: &LoadOptions) -> Result<LoadedProject, FrontendError> {
    let main_file = resolve_input(input)?;
    let files = ProjectFiles::discover(&main_file)?;
    let source = files.read_tables()?;
    let (content, report) = Content::populate(&source, options);

    let mut sidecars = BTreeMap::new();
    let mut sidecar_errors = Vec::new();
    for (extension, path) in files.files() {
        if TableKind::from_extension(extension).is_some() {
            continue;
        }
        let Some(format) = format_for_extension(extension) else {
            debug!(extension, path = %path.display(), "未知的伴随文件类型，忽略");
            continue;
        };
        match read_companion(path, format) {
            Ok(companion) => {
                sidecars.insert(extension.to_string(), companion);
            }
            Err(err) => {
                warn!(extension, error = %err, "读取附属文件失败");
                sidecar_errors.push((extension.to_string(), err));
            }
        }
    }

    info!(
        main_file = %files.main_file().display(),
        tables = report.loaded.len(),
        sidecars = sidecars.len(),
        "项目加载完成"
    );

    Ok(LoadedProject {
        files,
        content,
        report,
        sidecars,
        sidecar_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{WINDOWS_1250, WINDOWS_1252};
    use mapsys_core::table::VertexAddressing;

    #[test]
    fn options_follow_configuration() {
        let mut config = AppConfig::default();
        config.decoding.code_page = "windows-1252".to_string();
        config.decoding.vertex_addressing = VertexAddressing::ByteOffset;
        let options = load_options_from_config(&config);
        assert_eq!(options.encoding, WINDOWS_1252);
        assert_eq!(options.addressing, VertexAddressing::ByteOffset);
    }

    #[test]
    fn unknown_code_page_falls_back() {
        let mut config = AppConfig::default();
        config.decoding.code_page = "klingon".to_string();
        assert_eq!(load_options_from_config(&config).encoding, WINDOWS_1250);
    }
}
