use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mapsys_core::table::TableKind;
use mapsys_engine::source::MemorySource;
use mapsys_io::read_bytes;
use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::errors::FrontendError;

/// 一个项目的伴随文件：与主文件同名、仅扩展名不同的非空文件，按大写扩展名索引。
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    main_file: PathBuf,
    stem: String,
    files: BTreeMap<String, PathBuf>,
}

impl ProjectFiles {
    /// 从项目中的任意一个文件出发，收集同目录下同名（不区分大小写）的非空文件。
    pub fn discover(main_file: &Path) -> Result<Self, FrontendError> {
        let stem = main_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let dir = match main_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| FrontendError::Walk {
                dir: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let matches_stem = path
                .file_stem()
                .is_some_and(|candidate| candidate.to_string_lossy().to_uppercase() == stem);
            let Some(extension) = path.extension() else {
                continue;
            };
            if !matches_stem {
                continue;
            }
            let is_empty = fs::metadata(path)
                .map(|meta| meta.len() == 0)
                .unwrap_or(true);
            if is_empty {
                debug!(path = %path.display(), "跳过空文件");
                continue;
            }
            let key = extension.to_string_lossy().to_uppercase();
            trace!(extension = %key, path = %path.display(), "发现伴随文件");
            files.insert(key, path.to_path_buf());
        }

        if files.is_empty() {
            return Err(FrontendError::NoCompanionFiles { stem });
        }
        info!(stem = %stem, count = files.len(), "已收集伴随文件");

        Ok(Self {
            main_file: main_file.to_path_buf(),
            stem,
            files,
        })
    }

    #[inline]
    pub fn main_file(&self) -> &Path {
        &self.main_file
    }

    #[inline]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 以大写扩展名排序的 `(扩展名, 路径)`。
    pub fn files(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.files
            .iter()
            .map(|(ext, path)| (ext.as_str(), path.as_path()))
    }

    pub fn get(&self, extension: &str) -> Option<&Path> {
        self.files
            .get(&extension.trim_start_matches('.').to_ascii_uppercase())
            .map(PathBuf::as_path)
    }

    pub fn table_path(&self, kind: TableKind) -> Option<&Path> {
        self.get(kind.extension())
    }

    /// 读入全部二进制表，供聚合器解码；缺失的表不放入结果。
    pub fn read_tables(&self) -> Result<MemorySource, FrontendError> {
        let mut source = MemorySource::new();
        for kind in TableKind::ALL {
            match self.table_path(kind) {
                Some(path) => {
                    source.insert(kind, read_bytes(path)?);
                }
                None => debug!(table = %kind, "伴随文件不存在"),
            }
        }
        Ok(source)
    }
}

/// 在目录中查找唯一的 `*.pr5` 主文件。
pub fn find_main_file(dir: &Path) -> Result<PathBuf, FrontendError> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| FrontendError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        let is_project = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pr5"));
        if entry.file_type().is_file() && is_project {
            candidates.push(entry.into_path());
        }
    }

    match candidates.len() {
        0 => Err(FrontendError::NoMainFile {
            dir: dir.to_path_buf(),
        }),
        1 => {
            let main_file = candidates.remove(0);
            debug!(path = %main_file.display(), "找到主文件");
            Ok(main_file)
        }
        _ => Err(FrontendError::AmbiguousMainFile {
            dir: dir.to_path_buf(),
            candidates,
        }),
    }
}

/// 目录输入解析为其中的主文件，文件输入原样返回。
pub fn resolve_input(path: &Path) -> Result<PathBuf, FrontendError> {
    if path.is_dir() {
        find_main_file(path)
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(FrontendError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn siblings_are_keyed_by_upper_extension() {
        let dir = tempfile::tempdir().unwrap();
        let main = touch(dir.path(), "Brasov.pr5", b"x");
        touch(dir.path(), "BRASOV.NO5", b"x");
        touch(dir.path(), "brasov.ts5", b"x");
        touch(dir.path(), "BRASOV.AS5", b"");
        touch(dir.path(), "OTHER.NO5", b"x");

        let files = ProjectFiles::discover(&main).unwrap();
        assert_eq!(files.stem(), "BRASOV");
        let keys: Vec<&str> = files.files().map(|(ext, _)| ext).collect();
        assert_eq!(keys, vec!["NO5", "PR5", "TS5"]);
        assert!(files.table_path(TableKind::TextStore).is_some());
        assert!(files.get("as5").is_none());
    }

    #[test]
    fn read_tables_skips_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let main = touch(dir.path(), "JOB.PR5", b"project");
        touch(dir.path(), "JOB.NO5", b"points");
        touch(dir.path(), "JOB.MEI", b"a=1");

        let source = ProjectFiles::discover(&main).unwrap().read_tables().unwrap();
        assert_eq!(source.len(), 2);
        assert!(source.contains(TableKind::Points));
        assert!(source.contains(TableKind::Project));
    }

    #[test]
    fn main_file_must_be_unique() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_main_file(dir.path()),
            Err(FrontendError::NoMainFile { .. })
        ));

        let first = touch(dir.path(), "A.PR5", b"x");
        assert_eq!(find_main_file(dir.path()).unwrap(), first);

        touch(dir.path(), "b.pr5", b"x");
        match find_main_file(dir.path()) {
            Err(FrontendError::AmbiguousMainFile { candidates, .. }) => {
                assert_eq!(candidates.len(), 2)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(&dir.path().join("nothing.pr5")).unwrap_err();
        assert!(matches!(err, FrontendError::InputNotFound { .. }));
    }
}
