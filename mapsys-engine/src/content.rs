use std::collections::HashMap;

use encoding_rs::Encoding;
use mapsys_core::geometry::{Bounds2D, Point2};
use mapsys_core::project::{LayerStyle, ProjectFile};
use mapsys_core::records::{
    PointRecord, PointTableHeader, PolyLayerRecord, PolylineRecord, PolylineTableHeader,
    TextEntry, TextMetaHeader, TextMetaRecord, Va50Header, VertexOffset,
};
use mapsys_core::table::{TableKind, VertexAddressing};
use mapsys_io::points::point_index_for_byte_offset;
use mapsys_io::{
    FormatError, decode_point_table, decode_poly_layers, decode_polyline_table,
    decode_project_file_with, decode_text_meta, decode_text_store_with, decode_vertex_offsets,
    default_code_page,
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::errors::{Anomaly, EngineError};
use crate::source::TableSource;

/// 导出图层名使用的前缀。
pub const LAYER_PREFIX: &str = "MapSys";

/// 加载时的解码选项。
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// 遗留字符串使用的代码页。
    pub encoding: &'static Encoding,
    pub addressing: VertexAddressing,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: default_code_page(),
            addressing: VertexAddressing::default(),
        }
    }
}

/// 一次加载的结果汇总：哪些表已加载、缺失或解码失败，以及加载期异常。
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<TableKind>,
    pub missing: Vec<TableKind>,
    pub errors: Vec<EngineError>,
    pub anomalies: Vec<Anomaly>,
}

impl LoadReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.anomalies.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.errors.iter().filter_map(|err| match err {
            EngineError::Decode { table, .. } => Some(*table),
            EngineError::MissingTable(_) => None,
        })
    }
}

/// 各表的表头；`None` 表示该表未加载。
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableHeaders {
    pub points: Option<PointTableHeader>,
    pub vertex_offsets: Option<Va50Header>,
    pub polylines: Option<PolylineTableHeader>,
    pub poly_layers: Option<Va50Header>,
    pub text_meta: Option<TextMetaHeader>,
    pub text_store: Option<Va50Header>,
}

/// 多段线图层的解析结果；`Fallback` 表示 `layer_row` 超出图层行表，使用图层 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerResolution {
    Mapped(u8),
    Fallback,
}

impl LayerResolution {
    #[inline]
    pub fn layer(self) -> u8 {
        match self {
            LayerResolution::Mapped(layer) => layer,
            LayerResolution::Fallback => 0,
        }
    }

    #[inline]
    pub fn is_fallback(self) -> bool {
        matches!(self, LayerResolution::Fallback)
    }
}

/// 一条多段线解析后的顶点，以及解析中遇到的异常。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPolyline {
    pub line_id: u32,
    pub vertices: Vec<Point2>,
    pub anomalies: Vec<Anomaly>,
}

impl ResolvedPolyline {
    /// 少于两个顶点的多段线，下游几何通常忽略。
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 2
    }
}

/// 带字符串的文字标注。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label<'a> {
    pub meta: &'a TextMetaRecord,
    pub text: &'a str,
}

/// 一个项目全部表的解码结果，提供交叉引用后的视图。
///
/// 除文字偏移索引外都不可变；索引在首次查询文字时构建一次，之后只读。
#[derive(Debug, Default, Serialize)]
pub struct Content {
    headers: TableHeaders,
    points: Vec<PointRecord>,
    vertex_offsets: Vec<VertexOffset>,
    polylines: Vec<PolylineRecord>,
    poly_layers: Vec<PolyLayerRecord>,
    text_meta: Vec<TextMetaRecord>,
    texts: Vec<TextEntry>,
    project: Option<ProjectFile>,
    addressing: VertexAddressing,
    #[serde(skip)]
    text_index: OnceCell<HashMap<u32, usize>>,
}

impl Content {
    pub fn builder() -> ContentBuilder {
        ContentBuilder::default()
    }

    /// 对每种表调用一次 `source`，缺失的表保持为空，解码失败只影响该表本身。
    pub fn populate<S>(source: &S, options: &LoadOptions) -> (Content, LoadReport)
    where
        S: TableSource + ?Sized,
    {
        let mut content = Content {
            addressing: options.addressing,
            ..Content::default()
        };
        let mut report = LoadReport::default();

        for kind in TableKind::ALL {
            let Some(bytes) = source.read_table(kind) else {
                debug!(table = %kind, "未提供该表，保持为空");
                report.missing.push(kind);
                continue;
            };
            match content.install(kind, &bytes, options) {
                Ok(trailing) => {
                    report.loaded.push(kind);
                    if trailing > 0 {
                        report.anomalies.push(Anomaly::TrailingBytes {
                            table: kind,
                            bytes: trailing,
                        });
                    }
                }
                Err(err) => {
                    error!(table = %kind, error = %err, "表解码失败");
                    report.errors.push(EngineError::Decode {
                        table: kind,
                        source: err,
                    });
                }
            }
        }

        info!(
            loaded = report.loaded.len(),
            missing = report.missing.len(),
            failed = report.errors.len(),
            points = content.points.len(),
            polylines = content.polylines.len(),
            texts = content.texts.len(),
            "项目内容加载完成"
        );
        (content, report)
    }

    /// 成功时返回该表的尾部多余字节数；失败时不改动已有数据。
    fn install(
        &mut self,
        kind: TableKind,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<usize, FormatError> {
        match kind {
            TableKind::Points => {
                let decoded = decode_point_table(bytes)?;
                self.headers.points = Some(decoded.header);
                self.points = decoded.records;
                Ok(decoded.trailing)
            }
            TableKind::VertexOffsets => {
                let decoded = decode_vertex_offsets(bytes)?;
                self.headers.vertex_offsets = Some(decoded.header);
                self.vertex_offsets = decoded.records;
                Ok(decoded.trailing)
            }
            TableKind::Polylines => {
                let decoded = decode_polyline_table(bytes)?;
                self.headers.polylines = Some(decoded.header);
                self.polylines = decoded.records;
                Ok(decoded.trailing)
            }
            TableKind::PolyLayers => {
                let decoded = decode_poly_layers(bytes)?;
                self.headers.poly_layers = Some(decoded.header);
                self.poly_layers = decoded.records;
                Ok(decoded.trailing)
            }
            TableKind::TextMeta => {
                let decoded = decode_text_meta(bytes)?;
                self.headers.text_meta = Some(decoded.header);
                self.text_meta = decoded.records;
                Ok(decoded.trailing)
            }
            TableKind::TextStore => {
                let decoded = decode_text_store_with(bytes, options.encoding)?;
                self.headers.text_store = Some(decoded.header);
                self.texts = decoded.records;
                self.text_index = OnceCell::new();
                Ok(decoded.trailing)
            }
            TableKind::Project => {
                self.project = Some(decode_project_file_with(bytes, options.encoding)?);
                Ok(0)
            }
        }
    }

    #[inline]
    pub fn headers(&self) -> &TableHeaders {
        &self.headers
    }

    #[inline]
    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    #[inline]
    pub fn vertex_offsets(&self) -> &[VertexOffset] {
        &self.vertex_offsets
    }

    #[inline]
    pub fn polylines(&self) -> &[PolylineRecord] {
        &self.polylines
    }

    #[inline]
    pub fn poly_layers(&self) -> &[PolyLayerRecord] {
        &self.poly_layers
    }

    #[inline]
    pub fn text_meta(&self) -> &[TextMetaRecord] {
        &self.text_meta
    }

    #[inline]
    pub fn texts(&self) -> &[TextEntry] {
        &self.texts
    }

    #[inline]
    pub fn project(&self) -> Option<&ProjectFile> {
        self.project.as_ref()
    }

    pub fn require_project(&self) -> Result<&ProjectFile, EngineError> {
        self.project
            .as_ref()
            .ok_or(EngineError::MissingTable(TableKind::Project))
    }

    #[inline]
    pub fn addressing(&self) -> VertexAddressing {
        self.addressing
    }

    /// 依次读取多段线引用的偏移值并换算为点坐标。
    ///
    /// 偏移区间被截断到偏移表长度；指向点表之外或无法换算的偏移被跳过并记为异常。
    /// 少于两个顶点的结果仍会返回，由调用方决定是否丢弃。
    pub fn resolve_polyline_vertices(&self, polyline: &PolylineRecord) -> ResolvedPolyline {
        let line_id = polyline.line_id;
        let mut anomalies = Vec::new();

        let run = polyline.offset_run();
        let end = run.end.min(self.vertex_offsets.len());
        let start = run.start.min(end);
        if end - start < run.len() {
            note_anomaly(
                &mut anomalies,
                Anomaly::OffsetRunClamped {
                    line_id,
                    requested: run.len(),
                    available: end - start,
                },
            );
        }

        let mut vertices = Vec::with_capacity(end - start);
        for offset in &self.vertex_offsets[start..end] {
            let index = match self.addressing {
                VertexAddressing::RecordIndex => Some(offset.raw() as usize),
                VertexAddressing::ByteOffset => point_index_for_byte_offset(offset.raw()),
            };
            let Some(index) = index else {
                note_anomaly(
                    &mut anomalies,
                    Anomaly::MisalignedOffset {
                        line_id,
                        raw: offset.raw(),
                    },
                );
                continue;
            };
            match self.points.get(index) {
                Some(point) => vertices.push(point.position()),
                None => note_anomaly(
                    &mut anomalies,
                    Anomaly::PointOutOfRange {
                        line_id,
                        point_index: index,
                        points: self.points.len(),
                    },
                ),
            }
        }

        if vertices.len() < 2 {
            note_anomaly(
                &mut anomalies,
                Anomaly::DegeneratePolyline {
                    line_id,
                    vertices: vertices.len(),
                },
            );
        }

        ResolvedPolyline {
            line_id,
            vertices,
            anomalies,
        }
    }

    pub fn layer_resolution(&self, polyline: &PolylineRecord) -> LayerResolution {
        match self.poly_layers.get(polyline.layer_row as usize) {
            Some(row) => LayerResolution::Mapped(row.layer),
            None => {
                debug!(
                    line_id = polyline.line_id,
                    layer_row = polyline.layer_row,
                    rows = self.poly_layers.len(),
                    "图层行超出范围，使用图层 0"
                );
                LayerResolution::Fallback
            }
        }
    }

    /// 多段线的显示图层；`layer_row` 越界时为 0。
    #[inline]
    pub fn resolve_polyline_layer(&self, polyline: &PolylineRecord) -> u8 {
        self.layer_resolution(polyline).layer()
    }

    /// 偏移到字符串下标的索引，首次调用时构建，此后直接复用。
    pub fn text_index(&self) -> &HashMap<u32, usize> {
        self.text_index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.texts.len());
            for (position, entry) in self.texts.iter().enumerate() {
                index.insert(entry.offset, position);
            }
            debug!(entries = index.len(), "已构建文字偏移索引");
            index
        })
    }

    #[inline]
    pub fn is_text_index_built(&self) -> bool {
        self.text_index.get().is_some()
    }

    /// 按字符串块相对偏移查找文字，找不到时输出警告并返回 `None`。
    pub fn resolve_text(&self, offset: u32) -> Option<&str> {
        let position = self.text_index().get(&offset).copied();
        let text = position.and_then(|position| self.texts.get(position));
        if text.is_none() {
            warn!(offset, texts = self.texts.len(), "文字存储中没有该偏移");
        }
        text.map(|entry| entry.text.as_str())
    }

    /// 项目文件中对应显示图层的样式。
    pub fn layer_style(&self, display_layer: u8) -> Option<&LayerStyle> {
        self.project.as_ref()?.layer(display_layer)
    }

    /// 导出用图层名：`MapSys-<图层号>`，图层有标题时追加 `-<标题>`。
    pub fn layer_name(&self, display_layer: u8) -> String {
        match self.layer_style(display_layer) {
            Some(style) if !style.title.is_empty() => {
                format!("{LAYER_PREFIX}-{display_layer}-{}", style.title)
            }
            _ => format!("{LAYER_PREFIX}-{display_layer}"),
        }
    }

    /// 按文件顺序解析全部多段线，附带各自的显示图层。
    pub fn resolved_polylines(
        &self,
    ) -> impl Iterator<Item = (&PolylineRecord, u8, ResolvedPolyline)> + '_ {
        self.polylines.iter().map(|polyline| {
            (
                polyline,
                self.resolve_polyline_layer(polyline),
                self.resolve_polyline_vertices(polyline),
            )
        })
    }

    /// 能找到字符串的文字标注；找不到的会被跳过。
    pub fn labels(&self) -> impl Iterator<Item = Label<'_>> + '_ {
        self.text_meta.iter().filter_map(|meta| {
            match self.resolve_text(meta.offset) {
                Some(text) => Some(Label { meta, text }),
                None => {
                    let anomaly = Anomaly::TextNotFound {
                        text_id: meta.text_id,
                        offset: meta.offset,
                    };
                    debug!(%anomaly, "跳过文字标注");
                    None
                }
            }
        })
    }

    /// 所有点的范围；没有点时返回 `None`。
    pub fn extents(&self) -> Option<Bounds2D> {
        let bounds: Bounds2D = self.points.iter().map(PointRecord::position).collect();
        (!bounds.is_empty()).then_some(bounds)
    }
}

fn note_anomaly(anomalies: &mut Vec<Anomaly>, anomaly: Anomaly) {
    warn!(%anomaly, "解析过程中发现结构异常");
    anomalies.push(anomaly);
}

/// 直接由记录构造 `Content`，用于导出工具和测试。
#[derive(Debug, Default)]
pub struct ContentBuilder {
    content: Content,
}

impl ContentBuilder {
    pub fn points(mut self, points: Vec<PointRecord>) -> Self {
        self.content.points = points;
        self
    }

    pub fn vertex_offsets<I>(mut self, offsets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VertexOffset>,
    {
        self.content.vertex_offsets = offsets.into_iter().map(Into::into).collect();
        self
    }

    pub fn polylines(mut self, polylines: Vec<PolylineRecord>) -> Self {
        self.content.polylines = polylines;
        self
    }

    pub fn poly_layers(mut self, rows: Vec<PolyLayerRecord>) -> Self {
        self.content.poly_layers = rows;
        self
    }

    pub fn text_meta(mut self, records: Vec<TextMetaRecord>) -> Self {
        self.content.text_meta = records;
        self
    }

    pub fn texts(mut self, texts: Vec<TextEntry>) -> Self {
        self.content.texts = texts;
        self
    }

    pub fn project(mut self, project: ProjectFile) -> Self {
        self.content.project = Some(project);
        self
    }

    pub fn addressing(mut self, addressing: VertexAddressing) -> Self {
        self.content.addressing = addressing;
        self
    }

    pub fn build(self) -> Content {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use mapsys_io::points::byte_offset_for_point_index;
    use mapsys_io::{
        encode_point_table, encode_poly_layers, encode_polyline_table, encode_text_meta,
        encode_text_store, encode_vertex_offsets,
    };

    fn point(east: f64, north: f64) -> PointRecord {
        PointRecord {
            east,
            north,
            ..PointRecord::default()
        }
    }

    fn polyline(start: u32, count: u16, layer_row: u32) -> PolylineRecord {
        PolylineRecord {
            line_id: 1,
            vertex_offset_index: start,
            vertex_count: count,
            layer_row,
            ..PolylineRecord::default()
        }
    }

    fn layer_row(layer: u8) -> PolyLayerRecord {
        PolyLayerRecord {
            layer,
            ..PolyLayerRecord::default()
        }
    }

    fn entry(offset: u32, text: &str) -> TextEntry {
        TextEntry {
            offset,
            text: text.to_string(),
        }
    }

    #[test]
    fn two_point_polyline_resolves_vertices_and_layer() {
        let content = Content::builder()
            .points(vec![point(0.0, 0.0), point(1.0, 0.0)])
            .vertex_offsets([0u32, 1])
            .poly_layers(vec![layer_row(7)])
            .build();
        let line = polyline(0, 2, 0);

        let resolved = content.resolve_polyline_vertices(&line);
        assert_eq!(
            resolved.vertices,
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]
        );
        assert!(resolved.anomalies.is_empty());
        assert!(!resolved.is_degenerate());
        assert_eq!(content.resolve_polyline_layer(&line), 7);
        assert_eq!(content.layer_resolution(&line), LayerResolution::Mapped(7));
    }

    #[test]
    fn offset_run_is_clamped_to_table_length() {
        let content = Content::builder()
            .points(vec![point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)])
            .vertex_offsets([0u32, 1, 2])
            .build();

        let resolved = content.resolve_polyline_vertices(&polyline(1, 10, 0));
        assert_eq!(resolved.vertices.len(), 2);
        assert_eq!(
            resolved.anomalies,
            vec![Anomaly::OffsetRunClamped {
                line_id: 1,
                requested: 10,
                available: 2,
            }]
        );

        let resolved = content.resolve_polyline_vertices(&polyline(u32::MAX, u16::MAX, 0));
        assert!(resolved.vertices.is_empty());
        assert!(resolved.is_degenerate());
    }

    #[test]
    fn out_of_range_points_are_skipped() {
        let content = Content::builder()
            .points(vec![point(0.0, 0.0), point(5.0, 5.0)])
            .vertex_offsets([0u32, 99, 1])
            .build();
        let resolved = content.resolve_polyline_vertices(&polyline(0, 3, 0));
        assert_eq!(
            resolved.vertices,
            vec![Point2::new(0.0, 0.0), Point2::new(5.0, 5.0)]
        );
        assert_eq!(
            resolved.anomalies,
            vec![Anomaly::PointOutOfRange {
                line_id: 1,
                point_index: 99,
                points: 2,
            }]
        );
    }

    #[test]
    fn single_vertex_polyline_is_degenerate_but_returned() {
        let content = Content::builder()
            .points(vec![point(3.0, 4.0)])
            .vertex_offsets([0u32])
            .build();
        let resolved = content.resolve_polyline_vertices(&polyline(0, 1, 0));
        assert_eq!(resolved.vertices, vec![Point2::new(3.0, 4.0)]);
        assert!(resolved.is_degenerate());
        assert!(matches!(
            resolved.anomalies.as_slice(),
            [Anomaly::DegeneratePolyline { vertices: 1, .. }]
        ));
    }

    #[test]
    fn byte_offset_addressing_translates_and_rejects_misaligned() {
        let content = Content::builder()
            .points(vec![point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0)])
            .vertex_offsets([
                byte_offset_for_point_index(2) as u32,
                byte_offset_for_point_index(0) as u32,
                5,
                31,
            ])
            .addressing(VertexAddressing::ByteOffset)
            .build();
        let resolved = content.resolve_polyline_vertices(&polyline(0, 4, 0));
        assert_eq!(
            resolved.vertices,
            vec![Point2::new(2.0, 0.0), Point2::new(0.0, 0.0)]
        );
        assert_eq!(
            resolved.anomalies,
            vec![
                Anomaly::MisalignedOffset { line_id: 1, raw: 5 },
                Anomaly::MisalignedOffset { line_id: 1, raw: 31 },
            ]
        );
    }

    #[test]
    fn layer_row_outside_table_falls_back_to_zero() {
        let content = Content::builder()
            .poly_layers(vec![layer_row(4), layer_row(9)])
            .build();
        let line = polyline(0, 0, 2);
        assert_eq!(content.resolve_polyline_layer(&line), 0);
        assert!(content.layer_resolution(&line).is_fallback());
        assert_eq!(content.resolve_polyline_layer(&polyline(0, 0, 1)), 9);

        let empty = Content::default();
        assert_eq!(empty.resolve_polyline_layer(&polyline(0, 0, 0)), 0);
    }

    #[test]
    fn mapped_zero_is_distinct_from_fallback() {
        let content = Content::builder().poly_layers(vec![layer_row(0)]).build();
        let resolution = content.layer_resolution(&polyline(0, 0, 0));
        assert_eq!(resolution, LayerResolution::Mapped(0));
        assert!(!resolution.is_fallback());
    }

    #[test]
    fn text_index_is_built_once() {
        let content = Content::builder()
            .texts(vec![entry(0, "hello"), entry(6, "world")])
            .build();
        assert!(!content.is_text_index_built());

        assert_eq!(content.resolve_text(6), Some("world"));
        assert!(content.is_text_index_built());
        let first: *const HashMap<u32, usize> = content.text_index();

        assert_eq!(content.resolve_text(6), Some("world"));
        assert_eq!(content.resolve_text(0), Some("hello"));
        assert_eq!(content.resolve_text(3), None);
        assert!(std::ptr::eq(first, content.text_index()));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn text_miss_is_logged_as_warning() {
        let content = Content::builder().texts(vec![entry(0, "hello")]).build();
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let (hit, miss) = tracing::subscriber::with_default(subscriber, || {
            (content.resolve_text(0), content.resolve_text(42))
        });
        assert_eq!(hit, Some("hello"));
        assert_eq!(miss, None);

        let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("WARN").count(), 1);
        assert!(text.contains("offset=42"));
    }

    #[test]
    fn duplicate_offsets_keep_last_entry() {
        let content = Content::builder()
            .texts(vec![entry(0, "first"), entry(0, "second")])
            .build();
        assert_eq!(content.resolve_text(0), Some("second"));
    }

    #[test]
    fn concurrent_text_lookups_share_one_index() {
        let content = Content::builder()
            .texts((0..64).map(|i| entry(i * 3, &format!("t{i}"))).collect())
            .build();
        let pointers: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|worker| {
                    let content = &content;
                    scope.spawn(move || {
                        assert_eq!(
                            content.resolve_text(worker * 3),
                            Some(format!("t{worker}").as_str())
                        );
                        content.text_index() as *const _ as usize
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });
        assert!(pointers.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn labels_skip_missing_strings() {
        let meta = |text_id, offset| TextMetaRecord {
            text_id,
            offset,
            stored_length: 6,
            ..TextMetaRecord::default()
        };
        let content = Content::builder()
            .texts(vec![entry(0, "hello"), entry(6, "world")])
            .text_meta(vec![meta(1, 6), meta(2, 40), meta(3, 0)])
            .build();
        let labels: Vec<(u32, &str)> = content
            .labels()
            .map(|label| (label.meta.text_id, label.text))
            .collect();
        assert_eq!(labels, vec![(1, "world"), (3, "hello")]);
    }

    #[test]
    fn layer_names_include_titles() {
        let mut project = ProjectFile {
            layers: vec![LayerStyle::default(); 256],
            ..ProjectFile::default()
        };
        project.layers[5].title = "Cladiri".to_string();
        let content = Content::builder().project(project).build();
        assert_eq!(content.layer_name(5), "MapSys-5-Cladiri");
        assert_eq!(content.layer_name(6), "MapSys-6");
        assert_eq!(Content::default().layer_name(5), "MapSys-5");
        assert!(Content::default().require_project().is_err());
    }

    #[test]
    fn extents_cover_all_points() {
        let content = Content::builder()
            .points(vec![point(10.0, -4.0), point(-2.0, 8.0)])
            .build();
        let bounds = content.extents().unwrap();
        assert_eq!(bounds.min(), Point2::new(-2.0, -4.0));
        assert_eq!(bounds.max(), Point2::new(10.0, 8.0));
        assert!(Content::default().extents().is_none());
    }

    #[test]
    fn populate_decodes_available_tables() {
        let points = vec![point(0.0, 0.0), point(1.0, 0.0)];
        let mut point_bytes = encode_point_table(&PointTableHeader::default(), &points);
        point_bytes.extend_from_slice(&[0; 5]);

        let source = MemorySource::new()
            .with(TableKind::Points, point_bytes)
            .with(
                TableKind::VertexOffsets,
                encode_vertex_offsets(
                    &Va50Header::default(),
                    &[VertexOffset(0), VertexOffset(1)],
                ),
            )
            .with(
                TableKind::Polylines,
                encode_polyline_table(&PolylineTableHeader::default(), &[polyline(0, 2, 0)]),
            )
            .with(
                TableKind::PolyLayers,
                encode_poly_layers(&Va50Header::default(), &[layer_row(7)]),
            )
            .with(
                TableKind::TextStore,
                encode_text_store(&Va50Header::default(), &["hello", "world"]),
            )
            // 表头全 0，解码失败
            .with(
                TableKind::TextMeta,
                encode_text_meta(&TextMetaHeader::default(), &[]),
            );

        let (content, report) = Content::populate(&source, &LoadOptions::default());
        assert_eq!(report.missing, vec![TableKind::Project]);
        assert_eq!(report.failed().collect::<Vec<_>>(), vec![TableKind::TextMeta]);
        assert_eq!(
            report.anomalies,
            vec![Anomaly::TrailingBytes {
                table: TableKind::Points,
                bytes: 5,
            }]
        );
        assert!(content.text_meta().is_empty());
        assert!(content.headers().text_meta.is_none());

        let (line, layer, resolved) = content.resolved_polylines().next().unwrap();
        assert_eq!(line.vertex_count, 2);
        assert_eq!(layer, 7);
        assert_eq!(
            resolved.vertices,
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]
        );
        assert_eq!(content.resolve_text(6), Some("world"));
    }

    #[test]
    fn closure_can_act_as_source() {
        let source = |kind: TableKind| match kind {
            TableKind::TextStore => Some(encode_text_store(&Va50Header::default(), &["x"])),
            _ => None,
        };
        let (content, report) = Content::populate(&source, &LoadOptions::default());
        assert_eq!(report.loaded, vec![TableKind::TextStore]);
        assert_eq!(content.resolve_text(0), Some("x"));
    }

    #[test]
    fn content_serializes_without_index() {
        let content = Content::builder()
            .texts(vec![entry(0, "a")])
            .build();
        content.resolve_text(0);
        let json = serde_json::to_value(&content).unwrap();
        assert!(json.get("text_index").is_none());
        assert_eq!(json["texts"][0]["text"], "a");
    }
}
