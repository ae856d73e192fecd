pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示；`x` 为东坐标，`y` 为北坐标。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 轴对齐边界框，用于估算项目/点表范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn width(&self) -> f64 {
            (self.max.x() - self.min.x()).max(0.0)
        }

        #[inline]
        pub fn height(&self) -> f64 {
            (self.max.y() - self.min.y()).max(0.0)
        }
    }

    impl FromIterator<Point2> for Bounds2D {
        fn from_iter<I: IntoIterator<Item = Point2>>(iter: I) -> Self {
            let mut bounds = Bounds2D::empty();
            for point in iter {
                bounds.include_point(point);
            }
            bounds
        }
    }
}

pub mod table {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 一个项目由若干同名（仅扩展名不同）的伴随文件组成，此处列出需要解码的二进制表。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum TableKind {
        Points,
        VertexOffsets,
        Polylines,
        PolyLayers,
        TextMeta,
        TextStore,
        Project,
    }

    impl TableKind {
        pub const ALL: [TableKind; 7] = [
            TableKind::Points,
            TableKind::VertexOffsets,
            TableKind::Polylines,
            TableKind::PolyLayers,
            TableKind::TextMeta,
            TableKind::TextStore,
            TableKind::Project,
        ];

        /// 对应伴随文件的大写扩展名。
        pub fn extension(self) -> &'static str {
            match self {
                TableKind::Points => "NO5",
                TableKind::VertexOffsets => "AS5",
                TableKind::Polylines => "AR5",
                TableKind::PolyLayers => "AL5",
                TableKind::TextMeta => "TE5",
                TableKind::TextStore => "TS5",
                TableKind::Project => "PR5",
            }
        }

        pub fn from_extension(extension: &str) -> Option<Self> {
            let upper = extension.trim_start_matches('.').to_ascii_uppercase();
            TableKind::ALL
                .into_iter()
                .find(|kind| kind.extension() == upper)
        }

        pub fn label(self) -> &'static str {
            match self {
                TableKind::Points => "points",
                TableKind::VertexOffsets => "vertex offsets",
                TableKind::Polylines => "polylines",
                TableKind::PolyLayers => "poly layers",
                TableKind::TextMeta => "text metadata",
                TableKind::TextStore => "text store",
                TableKind::Project => "project",
            }
        }
    }

    impl fmt::Display for TableKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} ({})", self.label(), self.extension())
        }
    }

    /// VA50 家族表头的 4 字节标记。历史版本写入过两种取值，解码时均接受。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub enum Signature {
        #[default]
        Va50,
        Vs50,
    }

    impl Signature {
        pub const fn tag(self) -> [u8; 4] {
            match self {
                Signature::Va50 => *b"VA50",
                Signature::Vs50 => *b"VS50",
            }
        }

        pub fn from_tag(tag: [u8; 4]) -> Option<Self> {
            match &tag {
                b"VA50" => Some(Signature::Va50),
                b"VS50" => Some(Signature::Vs50),
                _ => None,
            }
        }
    }

    /// 顶点偏移表中原始值的解释方式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum VertexAddressing {
        /// 原始值即点表记录序号（现有数据均如此）。
        #[default]
        RecordIndex,
        /// 原始值为点表文件内的字节偏移：表头长度 + 序号 × 记录长度。
        ByteOffset,
    }
}

pub mod records {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;
    use crate::table::Signature;

    /// 文字框标志位。
    pub const FLAG_TEXT_FRAME: u8 = 0x02;
    /// TrueType 字体标志位。
    pub const FLAG_TRUE_TYPE_FONT: u8 = 0x20;

    /// 偏移表、图层行表与文字存储共用的表头：标记 + 4 个保留字 + 1 个填充字节。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Va50Header {
        pub signature: Signature,
        pub reserved: [u32; 4],
        pub pad: u8,
    }

    /// 点表表头：标记 + 6 个保留字 + 1 个填充字节。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct PointTableHeader {
        pub signature: Signature,
        pub reserved: [u32; 6],
        pub pad: u8,
    }

    /// 多段线索引表头，后跟 9 字节文件级填充（原样保留）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct PolylineTableHeader {
        pub signature: Signature,
        pub reserved: [u32; 4],
        pub filler: [u8; 9],
    }

    /// 文字元数据表头：标记 + 1 个未知字节 + 6 个保留字。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct TextMetaHeader {
        pub signature: Signature,
        pub unknown: u8,
        pub reserved: [u32; 6],
    }

    impl TextMetaHeader {
        /// 未知字节与全部保留字均为 0 的表头视为无效。
        pub fn is_blank(&self) -> bool {
            self.unknown == 0 && self.reserved.iter().all(|word| *word == 0)
        }
    }

    /// 点表中的一个坐标点。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct PointRecord {
        /// 0 为折点，16 为节点，5 为特殊点。
        pub kind: u8,
        /// 数据库 ID。
        pub id: u32,
        /// 从 0 开始的图层序号。
        pub layer: u8,
        /// 用户可编辑的点号。
        pub number: u32,
        pub east: f64,
        pub north: f64,
        pub elevation: f32,
        pub uniq: u32,
        /// 引用该点的线数量，孤立点为 0。
        pub connections: u8,
    }

    impl PointRecord {
        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.east, self.north)
        }
    }

    /// 顶点偏移表中的原始 32 位值，语义由聚合层决定。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct VertexOffset(pub u32);

    impl VertexOffset {
        #[inline]
        pub fn raw(self) -> u32 {
            self.0
        }
    }

    impl From<u32> for VertexOffset {
        fn from(value: u32) -> Self {
            Self(value)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct PolylineRecord {
        /// 小范围分类字节（0、1）。
        pub category: u8,
        pub line_id: u32,
        pub line_number: u32,
        /// 已知文件中恒为 0。
        pub reserved: u32,
        /// 在顶点偏移表中的起始下标。
        pub vertex_offset_index: u32,
        pub vertex_count: u16,
        /// 在图层行表中的下标。
        pub layer_row: u32,
        pub layer_count: u8,
        /// 大多唯一的标记值。
        pub tag: u32,
        /// 小范围分类字节（0、1、2）。
        pub kind: u8,
    }

    impl PolylineRecord {
        /// 未经截断的偏移表下标区间。
        pub fn offset_run(&self) -> std::ops::Range<usize> {
            let start = self.vertex_offset_index as usize;
            start..start.saturating_add(usize::from(self.vertex_count))
        }
    }

    /// 图层行表记录，其位置即多段线的 `layer_row`。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct PolyLayerRecord {
        /// 显示图层号。
        pub layer: u8,
        /// 观察到的取值为 0、4、8。
        pub style: u8,
        /// 观察到的取值为 0、1。
        pub flag: u8,
    }

    /// 一条文字标注的摆放与样式，不含字符串本身。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct TextMetaRecord {
        /// 非 0 时可能表示已删除。
        pub deleted: u8,
        pub text_id: u32,
        pub layer: u8,
        pub font: u8,
        pub flags: u8,
        pub height: f32,
        pub rotation: f32,
        pub east: f64,
        pub north: f64,
        pub align_east: f32,
        pub align_north: f32,
        pub elevation: f32,
        /// 相对文字存储字符串块起点的字节偏移。
        pub offset: u32,
        /// 含结尾 NUL 的存储长度。
        pub stored_length: u8,
    }

    impl TextMetaRecord {
        /// 去掉结尾 NUL 后的长度，最小为 0。
        #[inline]
        pub fn true_length(&self) -> usize {
            usize::from(self.stored_length.saturating_sub(1))
        }

        /// 掩码中的每一位都被置位时返回 `true`。
        #[inline]
        pub fn has_flag(&self, mask: u8) -> bool {
            self.flags & mask == mask
        }

        #[inline]
        pub fn is_deleted(&self) -> bool {
            self.deleted != 0
        }

        /// 给定首个字符串在文字存储文件中的绝对位置，换算本记录字符串的绝对位置。
        #[inline]
        pub fn absolute_text_offset(&self, first_text_absolute: u64) -> u64 {
            first_text_absolute + u64::from(self.offset)
        }

        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.east, self.north)
        }
    }

    /// 文字存储中的一个字符串。
    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct TextEntry {
        /// 相对字符串块起点的偏移，与 `TextMetaRecord::offset` 对应。
        pub offset: u32,
        pub text: String,
    }
}

pub mod project {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    pub const LAYER_COUNT: usize = 256;
    pub const LAYER_ATTRIBUTE_COUNT: usize = 9;
    pub const FONT_COUNT: usize = 20;
    pub const PROJECT_SIGNATURE: &[u8; 6] = b"MapSys";

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct ProjectHeader {
        pub signature: [u8; 6],
        pub zero: u8,
        pub unk_1: [u8; 3],
        pub file_path: String,
        pub dir_path: String,
        pub unk_2: [u16; 3],
        pub unk_3: [u8; 6],
        /// 观察值约为 0.001。
        pub scale: f64,
        /// 观察值为 500000（投影假东）。
        pub false_east: f64,
        /// 观察值为 500000（投影假北）。
        pub false_north: f64,
        pub reserved_a: f64,
        pub reserved_b: f64,
        pub ff_pad: u8,
        pub east_min: f64,
        pub east_max: f64,
        pub north_min: f64,
        pub north_max: f64,
        pub two: u16,
        /// 9 个含义未知的 6 字节块。
        pub reserved_blocks: [[u8; 6]; 9],
        pub trailing_pad: u8,
    }

    /// 图层样式中的一组子属性，每个图层固定 9 组。
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct LayerAttribute {
        pub height: f32,
        pub opaque_a: [u8; 3],
        pub scale: u8,
        pub opaque_b: [u8; 3],
        pub color: u8,
        pub content: u8,
        pub dx: f32,
        pub dy: f32,
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct LayerStyle {
        pub lead: [u8; 4],
        pub title: String,
        pub opaque_a: [u8; 12],
        pub color: u8,
        /// 线宽，取值 0..=255。
        pub weight: u8,
        /// 81 字节不透明数据。
        pub opaque_b: Vec<u8>,
        /// 固定 9 组。
        pub attributes: Vec<LayerAttribute>,
    }

    /// 紧随 256 个图层之后的辅助记录。
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct AfterLayerRecord {
        pub lead: u32,
        pub zero_two: u16,
        pub name: String,
        pub terminator: u8,
        pub reserved: [u8; 2],
        pub has_value_1: u8,
        pub has_value_2: u8,
        pub opaque: [u8; 24],
    }

    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct FontEntry {
        pub name: String,
        /// 12 字节名称 + 结尾 NUL 的原始内容。
        pub raw: [u8; 13],
    }

    /// 完整解码的项目文件（PR5）。
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct ProjectFile {
        pub header: ProjectHeader,
        /// 固定 256 项，与实际使用的图层数量无关。
        pub layers: Vec<LayerStyle>,
        /// 固定 256 项。
        pub after_layers: Vec<AfterLayerRecord>,
        pub trailer_lead: [u8; 4],
        /// 256 字节字符表。
        pub characters: Vec<u8>,
        /// 256 字节，观察值全部为 1。
        pub ones: Vec<u8>,
        /// 固定 20 项。
        pub fonts: Vec<FontEntry>,
        pub trailer_value_a: u16,
        pub trailer_value_b: u16,
        pub trailer_pad: [u8; 2],
        /// 关联数据库文件的路径。
        pub database_path: String,
        /// 256 字节，观察值全部为 0。
        pub tail: Vec<u8>,
    }

    impl ProjectFile {
        #[inline]
        pub fn layer(&self, index: u8) -> Option<&LayerStyle> {
            self.layers.get(usize::from(index))
        }

        /// 表头中记录的项目范围。
        pub fn bounds(&self) -> Bounds2D {
            let header = &self.header;
            Bounds2D::new(
                Point2::new(header.east_min, header.north_min),
                Point2::new(header.east_max, header.north_max),
            )
        }

        /// 标题非空的图层及其序号。
        pub fn titled_layers(&self) -> impl Iterator<Item = (usize, &LayerStyle)> + '_ {
            self.layers
                .iter()
                .enumerate()
                .filter(|(_, layer)| !layer.title.is_empty())
        }
    }
}
