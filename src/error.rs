use std::path::PathBuf;

/// 木の構築（隣接表・ノード木）で発生するエラー
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// 上限 N が 0 以下
    #[error("cannot create tree with integers zero or lower (got {limit})")]
    InvalidArgument { limit: i64 },
    /// 隣接表に存在すべき値が見つからない（GraphBuilder と TreeModel の不整合）
    #[error("invalid data generated: value {value} is missing from the adjacency map")]
    InternalInconsistency { value: u64 },
    /// レイアウト定数が範囲外
    #[error("invalid layout option {name}: {value}")]
    InvalidLayout { name: &'static str, value: i64 },
    /// 3v+1 が u64 を超えた
    #[error("collatz step overflowed u64 at value {value}")]
    StepOverflow { value: u64 },
}

/// 出力（SVG / ラスタ画像）で発生するエラー
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unsupported output format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate {width}x{height} pixmap for raster rendering")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("JPG rendering requires an opaque background color (e.g. white)")]
    JpegOpaqueBackgroundRequired,
    #[error("invalid {name}: {value}")]
    InvalidOption { name: &'static str, value: String },
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("invalid background color: {0}")]
    Background(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
