//! 出力: 配置済みの木を SVG 文書にし、必要なら resvg でラスタ化する。

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::draw::{self, Renderer};
use crate::error::RenderError;
use crate::layout::{LayoutExtent, LayoutOptions, Point};
use crate::tree::TreeNode;

pub type Result<T> = std::result::Result<T, RenderError>;

/// 描画スタイルと画像サイズの設定
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// 木の周囲の余白 (px)
    pub padding: i64,
    pub font_family: String,
    pub font_size: f32,
    pub stroke_width: f32,
    pub background: String,
    /// ラスタ化の倍率
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            padding: 80,
            font_family: "Work Sans Light, Work Sans, sans-serif".to_string(),
            font_size: 13.0,
            stroke_width: 2.0,
            background: "white".to_string(),
            scale: 1.0,
            jpeg_quality: 90,
        }
    }
}

impl RenderOptions {
    /// 背景色を解釈する。SVG / PNG / JPG で同じ値を受け付けるよう、全形式でこれを通す。
    pub fn background_color(&self) -> Result<tiny_skia::Color> {
        parse_color(&self.background)
            .ok_or_else(|| RenderError::Background(self.background.clone()))
    }

    /// 計算を始める前に、出力形式に対して設定が妥当か確かめる
    pub fn validate_for(&self, format: OutputFormat) -> Result<()> {
        if self.padding < 0 {
            return Err(RenderError::InvalidOption {
                name: "padding",
                value: self.padding.to_string(),
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RenderError::InvalidOption {
                name: "scale",
                value: self.scale.to_string(),
            });
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(RenderError::InvalidOption {
                name: "font-size",
                value: self.font_size.to_string(),
            });
        }
        let background = self.background_color()?;
        if format == OutputFormat::Jpeg && background.alpha() != 1.0 {
            return Err(RenderError::JpegOpaqueBackgroundRequired);
        }
        Ok(())
    }
}

/// 出力形式（拡張子で決める）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(OutputFormat::Svg),
            Some("png") => Ok(OutputFormat::Png),
            Some("jpg") | Some("jpeg") => Ok(OutputFormat::Jpeg),
            _ => Err(RenderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// 画像サイズと、レイアウト座標 → 画像座標の平行移動量。
///
/// 幅 = 根の部分木幅 + 2×余白、高さ = 2×余白 − min_y。
/// 原点（根）は画像の下端から余白分だけ上、水平方向の中央に来る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
    pub offset: Point,
}

impl Canvas {
    pub fn new(root_width: i64, extent: &LayoutExtent, padding: i64) -> Self {
        let width = root_width + padding * 2;
        let height = padding * 2 - extent.min_y;
        Canvas {
            width,
            height,
            offset: Point::new(width / 2, height - padding),
        }
    }

    #[inline]
    pub fn translate(&self, p: Point) -> Point {
        p.offset(self.offset.x, self.offset.y)
    }
}

/// SVG 文書を組み立てる Renderer。ラベルと線は別グループに先行順で積む。
pub struct SvgRenderer<'a> {
    canvas: Canvas,
    options: &'a RenderOptions,
    texts: String,
    lines: String,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(canvas: Canvas, options: &'a RenderOptions) -> Self {
        SvgRenderer {
            canvas,
            options,
            texts: String::new(),
            lines: String::new(),
        }
    }

    pub fn finish(self) -> String {
        let Canvas { width, height, .. } = self.canvas;
        let o = self.options;
        let mut out = String::with_capacity(self.texts.len() + self.lines.len() + 512);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        );
        let _ = writeln!(
            out,
            r#"<rect x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
            escape_xml(&o.background)
        );
        let _ = writeln!(
            out,
            r#"<g stroke="black" stroke-width="{}" fill="none">"#,
            o.stroke_width
        );
        out.push_str(&self.lines);
        out.push_str("</g>\n");
        let _ = writeln!(
            out,
            r#"<g font-family="{}" font-size="{}" text-anchor="middle" fill="black">"#,
            escape_xml(&o.font_family),
            o.font_size
        );
        out.push_str(&self.texts);
        out.push_str("</g>\n</svg>\n");
        out
    }
}

impl Renderer for SvgRenderer<'_> {
    fn draw_text(&mut self, position: Point, label: &str) {
        let p = self.canvas.translate(position);
        let _ = writeln!(
            self.texts,
            r#"<text x="{}" y="{}">{}</text>"#,
            p.x,
            p.y,
            escape_xml(label)
        );
    }

    fn draw_line(&mut self, start: Point, end: Point) {
        let s = self.canvas.translate(start);
        let e = self.canvas.translate(end);
        let _ = writeln!(
            self.lines,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
            s.x, s.y, e.x, e.y
        );
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 配置済みの木を SVG 文書にする
pub fn render_svg(
    root: &TreeNode,
    extent: &LayoutExtent,
    layout: &LayoutOptions,
    options: &RenderOptions,
) -> String {
    let canvas = Canvas::new(root.width(), extent, options.padding);
    debug!(width = canvas.width, height = canvas.height, "canvas");
    let mut renderer = SvgRenderer::new(canvas, options);
    draw::emit(root, layout, &mut renderer);
    renderer.finish()
}

fn parse_color(text: &str) -> Option<tiny_skia::Color> {
    let t = text.trim().to_ascii_lowercase();
    match t.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        _ => {}
    }
    let hex = t.strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(tiny_skia::Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(tiny_skia::Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// SVG をラスタ化する
pub fn svg_to_pixmap(svg: &str, options: &RenderOptions) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "sans-serif".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RenderError::SvgParse)?;
    let size = tree.size();
    let width = (size.width() * options.scale).ceil().max(1.0) as u32;
    let height = (size.height() * options.scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::PixmapAlloc { width, height })?;
    pixmap.fill(options.background_color()?);

    let transform = tiny_skia::Transform::from_scale(options.scale, options.scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

pub fn svg_to_png(svg: &str, options: &RenderOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options)?;
    pixmap.encode_png().map_err(|_| RenderError::PngEncode)
}

pub fn svg_to_jpeg(svg: &str, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.background_color()?.alpha() != 1.0 {
        return Err(RenderError::JpegOpaqueBackgroundRequired);
    }
    let pixmap = svg_to_pixmap(svg, options)?;
    let (w, h) = (pixmap.width(), pixmap.height());

    // JPG はアルファなし。不透明な背景で塗り潰し済みなので RGB だけ取り出す
    let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
    for px in pixmap.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
        .map_err(|_| RenderError::JpegEncode)?;
    Ok(out)
}

/// 配置済みの木を path に書き出す。形式は拡張子で決まる。
pub fn write_image(
    path: &Path,
    root: &TreeNode,
    extent: &LayoutExtent,
    layout: &LayoutOptions,
    options: &RenderOptions,
) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    options.validate_for(format)?;
    let svg = render_svg(root, extent, layout, options);
    let bytes = match format {
        OutputFormat::Svg => svg.into_bytes(),
        OutputFormat::Png => svg_to_png(&svg, options)?,
        OutputFormat::Jpeg => svg_to_jpeg(&svg, options)?,
    };
    std::fs::write(path, bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_tree;

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.svg")).unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("a.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("a.jpeg")).unwrap(), OutputFormat::Jpeg);
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.gif")),
            Err(RenderError::UnsupportedFormat { .. })
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_canvas_n3() {
        // 根の幅 8, min_y = -30
        let extent = LayoutExtent { max_x: 0, min_y: -30 };
        let canvas = Canvas::new(8, &extent, 80);
        assert_eq!(canvas.width, 168);
        assert_eq!(canvas.height, 190);
        assert_eq!(canvas.offset, Point::new(84, 110));
        assert_eq!(canvas.translate(Point::new(0, -30)), Point::new(84, 80));
    }

    #[test]
    fn test_svg_contains_labels_and_lines() {
        let layout = LayoutOptions::default();
        let options = RenderOptions::default();
        let mut root = TreeNode::new(1, vec![TreeNode::new(2, vec![])]);
        let extent = layout_tree(&mut root, &layout);

        let svg = render_svg(&root, &extent, &layout, &options);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="168" height="190""#));
        assert!(svg.contains(r#"<text x="84" y="110">1</text>"#));
        assert!(svg.contains(r#"<text x="84" y="80">2</text>"#));
        assert!(svg.contains(r#"<line x1="84" y1="95" x2="84" y2="88"/>"#));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("white"), Some(tiny_skia::Color::WHITE));
        assert_eq!(
            parse_color("#ff0000"),
            Some(tiny_skia::Color::from_rgba8(255, 0, 0, 255))
        );
        assert_eq!(parse_color("#zz0000"), None);
        assert_eq!(parse_color("teal"), None);
    }

    #[test]
    fn test_jpeg_requires_opaque_background() {
        let layout = LayoutOptions::default();
        let options = RenderOptions {
            background: "transparent".to_string(),
            ..RenderOptions::default()
        };
        let mut root = TreeNode::new(1, vec![TreeNode::new(2, vec![])]);
        let extent = layout_tree(&mut root, &layout);
        let svg = render_svg(&root, &extent, &layout, &options);

        assert!(matches!(
            svg_to_jpeg(&svg, &options),
            Err(RenderError::JpegOpaqueBackgroundRequired)
        ));
        assert!(matches!(
            options.validate_for(OutputFormat::Jpeg),
            Err(RenderError::JpegOpaqueBackgroundRequired)
        ));
        // PNG / SVG は透明背景を受け付ける
        assert!(options.validate_for(OutputFormat::Png).is_ok());
        assert!(options.validate_for(OutputFormat::Svg).is_ok());
        assert!(svg_to_png(&svg, &options).is_ok());
    }

    #[test]
    fn test_unknown_background_rejected_for_every_format() {
        let options = RenderOptions {
            background: "teal".to_string(),
            ..RenderOptions::default()
        };
        for format in [OutputFormat::Svg, OutputFormat::Png, OutputFormat::Jpeg] {
            assert!(
                matches!(
                    options.validate_for(format),
                    Err(RenderError::Background(ref b)) if b == "teal"
                ),
                "{:?}",
                format
            );
        }
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        let negative_padding = RenderOptions { padding: -200, ..RenderOptions::default() };
        assert!(matches!(
            negative_padding.validate_for(OutputFormat::Svg),
            Err(RenderError::InvalidOption { name: "padding", .. })
        ));
        let zero_scale = RenderOptions { scale: 0.0, ..RenderOptions::default() };
        assert!(matches!(
            zero_scale.validate_for(OutputFormat::Png),
            Err(RenderError::InvalidOption { name: "scale", .. })
        ));
    }

    #[test]
    fn test_write_image_validates_before_writing() {
        let layout = LayoutOptions::default();
        let options = RenderOptions { padding: -1, ..RenderOptions::default() };
        let mut root = TreeNode::new(1, vec![]);
        let extent = layout_tree(&mut root, &layout);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.svg");

        assert!(write_image(&path, &root, &extent, &layout, &options).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_png_dimensions() {
        let layout = LayoutOptions::default();
        let options = RenderOptions::default();
        let mut root = TreeNode::new(1, vec![TreeNode::new(2, vec![])]);
        let extent = layout_tree(&mut root, &layout);
        let svg = render_svg(&root, &extent, &layout, &options);

        let pixmap = svg_to_pixmap(&svg, &options).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (168, 190));
        let png = svg_to_png(&svg, &options).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
