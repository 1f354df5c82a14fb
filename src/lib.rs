//! 逆コラッツ木の構築とレイアウト
//!
//! [1, N) の全整数についてコラッツ写像 (偶数: v/2, 奇数: 3v+1) を 1 に到達するまで辿り、
//! 1 を根とする木にまとめる。木は2パス（幅の後行順計算 → 座標の先行順割り当て）で配置し、
//! ラベルと接続線の描画命令として Renderer に渡す。

pub mod draw;
pub mod error;
pub mod graph;
pub mod layout;
pub mod render;
pub mod stats;
pub mod tree;

pub use draw::{emit, DrawCommand, Recorder, Renderer};
pub use error::{RenderError, TreeError};
pub use graph::{build_graph, collatz_step, AdjacencyMap};
pub use layout::{decimal_digits, layout_tree, LayoutExtent, LayoutOptions, Point};
pub use render::{render_svg, write_image, Canvas, OutputFormat, RenderOptions, SvgRenderer};
pub use stats::TreeStats;
pub use tree::{build_tree, TreeNode};

/// 隣接表の構築 → 木の構築 → レイアウトまでをまとめて行う。
pub fn build_layout(
    limit: i64,
    options: &LayoutOptions,
) -> Result<(TreeNode, LayoutExtent), TreeError> {
    options.validate()?;
    let map = build_graph(limit)?;
    let mut root = build_tree(1, &map)?;
    let extent = layout_tree(&mut root, options);
    Ok((root, extent))
}
