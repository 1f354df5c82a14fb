use crate::layout::{LayoutOptions, Point};
use crate::tree::TreeNode;

/// 描画先。座標はレイアウト座標（根が原点、上方向が負）のまま渡される。
pub trait Renderer {
    /// position を水平方向の中心としてラベルを描く
    fn draw_text(&mut self, position: Point, label: &str);
    /// 親子間の接続線を描く
    fn draw_line(&mut self, start: Point, end: Point);
}

/// 描画命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Text { position: Point, label: String },
    Line { start: Point, end: Point },
}

/// 描画命令をそのまま記録する Renderer
#[derive(Debug, Default)]
pub struct Recorder {
    pub commands: Vec<DrawCommand>,
}

impl Renderer for Recorder {
    fn draw_text(&mut self, position: Point, label: &str) {
        self.commands.push(DrawCommand::Text {
            position,
            label: label.to_string(),
        });
    }

    fn draw_line(&mut self, start: Point, end: Point) {
        self.commands.push(DrawCommand::Line { start, end });
    }
}

/// 配置済みの木を先行順に辿り、各ノードのラベルと親への接続線を描く。
///
/// 線の両端はラベルに重ならないよう、親側を parent_clearance だけ子の方へ、
/// 子側を child_clearance だけ親の方へずらす。
pub fn emit<R: Renderer + ?Sized>(root: &TreeNode, options: &LayoutOptions, renderer: &mut R) {
    // (ノード, 親) の明示的スタック。子は逆順に積んで列の順に取り出す
    let mut stack: Vec<(&TreeNode, Option<&TreeNode>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        let position = node.position();
        renderer.draw_text(position, &node.value().to_string());

        if let Some(parent) = parent {
            let start = parent.position().offset(0, -options.parent_clearance);
            let end = position.offset(0, options.child_clearance);
            renderer.draw_line(start, end);
        }

        stack.extend(node.children().iter().rev().map(|child| (child, Some(node))));
    }
}
