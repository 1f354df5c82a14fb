use collatz_tree::*;

fn laid_out(n: i64) -> (TreeNode, LayoutExtent, LayoutOptions) {
    let options = LayoutOptions::default();
    let (root, extent) = build_layout(n, &options).unwrap();
    (root, extent, options)
}

#[test]
fn test_width_at_least_text_width() {
    let (root, _, options) = laid_out(500);
    for node in root.iter_preorder() {
        let text = node.text_width(&options);
        assert!(node.width() >= text, "width < text width for {}", node.value());
        if node.is_leaf() {
            assert_eq!(node.width(), text, "leaf {} width", node.value());
        }
    }
}

#[test]
fn test_width_rule() {
    let (root, _, options) = laid_out(500);
    for node in root.iter_preorder().filter(|n| !n.is_leaf()) {
        let k = node.children().len() as i64;
        let sum: i64 = node.children().iter().map(TreeNode::width).sum();
        let expected = ((k - 1) * options.spacing + sum).max(node.text_width(&options));
        assert_eq!(node.width(), expected);
    }
}

#[test]
fn test_root_at_origin() {
    for n in [1, 2, 3, 50, 1000] {
        let (root, _, _) = laid_out(n);
        assert_eq!(root.position(), Point::ORIGIN);
    }
}

#[test]
fn test_siblings_do_not_overlap() {
    let (root, _, options) = laid_out(1000);
    for node in root.iter_preorder() {
        for pair in node.children().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.position().x + a.width() / 2 + options.spacing
                    <= b.position().x - b.width() / 2,
                "children {} and {} of {} overlap",
                a.value(), b.value(), node.value()
            );
        }
    }
}

#[test]
fn test_children_one_level_above() {
    let (root, _, options) = laid_out(300);
    let step = options.spacing + options.node_height;
    for node in root.iter_preorder() {
        for child in node.children() {
            assert_eq!(child.position().y, node.position().y - step);
        }
    }
}

#[test]
fn test_extent_is_bounding_box() {
    let (root, extent, _) = laid_out(1000);
    let max_x = root.iter_preorder().map(|n| n.position().x).max().unwrap();
    let min_y = root.iter_preorder().map(|n| n.position().y).min().unwrap();
    assert_eq!(extent, LayoutExtent { max_x, min_y });
}

#[test]
fn test_subtree_span_within_parent() {
    // 子の部分木の水平範囲は親の [x - w/2, x + w/2] に収まる（切り捨ての1px を許容）
    let (root, _, _) = laid_out(1000);
    for node in root.iter_preorder() {
        let left = node.position().x - node.width() / 2;
        let right = node.position().x + node.width() / 2;
        for child in node.children() {
            assert!(child.position().x - child.width() / 2 >= left - 1);
            assert!(child.position().x + child.width() / 2 <= right + 1);
        }
    }
}

#[test]
fn test_deterministic_coordinates() {
    let (a, ea, _) = laid_out(3000);
    let (b, eb, _) = laid_out(3000);
    assert_eq!(a, b);
    assert_eq!(ea, eb);
}

#[test]
fn test_parallel_widths_match() {
    let sequential = LayoutOptions::default();
    let parallel = LayoutOptions { parallel: true, ..LayoutOptions::default() };
    let (a, ea) = build_layout(5000, &sequential).unwrap();
    let (b, eb) = build_layout(5000, &parallel).unwrap();
    assert_eq!(a, b);
    assert_eq!(ea, eb);
}

#[test]
fn test_emit_counts() {
    let (root, _, options) = laid_out(100);
    let mut recorder = Recorder::default();
    emit(&root, &options, &mut recorder);

    let texts = recorder
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Text { .. }))
        .count();
    let lines = recorder.commands.len() - texts;
    assert_eq!(texts, root.subtree_size());
    assert_eq!(lines, root.subtree_size() - 1);
}

#[test]
fn test_emit_lines_follow_clearance() {
    let (root, _, options) = laid_out(50);
    let mut recorder = Recorder::default();
    emit(&root, &options, &mut recorder);

    for cmd in &recorder.commands {
        if let DrawCommand::Line { start, end } = cmd {
            // 親の上端から子の下端へ。間隔 30 - 15 - 8 = 7
            assert_eq!(
                start.y - end.y,
                options.spacing + options.node_height
                    - options.parent_clearance
                    - options.child_clearance
            );
        }
    }
}
