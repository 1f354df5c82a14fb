use collatz_tree::*;
use eframe::egui;
use egui_plot::{Bar, BarChart, Plot};
use std::time::Instant;
use tracing::{info, warn};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stdout()))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 750.0])
            .with_title("Collatz Tree"),
        ..Default::default()
    };
    eframe::run_native(
        "collatz-tree",
        options,
        Box::new(|cc| {
            setup_japanese_font(&cc.egui_ctx);
            Ok(Box::new(TreeApp::default()))
        }),
    )
}

fn setup_japanese_font(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    let font_paths = [
        "C:\\Windows\\Fonts\\YuGothR.ttc",
        "C:\\Windows\\Fonts\\meiryo.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    ];
    for path in &font_paths {
        if let Ok(data) = std::fs::read(path) {
            fonts
                .font_data
                .insert("japanese".to_owned(), egui::FontData::from_owned(data));
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .push("japanese".to_owned());
            break;
        }
    }
    ctx.set_fonts(fonts);
}

/// 1回分の計算結果（構築 → レイアウト済み）
struct Built {
    root: TreeNode,
    canvas: Canvas,
    stats: TreeStats,
    elapsed_ms: f64,
}

struct TreeApp {
    n_input: String,
    layout: LayoutOptions,
    padding: i64,
    built: Option<Built>,
    error: Option<String>,
}

impl Default for TreeApp {
    fn default() -> Self {
        Self {
            n_input: "30".to_string(),
            layout: LayoutOptions::default(),
            padding: RenderOptions::default().padding,
            built: None,
            error: None,
        }
    }
}

/// egui の Painter に描く Renderer。座標は Canvas で画像座標に移してから origin に足す。
struct PainterRenderer<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    canvas: Canvas,
}

impl PainterRenderer<'_> {
    fn to_screen(&self, p: Point) -> egui::Pos2 {
        let p = self.canvas.translate(p);
        self.origin + egui::vec2(p.x as f32, p.y as f32)
    }
}

impl Renderer for PainterRenderer<'_> {
    fn draw_text(&mut self, position: Point, label: &str) {
        let pos = self.to_screen(position);
        // 画面外は描かない
        if !self.painter.clip_rect().expand(40.0).contains(pos) {
            return;
        }
        self.painter.text(
            pos,
            egui::Align2::CENTER_BOTTOM,
            label,
            egui::FontId::proportional(12.0),
            egui::Color32::BLACK,
        );
    }

    fn draw_line(&mut self, start: Point, end: Point) {
        let (a, b) = (self.to_screen(start), self.to_screen(end));
        if !self.painter.clip_rect().intersects(egui::Rect::from_two_pos(a, b)) {
            return;
        }
        self.painter
            .line_segment([a, b], egui::Stroke::new(2.0, egui::Color32::BLACK));
    }
}

impl eframe::App for TreeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Collatz Tree");
                ui.separator();
                ui.label("N =");
                let resp =
                    ui.add(egui::TextEdit::singleline(&mut self.n_input).desired_width(80.0));
                let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.checkbox(&mut self.layout.parallel, "並列幅計算");
                if ui.button("生成").clicked() || enter {
                    self.rebuild();
                }
                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::from_rgb(220, 50, 50), err);
                }
            });
        });

        if let Some(built) = &self.built {
            egui::SidePanel::right("stats_panel").min_width(260.0).show(ctx, |ui| {
                Self::draw_stats(ui, built);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(built) = &self.built else {
                ui.label("N を入力して「生成」を押してください");
                return;
            };
            egui::ScrollArea::both().show(ui, |ui| {
                let size = egui::vec2(built.canvas.width as f32, built.canvas.height as f32);
                let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
                painter.rect_filled(response.rect, 0.0, egui::Color32::WHITE);
                let mut renderer = PainterRenderer {
                    painter: &painter,
                    origin: response.rect.min,
                    canvas: built.canvas,
                };
                emit(&built.root, &self.layout, &mut renderer);
            });
        });
    }
}

impl TreeApp {
    fn rebuild(&mut self) {
        let limit = match self.n_input.trim().parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                self.error = Some(format!("数値を解析できません: {}", self.n_input.trim()));
                return;
            }
        };

        let timer = Instant::now();
        match build_layout(limit, &self.layout) {
            Ok((root, extent)) => {
                let canvas = Canvas::new(root.width(), &extent, self.padding);
                let stats = TreeStats::collect(&root);
                let elapsed_ms = timer.elapsed().as_secs_f64() * 1000.0;
                info!(limit, nodes = stats.node_count, elapsed_ms, "tree built");
                self.built = Some(Built { root, canvas, stats, elapsed_ms });
                self.error = None;
            }
            Err(e) => {
                warn!("{e}");
                self.error = Some(e.to_string());
            }
        }
    }

    fn draw_stats(ui: &mut egui::Ui, built: &Built) {
        let s = &built.stats;
        egui::Grid::new("stats_grid").striped(true).show(ui, |ui| {
            ui.label("ノード数");
            ui.label(s.node_count.to_string());
            ui.end_row();
            ui.label("葉の数");
            ui.label(s.leaf_count.to_string());
            ui.end_row();
            ui.label("最大深さ");
            ui.label(format!("{} (n={})", s.max_depth, s.deepest_value));
            ui.end_row();
            ui.label("最大分岐数");
            ui.label(s.max_branching.to_string());
            ui.end_row();
            ui.label("画像サイズ");
            ui.label(format!("{} x {}", built.canvas.width, built.canvas.height));
            ui.end_row();
            ui.label("計算時間");
            ui.label(format!("{:.1} ms", built.elapsed_ms));
            ui.end_row();
        });

        ui.add_space(8.0);
        ui.label("深さ別ノード数");
        let bars: Vec<Bar> = s
            .depth_histogram
            .iter()
            .enumerate()
            .map(|(d, &c)| Bar::new(d as f64, c as f64))
            .collect();
        Plot::new("depth_hist")
            .height(180.0)
            .allow_drag(false)
            .allow_zoom(false)
            .x_axis_label("深さ")
            .y_axis_label("ノード数")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).width(0.8));
            });
    }
}
