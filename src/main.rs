use clap::error::ErrorKind;
use clap::Parser;
use collatz_tree::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 逆コラッツ木を描画する
///
/// [1, up-to) の全整数のコラッツ軌道を 1 を根とする木にまとめ、画像として書き出す。
#[derive(Debug, Parser)]
#[command(name = "collatz-tree", version)]
struct Cli {
    /// 上限 N（排他的、正の整数）
    #[arg(allow_negative_numbers = true)]
    up_to: i64,

    /// 出力ファイル（拡張子 .png / .svg / .jpg で形式を選ぶ）
    out_file: PathBuf,

    /// 1桁あたりのラベル幅 (px)
    #[arg(long, default_value_t = 8, value_parser = length_parser(1))]
    char_width: i64,

    /// 兄弟部分木の間隔 (px)
    #[arg(long, default_value_t = 10, value_parser = length_parser(0))]
    spacing: i64,

    /// ノード1段の高さ (px)
    #[arg(long, default_value_t = 20, value_parser = length_parser(1))]
    node_height: i64,

    /// 画像の余白 (px)
    #[arg(long, default_value_t = 80, value_parser = length_parser(0))]
    padding: i64,

    /// ラベルのフォント
    #[arg(long)]
    font_family: Option<String>,

    /// ラベルのフォントサイズ (px)
    #[arg(long, default_value_t = 13.0, value_parser = parse_positive)]
    font_size: f32,

    /// 背景色 (white / transparent / #rrggbb)
    #[arg(long, default_value = "white")]
    background: String,

    /// ラスタ化の倍率
    #[arg(long, default_value_t = 1.0, value_parser = parse_positive)]
    scale: f32,

    /// 幅計算を部分木ごとに並列化する
    #[arg(long)]
    parallel: bool,

    /// 木の統計を表示する
    #[arg(long)]
    stats: bool,

    /// ログを詳しくする（-v: debug, -vv: trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 警告以上のログのみ
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// 長さ (px) の範囲: min 以上 LayoutOptions::MAX_LENGTH 以下
fn length_parser(min: i64) -> clap::builder::RangedI64ValueParser<i64> {
    clap::value_parser!(i64).range(min..=LayoutOptions::MAX_LENGTH)
}

fn parse_positive(text: &str) -> Result<f32, String> {
    let value: f32 = text.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a positive number"))
    }
}

impl Cli {
    fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            char_width: self.char_width,
            spacing: self.spacing,
            node_height: self.node_height,
            parallel: self.parallel,
            ..LayoutOptions::default()
        }
    }

    fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions {
            padding: self.padding,
            font_family: self.font_family.clone().unwrap_or(defaults.font_family),
            font_size: self.font_size,
            background: self.background.clone(),
            scale: self.scale,
            ..RenderOptions::default()
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    // 入力検証は計算より先に行う
    if cli.up_to <= 0 {
        return Err(TreeError::InvalidArgument { limit: cli.up_to }.into());
    }
    let format = OutputFormat::from_path(&cli.out_file)?;

    let layout = cli.layout_options();
    let render = cli.render_options();
    layout.validate()?;
    render.validate_for(format)?;

    info!(up_to = cli.up_to, "calculating");
    let timer = Instant::now();
    let map = build_graph(cli.up_to)?;
    let mut root = build_tree(1, &map)?;
    info!(nodes = map.len(), elapsed = ?timer.elapsed(), "calculated");

    let extent = layout_tree(&mut root, &layout);
    let canvas = Canvas::new(root.width(), &extent, render.padding);
    info!(
        width = canvas.width,
        height = canvas.height,
        path = %cli.out_file.display(),
        "generating image"
    );
    write_image(&cli.out_file, &root, &extent, &layout, &render)?;
    info!(elapsed = ?timer.elapsed(), "done");

    if cli.stats {
        print_stats(&TreeStats::collect(&root));
    }
    Ok(())
}

fn print_stats(stats: &TreeStats) {
    println!("--- 統計 ---");
    println!("ノード数       = {}", stats.node_count);
    println!("葉の数         = {}", stats.leaf_count);
    println!("最大深さ       = {} (n={})", stats.max_depth, stats.deepest_value);
    println!("最大分岐数     = {}", stats.max_branching);
    println!("深さ別ノード数:");
    for (depth, &count) in stats.depth_histogram.iter().enumerate() {
        println!("  深さ{:<4}: {}", depth, count);
    }
}
