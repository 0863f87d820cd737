//! air_canvas — interactive entry point.

use std::io::{self, Write};

use air_canvas::app::{run, AppConfig};
use air_canvas::session::SealPolicy;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Air Canvas — pinch to draw in three dimensions      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Mouse simulation  (use --features leap for hardware)");
    println!();

    let cfg = if std::env::args().any(|a| a == "--quick") {
        println!("  Quick-start: cyan, width 0.10, strokes stay open in view mode\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening canvas window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let defaults = AppConfig::default();

    println!("  Palette: 1.red  2.cyan  3.lime  4.purple  5.white");
    let start_color = read_line("  Starting color (1–5, default 2): ")
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| (1..=5).contains(&n))
        .map(|n| n - 1)
        .unwrap_or(defaults.start_color);

    let line_width = read_line("  Line width 0.02–0.5 (default 0.10): ")
        .trim()
        .parse::<f32>()
        .unwrap_or(defaults.line_width)
        .clamp(0.02, 0.5);

    let seal_policy = match read_line("  Seal open stroke when entering view mode? y/N: ")
        .trim()
        .to_lowercase()
        .as_str()
    {
        "y" | "yes" => SealPolicy::SealOnEnter,
        _ => SealPolicy::KeepOpen,
    };

    AppConfig {
        start_color,
        line_width,
        seal_policy,
        ..defaults
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
