//! Satellite orbit visualizer: fetches Celestrak TLE groups, propagates them
//! with SGP4 over a fixed epoch window and renders a 3D orbit view, a ground
//! track map and a polar sky-pass chart.

mod app;
mod config;
mod drawing;
mod earth;
mod geo;
mod math;
mod pass;
mod propagate;
mod time;
mod tle;

use eframe::egui;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1600.0, 1000.0])
            .with_title("Orbit Viz"),
        ..Default::default()
    };

    eframe::run_native(
        "Orbit Viz",
        options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc)))),
    )
}
