use anyhow::Result;

mod animation;
mod asset_pipeline;
mod camera;
mod config;
mod demo;
mod engine;
mod error;
mod layout;
mod math;
mod rendering;
mod scene_graph;
mod ui;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::AppConfig::from_env();
    pollster::block_on(window::run(config))?;

    Ok(())
}
