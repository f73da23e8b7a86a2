mod config;

use anyhow::{Context, Result};
use gitviz_core::{MemoryModel, Scene};
use gitviz_visuals::util::config as visuals_config;
use gitviz_visuals::{Canvas, GitVisuals, RecordingCanvas};
use serde_json::json;
use std::time::Duration;

fn init_tracing() {
    // stdout carries the layout
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_model(path: &std::path::Path) -> Result<MemoryModel> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let scene = Scene::from_json(&raw)
        .with_context(|| format!("failed to parse scene {}", path.display()))?;
    MemoryModel::from_scene(scene).context("scene does not form a valid commit graph")
}

fn print_layout<C: Canvas>(vis: &GitVisuals<MemoryModel, C>) -> Result<()> {
    for node in vis.nodes() {
        let line = json!({
            "commit": node.id,
            "x": node.pos.x,
            "y": node.pos.y,
            "depth": node.depth,
            "max_width": node.max_width,
            "status": vis.commit_upstream_status(&node.id)?,
            "fill": node.drawn.as_ref().map(|d| d.fill.to_hex()),
        });
        println!("{line}");
    }
    for vis_ref in vis.refs() {
        let Some(drawn) = &vis_ref.drawn else {
            continue;
        };
        let line = json!({
            "ref": vis_ref.id.to_string(),
            "label": drawn.label,
            "stack_index": drawn.stack_index,
            "anchor": drawn.anchor,
        });
        println!("{line}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let args = config::parse_args()?;

    let cfg = match &args.config {
        Some(path) => visuals_config::load_or_default_from_path(path),
        None => visuals_config::load_or_default(),
    };
    if args.write_config {
        match &args.config {
            Some(path) => visuals_config::save_to_path(&cfg, path)?,
            None => visuals_config::save(&cfg)?,
        }
    }

    let speed = args
        .speed_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.default_speed());
    let tick = cfg.explode_tick();

    let model = load_model(&args.scene)?;
    let mut vis = GitVisuals::new(model, RecordingCanvas::new(), cfg)?;
    vis.sync_from_model()?;
    vis.on_canvas_resize(args.width, args.height);
    vis.enter_render_ready_state()?;
    vis.refresh(speed)?;

    tracing::info!(
        nodes = vis.nodes().count(),
        edges = vis.edges().len(),
        refs = vis.refs().len(),
        "layout ready"
    );
    print_layout(&vis)?;

    if args.explode {
        vis.explode_nodes()?;
        let mut interval = tokio::time::interval(tick);
        // first tick completes immediately
        interval.tick().await;
        let mut ticks = 0u32;
        while vis.is_exploding() {
            interval.tick().await;
            vis.tick(tick)?;
            ticks += 1;
        }
        tracing::info!(ticks, "explosion finished");
    }

    if args.print_ops {
        print!("{}", vis.canvas().to_json_lines()?);
    }
    Ok(())
}
