use anyhow::{Context, bail};
use cabinview_common::{MovementMode, ViewerConfig};
use cabinview_input::{Action, InputState, Key, KeyState};
use cabinview_render::{Camera, DebugTextRenderer, DrawItem, MouseLook, Renderer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cabinview-cli", about = "CLI tool for the cabin scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print statistics for a Wavefront OBJ file
    Inspect {
        /// Path to the OBJ file
        path: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config,
    /// Drive the camera headlessly and print what would be drawn
    Simulate {
        /// One key per frame: w/a/s/d move, r/f fly up/down, c toggles
        /// camera mode, j/l/i/k turn the view, `.` idles
        #[arg(short, long, default_value = "wwwwdddd")]
        keys: String,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Print every frame instead of just the last
        #[arg(long)]
        trace: bool,
    },
}

/// Mouse pixels per turn key in `simulate`.
const TURN_PIXELS: f32 = 40.0;

/// Run a key script against the configured camera. Returns one rendered
/// frame description per script character.
fn simulate(config: &ViewerConfig, keys: &str, dt: f32) -> anyhow::Result<Vec<String>> {
    let mut camera = Camera::from_config(&config.camera);
    let mut look = MouseLook::looking_along(camera.front(), config.camera.pitch_limit_degrees);
    let mut input = InputState::new(MovementMode::OneShot);
    let items: Vec<DrawItem> = cabinview_assets::load_scene(&config.scene)
        .into_iter()
        .map(|m| DrawItem {
            vertex_count: m.mesh.vertex_count(),
            name: m.name,
            transform: m.transform,
        })
        .collect();
    let mut renderer = DebugTextRenderer::new();

    let mut frames = Vec::with_capacity(keys.len());
    for c in keys.chars() {
        match c.to_ascii_lowercase() {
            'w' => input.key_event(Key::W, KeyState::Pressed),
            'a' => input.key_event(Key::A, KeyState::Pressed),
            's' => input.key_event(Key::S, KeyState::Pressed),
            'd' => input.key_event(Key::D, KeyState::Pressed),
            'r' => input.key_event(Key::Space, KeyState::Pressed),
            'f' => input.key_event(Key::LeftShift, KeyState::Pressed),
            'c' => input.key_event(Key::C, KeyState::Pressed),
            'j' => input.mouse_motion(-TURN_PIXELS, 0.0),
            'l' => input.mouse_motion(TURN_PIXELS, 0.0),
            'i' => input.mouse_motion(0.0, -TURN_PIXELS),
            'k' => input.mouse_motion(0.0, TURN_PIXELS),
            '.' => {}
            other => bail!("unknown key {other:?} in script"),
        }

        let frame = input.take_frame();
        if frame.moves.front {
            camera.move_front(dt);
        }
        if frame.moves.back {
            camera.move_back(dt);
        }
        if frame.moves.left {
            camera.move_left(dt);
        }
        if frame.moves.right {
            camera.move_right(dt);
        }
        if frame.moves.up {
            camera.move_up(dt);
        }
        if frame.moves.down {
            camera.move_down(dt);
        }
        if frame.mouse_delta != glam::Vec2::ZERO {
            let scale = camera.sensitivity() * dt;
            camera.set_front(look.apply(frame.mouse_delta.x, frame.mouse_delta.y, scale));
        }
        if frame.has(Action::ToggleCameraMode) {
            camera.set_camera_mode(!camera.is_free());
        }

        camera.update();
        frames.push(renderer.render(&camera, &items));
    }
    tracing::debug!("simulated {} frames", frames.len());
    Ok(frames)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("cabinview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", cabinview_render::crate_info());
            println!("assets: {}", cabinview_assets::crate_info());
        }
        Commands::Inspect { path, json } => {
            let stats = cabinview_assets::inspect_obj(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", path.display());
                println!("  vertices:  {}", stats.vertices);
                println!("  triangles: {}", stats.triangles);
                println!(
                    "  extent:    ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    stats.min[0],
                    stats.min[1],
                    stats.min[2],
                    stats.max[0],
                    stats.max[1],
                    stats.max[2]
                );
            }
        }
        Commands::Config => {
            let config = ViewerConfig::load_or_default(cli.config.as_deref())?;
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Simulate { keys, dt, trace } => {
            let config = ViewerConfig::load_or_default(cli.config.as_deref())?;
            let frames = simulate(&config, &keys, dt)?;
            if trace {
                for frame in &frames {
                    print!("{frame}");
                }
            } else if let Some(last) = frames.last() {
                print!("{last}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinview_common::SceneConfig;

    fn config() -> ViewerConfig {
        ViewerConfig {
            scene: SceneConfig {
                meshes: Vec::new(),
                ..SceneConfig::default()
            },
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn one_frame_per_key() {
        let frames = simulate(&config(), "w.d", 0.016).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].contains("0 meshes"));
    }

    #[test]
    fn camera_mode_toggle_shows_in_output() {
        let frames = simulate(&config(), ".c", 0.016).unwrap();
        assert!(frames[0].contains("mode=free"));
        assert!(frames[1].contains("mode=ground"));
    }

    #[test]
    fn long_walk_stays_in_bounds() {
        let frames = simulate(&config(), &"w".repeat(200), 0.5).unwrap();
        let last = frames.last().unwrap();
        // Walking along (0, -5, -10) ends clamped at the floor and far wall.
        assert!(last.contains("pos=(0.00, 0.10, -14.00)"), "{last}");
    }

    #[test]
    fn fly_keys_change_height() {
        let frames = simulate(&config(), "rrf", 1.0).unwrap();
        // Default eye at y=5 with speed 3.5.
        assert!(frames[0].contains("pos=(0.00, 8.50, 10.00)"), "{}", frames[0]);
        assert!(frames[1].contains("pos=(0.00, 12.00, 10.00)"), "{}", frames[1]);
        assert!(frames[2].contains("pos=(0.00, 8.50, 10.00)"), "{}", frames[2]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(simulate(&config(), "wx", 0.016).is_err());
    }

    #[test]
    fn fallback_scene_is_drawn() {
        let mut config = ViewerConfig::default();
        for mesh in &mut config.scene.meshes {
            mesh.obj = mesh.obj.as_ref().map(|p| PathBuf::from("/nonexistent").join(p));
            mesh.texture = None;
        }
        let frames = simulate(&config, ".", 0.016).unwrap();
        assert!(frames[0].contains("2 meshes"));
        assert!(frames[0].contains("draw cabin"));
        assert!(frames[0].contains("draw terrain"));
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::parse_from(["cabinview-cli", "simulate", "--keys", "wasd", "--trace"]);
        match cli.command {
            Commands::Simulate { keys, trace, .. } => {
                assert_eq!(keys, "wasd");
                assert!(trace);
            }
            _ => panic!("expected simulate"),
        }
    }
}
