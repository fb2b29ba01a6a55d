use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use terrainview_camera::{CameraFrame, InputDelta, Throttle, orthogonality_error};
use terrainview_mesh::GridMesh;
use terrainview_render_wgpu::{OUTPUT_NAME, ProgramInterface, ShaderSources};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terrainview-cli", about = "Headless terrainview tooling")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a grid and print its strip statistics and digest
    Mesh {
        #[arg(long, default_value = "1500")]
        width: u32,
        #[arg(long, default_value = "1500")]
        height: u32,
    },
    /// Fly the camera with constant input and report frame drift
    Fly {
        /// Number of steps to integrate
        #[arg(short, long, default_value = "1000")]
        steps: u32,
        /// Pitch per step, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f32,
        /// Yaw per step, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f32,
        /// Roll per step, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        roll: f32,
        /// Speed change per step
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        throttle: f32,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and reflect the terrain shader pair without a GPU
    Shaders {
        #[arg(long, default_value = "shaders")]
        dir: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct FlightReport {
    steps: u32,
    input: InputDelta,
    start: CameraFrame,
    end: CameraFrame,
    /// Largest deviation from a right angle between direction and up, degrees.
    max_orthogonality_error: f32,
    final_orthogonality_error: f32,
    distance_travelled: f32,
}

fn simulate(steps: u32, input: InputDelta) -> FlightReport {
    let start = CameraFrame::default();
    let mut frame = start;
    let mut max_error = orthogonality_error(&frame);
    let mut distance = 0.0;

    for _ in 0..steps {
        let next = frame.step(&input);
        distance += next.position.distance(frame.position);
        max_error = max_error.max(orthogonality_error(&next));
        frame = next;
    }

    FlightReport {
        steps,
        input,
        start,
        end: frame,
        max_orthogonality_error: max_error.to_degrees(),
        final_orthogonality_error: orthogonality_error(&frame).to_degrees(),
        distance_travelled: distance,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Mesh { width, height } => {
            let mesh = GridMesh::build(width, height)?;
            let stats = mesh.strip_stats();
            println!("grid: {width}x{height}");
            println!("vertices: {}", mesh.vertex_count());
            println!(
                "indices: {} (expected {})",
                mesh.index_count(),
                GridMesh::expected_index_count(width, height)
            );
            println!(
                "triangles: {} ({} visible, {} degenerate)",
                stats.triangles,
                stats.visible(),
                stats.degenerate
            );
            println!("digest: {}", mesh.digest_hex());
        }
        Commands::Fly {
            steps,
            pitch,
            yaw,
            roll,
            throttle,
            json,
        } => {
            let input = InputDelta {
                pitch,
                yaw,
                roll,
                throttle: Throttle::Adjust(throttle),
                ..InputDelta::ZERO
            };
            tracing::debug!(?input, steps, "simulating flight");
            let report = simulate(steps, input);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let end = &report.end;
                println!("steps: {}", report.steps);
                println!(
                    "position: ({:.3}, {:.3}, {:.3})",
                    end.position.x, end.position.y, end.position.z
                );
                println!(
                    "direction: ({:.5}, {:.5}, {:.5}) |d|={:.6}",
                    end.direction.x,
                    end.direction.y,
                    end.direction.z,
                    end.direction.length()
                );
                println!(
                    "up: ({:.5}, {:.5}, {:.5}) |u|={:.6}",
                    end.up.x,
                    end.up.y,
                    end.up.z,
                    end.up.length()
                );
                println!("speed: {:.3}", end.speed);
                println!("distance: {:.3}", report.distance_travelled);
                println!(
                    "orthogonality drift: max {:.4} deg, final {:.4} deg",
                    report.max_orthogonality_error, report.final_orthogonality_error
                );
            }
        }
        Commands::Shaders { dir } => {
            let sources = ShaderSources::load_terrain(&dir)?;
            let program = ProgramInterface::link(&sources, OUTPUT_NAME)?;
            println!(
                "entry points: {} / {}",
                program.vertex_entry(),
                program.fragment_entry()
            );
            println!("uniform block: {} bytes", program.uniform_block_size());
            for name in program.uniform_names() {
                let location = program.lookup_uniform(name)?;
                println!(
                    "  uniform {name}: offset {} size {}",
                    location.offset, location.size
                );
            }
            for name in program.attribute_names() {
                let location = program.lookup_attribute(name)?;
                println!("  attribute {name}: location {}", location.0);
            }
            println!("output {OUTPUT_NAME}: location {}", program.output_location());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_flight_stays_put() {
        let report = simulate(100, InputDelta::ZERO);
        assert_eq!(report.end.position, report.start.position);
        assert_eq!(report.distance_travelled, 0.0);
        assert!(report.max_orthogonality_error < 1e-3);
    }

    #[test]
    fn throttle_accumulates_distance() {
        let input = InputDelta {
            throttle: Throttle::Adjust(0.5),
            ..InputDelta::ZERO
        };
        let report = simulate(4, input);
        assert_eq!(report.end.speed, 2.0);
        // 0.5 + 1.0 + 1.5 + 2.0
        assert!((report.distance_travelled - 5.0).abs() < 1e-3);
    }

    #[test]
    fn combined_yaw_and_roll_reports_drift() {
        let input = InputDelta {
            yaw: 1.0,
            roll: 1.0,
            ..InputDelta::ZERO
        };
        let report = simulate(1, input);
        assert!(report.max_orthogonality_error > 1e-3);
    }

    #[test]
    fn report_serializes() {
        let report = simulate(2, InputDelta::ZERO);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"], 2);
        assert!(json["end"]["position"].is_array());
    }
}
