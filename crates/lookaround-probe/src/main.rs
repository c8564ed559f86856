//! Loads one Look Around panorama the way the viewer would and reports the
//! tier each face ends up at for a given camera.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p lookaround-probe -- 1234567890 0 --yaw=-30 --fov 40`.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use lookaround_adapter::{
    AdapterError, LookaroundAdapter, PanoMesh, PanoramaAdapter, ViewerHost,
};
use lookaround_config::{CliArgs, Config};
use lookaround_frustum::CameraState;
use lookaround_mesh::{FaceIndex, PanoGeometry};
use lookaround_tiles::{HttpTileSource, PanoramaRef, TileError};
use thiserror::Error;
use tracing::{debug, error, info, trace};

#[derive(Parser, Debug)]
#[command(name = "lookaround-probe", about = "Fetch a panorama and report face resolutions")]
struct ProbeArgs {
    /// Panorama id.
    panorama_id: u64,

    /// Capture heading of the panorama.
    heading: u64,

    /// Camera yaw in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    yaw: f32,

    /// Camera pitch in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f32,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 65.0)]
    fov: f32,

    /// Viewport aspect ratio.
    #[arg(long, default_value_t = 16.0 / 9.0)]
    aspect: f32,

    /// Write every displayed face as PNG into this directory.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    cli: CliArgs,
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error("could not resolve a config directory; pass --config")]
    NoConfigDir,

    #[error("http client: {0}")]
    Client(#[from] TileError),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Load(#[from] AdapterError),

    #[error("cannot create {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Viewer stand-in with a fixed camera.
struct ProbeHost {
    camera: CameraState,
    renders: Cell<usize>,
}

impl ViewerHost for ProbeHost {
    fn camera(&self) -> CameraState {
        self.camera
    }

    fn request_render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn set_progress(&self, progress: f32) {
        trace!(progress, "initial load progress");
    }
}

fn main() -> ExitCode {
    let args = ProbeArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("lookaround-probe: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: ProbeArgs) -> Result<(), ProbeError> {
    let config_dir = match args.cli.config.clone() {
        Some(dir) => dir,
        None => dirs::config_dir()
            .ok_or(ProbeError::NoConfigDir)?
            .join("lookaround"),
    };

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args.cli);

    let log_dir = config_dir.join("logs");
    lookaround_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let camera = camera_from_args(&args, &config);
    let panorama = PanoramaRef::new(args.panorama_id, args.heading);
    let source = HttpTileSource::new(&config.tiles)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ProbeError::Runtime)?;
    let local = tokio::task::LocalSet::new();
    let mesh = local.block_on(&runtime, probe(source, config, camera, panorama))?;

    println!("{}", geometry_report(mesh.geometry()));
    for line in face_report(&mesh) {
        println!("{line}");
    }
    if let Some(out) = &args.out {
        write_faces(&mesh, out)?;
    }
    Ok(())
}

fn camera_from_args(args: &ProbeArgs, config: &Config) -> CameraState {
    CameraState {
        yaw: args.yaw.to_radians(),
        pitch: args.pitch.to_radians(),
        vertical_fov_deg: args.fov,
        aspect: args.aspect,
        near: 1.0,
        far: 2.0 * config.viewer.sphere_radius,
    }
}

/// Initial load, mesh, first refresh pass, then every refresh it triggered.
async fn probe(
    source: HttpTileSource,
    config: Config,
    camera: CameraState,
    panorama: PanoramaRef,
) -> Result<PanoMesh, ProbeError> {
    let host = Rc::new(ProbeHost {
        camera,
        renders: Cell::new(0),
    });
    let viewer_host: Rc<dyn ViewerHost> = host.clone();
    let mut adapter = LookaroundAdapter::new(source, config, viewer_host);

    info!(
        endpoint = adapter.fetcher().endpoint(),
        dynamic_loading = adapter.config().refresh.dynamic_loading,
        %panorama,
        "probing panorama"
    );
    let textures = adapter.load_texture(panorama).await?;
    let mut mesh = adapter.create_mesh(1.0);
    adapter.set_texture(&mut mesh, &textures);
    info!(requests = adapter.in_flight_count(), "refresh pass issued");

    while let Some(completion) = adapter.next_completion().await {
        let outcome = adapter.apply_completion(&mut mesh, completion);
        debug!(?outcome, "refresh applied");
    }
    info!(renders = host.renders.get(), "probe finished");
    Ok(mesh)
}

/// Sizes of the buffers a renderer would upload.
fn geometry_report(geometry: &PanoGeometry) -> String {
    let vertices = geometry.merged.vertices();
    format!(
        "geometry: {} groups, {} vertices ({} bytes), {} index bytes",
        geometry.group_count(),
        vertices.len(),
        std::mem::size_of_val(vertices.as_slice()),
        geometry.merged.index_bytes().len()
    )
}

fn face_report(mesh: &PanoMesh) -> Vec<String> {
    FaceIndex::ALL
        .iter()
        .map(|face| match &mesh.material(*face).texture {
            Some(t) => format!("face {face}: tier {} ({}x{})", t.tier, t.width(), t.height()),
            None => format!("face {face}: none"),
        })
        .collect()
}

fn write_faces(mesh: &PanoMesh, out: &Path) -> Result<(), ProbeError> {
    std::fs::create_dir_all(out).map_err(|source| ProbeError::Output {
        path: out.to_path_buf(),
        source,
    })?;
    for material in mesh.materials() {
        let Some(texture) = &material.texture else {
            continue;
        };
        let path = out.join(format!("face_{}_tier_{}.png", texture.face, texture.tier));
        texture
            .image
            .save(&path)
            .map_err(|source| ProbeError::Save {
                path: path.clone(),
                source,
            })?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}
