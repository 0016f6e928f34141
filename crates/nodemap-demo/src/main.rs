#![forbid(unsafe_code)]

//! nodemap demo binary entry point.

use nodemap::core::logging::{self, LogConfig};
use nodemap::{CanvasSurface, FileBackend, GraphStore, MemoryBackend, SceneSession, Viewport};
use nodemap_demo::{cli, script, seed_sample};
use tracing::{info, warn};

fn main() {
    let opts = cli::Opts::parse();

    if let Err(err) = logging::init(&LogConfig::from_env()) {
        eprintln!("Logging disabled: {err}");
    }

    let mut store = match &opts.state {
        Some(path) => GraphStore::with_backend(FileBackend::new(path)),
        None => GraphStore::with_backend(MemoryBackend::new()),
    };
    if let Some(err) = store.take_persistence_error() {
        warn!(error = %err, "could not load saved graph, starting empty");
    }
    if store.nodes().is_empty() {
        let seeded = seed_sample(&mut store);
        info!(seeded, "seeded sample graph");
    }

    let viewport = Viewport::new(opts.width, opts.height, opts.points_per_meter);
    let mut session = SceneSession::new(store, CanvasSurface::new(viewport));
    let frames = script::play(&mut session, &script::default_script());

    let shown = if opts.final_only {
        &frames[frames.len().saturating_sub(1)..]
    } else {
        &frames[..]
    };
    for frame in shown {
        println!("== {}", frame.caption);
        print!("{}", frame.dump);
    }

    if let Some(err) = session.store().last_persistence_error() {
        eprintln!("Persistence error: {err}");
        std::process::exit(1);
    }
}
