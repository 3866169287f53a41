mod app_state;
mod cli;
mod event_log;
mod headless;
mod scene;
mod store;

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

use winsync_common::Shape;
use winsync_config::schema::SyncConfig;

const DEFAULT_DIRECTIVE: &str = "winsync=info";

fn init_logging(directive: &str) {
    let directive: Directive = directive
        .parse()
        .or_else(|_| DEFAULT_DIRECTIVE.parse())
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();
}

fn main() {
    // Parse CLI arguments
    let args = cli::parse();

    // Load config before logging so its level can apply; report failures after.
    let loaded = winsync_config::load_config(args.config.as_deref());

    let directive = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.as_directive().to_string(),
        (None, Err(_)) => DEFAULT_DIRECTIVE.to_string(),
    };
    init_logging(&directive);

    tracing::info!("winsync v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        SyncConfig::default()
    });

    let store = match store::open(&config, args.store_dir.as_deref()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open shared store: {e}");
            std::process::exit(1);
        }
    };

    if args.clear {
        if let Err(e) = store::clear(store.as_ref()) {
            tracing::error!("Failed to clear shared store: {e}");
            std::process::exit(1);
        }
        return;
    }

    let metadata = args.metadata();

    if args.headless {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Failed to start async runtime: {e}");
                std::process::exit(1);
            }
        };
        let options = headless::HeadlessOptions {
            shape: args.shape.unwrap_or_else(|| {
                Shape::new(
                    0.0,
                    0.0,
                    f64::from(config.window.width),
                    f64::from(config.window.height),
                )
            }),
            metadata,
            frames: args.frames,
        };
        if let Err(e) = runtime.block_on(headless::run(&config, store, options)) {
            tracing::error!("Headless run failed: {e}");
            std::process::exit(1);
        }
        tracing::info!("Shutdown complete");
        return;
    }

    // Create event loop and run
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    let mut app = app_state::SyncApp::new(config, store, metadata);

    tracing::info!("Entering event loop");
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
    }
    tracing::info!("Shutdown complete");
}
