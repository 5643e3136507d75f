//! Host-side helper: `cargo run` builds the WASM package into `static/pkg`
//! and serves `static/` over a local HTTP server.

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::process::{Command, ExitCode, Stdio};

    use clap::Parser;

    #[derive(Debug, Parser)]
    #[command(name = "circle_field", about = "Build and serve the circle field demo")]
    struct Args {
        /// Port for the local HTTP server.
        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Serve the existing `static/` contents without rebuilding.
        #[arg(long)]
        skip_build: bool,
    }

    pub fn run() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        if !args.skip_build {
            log::info!("building WASM pkg …");
            match Command::new("wasm-pack")
                .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
                .status()
            {
                Ok(st) if st.success() => {}
                Ok(st) => {
                    log::error!("wasm-pack finished with {st}. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/).");
                    return ExitCode::FAILURE;
                }
                Err(e) => {
                    log::warn!("wasm-pack not runnable ({e}); serving whatever is already in static/");
                }
            }
        }

        log::info!("serving static/ at http://127.0.0.1:{} …", args.port);
        let status = Command::new("python3")
            .args(["-m", "http.server", &args.port.to_string(), "--directory", "static"])
            .stdout(Stdio::null())
            .status();

        match status {
            Ok(st) if st.success() => ExitCode::SUCCESS,
            Ok(st) => {
                log::error!("http server exited with {st}");
                ExitCode::FAILURE
            }
            Err(e) => {
                log::error!("failed to start http server: {e}");
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    host::run()
}

// Only meaningful on non-wasm targets.
#[cfg(target_arch = "wasm32")]
fn main() {}
