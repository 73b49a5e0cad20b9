mod app;
mod backend;
mod capture;
mod commands;
mod config;
mod devices;
mod error;
mod logging;
mod setup;
mod ui;

fn main() {
    if let Err(e) = app::run() {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
