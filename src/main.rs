mod data;
mod domain;
mod error;
mod heuristics;
mod propagate;
mod server;
mod solver;
mod state;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    server::run_server().await;
}
