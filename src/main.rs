mod camera;
mod config;
mod decoder;
mod display;
mod frame;
mod scanner;
mod ui;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("starting qr code scanner");

    ui::show_ui()
}
