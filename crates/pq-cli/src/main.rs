use pq_cli::{build_desk, commands, init_logging, AppConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = commands::cli().get_matches();

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    init_logging(config.log_format);

    let desk = build_desk(&config).await;
    let report = desk.bootstrap().await;
    tracing::debug!(?report, "desk ready");

    let result = commands::run(&desk, &matches).await;
    desk.flush().await;

    println!("{}", result?);
    Ok(())
}
