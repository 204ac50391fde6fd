use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(sand_control::config::log_filter_from_env()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match sand_control::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
