use vtec_rs::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());
    let cfg = load_config(&cli);
    let _telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        cfg.logging.clone(),
    ));

    if let Err(e) = cli::run(cli, cfg) {
        tracing::error!(
            transience = %e.transience(),
            effect = %e.effect(),
            "error: {}",
            e
        );
        std::process::exit(e.exit_code());
    }
}

fn load_config(cli: &cli::Cli) -> config::Config {
    match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}
