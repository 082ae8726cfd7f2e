use clap::{App, Arg};
use hello_members::{
    application::Application,
    configuration::{setup_tracing, Configuration},
};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let matches = App::new("hello_members")
        .version("0.1")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("sets custom config file")
                .takes_value(true),
        )
        .get_matches();

    let config = matches.value_of("config").unwrap_or("hello_members.yml");

    let config = Configuration::new(config).map_err(|e| {
        error!(error = %e, "can't get configuration");
        e
    })?;

    Application::build(config)?.run().await;
    Ok(())
}
