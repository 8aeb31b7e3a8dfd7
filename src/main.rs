use clap::Parser;
use collecting_data_pipeline::{
    handle,
    session::ChromiumLauncher,
    sink::{Sink, SqliteSink, StdoutSink},
    CrawlerContext, Dispatcher, Event, Settings,
};
use std::{io::Read, path::PathBuf, process::ExitCode, sync::Arc};
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Extract information from a link with the crawler registered for its site.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Identifier of the user the link belongs to
    #[arg(long, conflicts_with = "event")]
    user: Option<String>,

    /// Link to process
    #[arg(long, conflicts_with = "event")]
    link: Option<String>,

    /// JSON event file with `user` and `link` fields; `-` reads stdin
    #[arg(long)]
    event: Option<PathBuf>,
}

fn read_event(args: Args) -> Result<Event, Box<dyn std::error::Error>> {
    match args.event {
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(serde_json::from_str(&buf)?)
        }
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(Event {
            user: args.user,
            link: args.link,
        }),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,chromiumoxide=warn,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let event = read_event(Args::parse())?;

    let settings = Arc::new(Settings::new()?);
    debug!("{:?}", settings);

    let sink: Arc<dyn Sink> = match &settings.database_url {
        Some(url) => {
            info!("Storing records in {}", url);
            Arc::new(SqliteSink::connect(url).await?)
        }
        None => Arc::new(StdoutSink),
    };
    let launcher = Arc::new(ChromiumLauncher::new(&settings));
    let ctx = CrawlerContext::new(settings.clone(), launcher, sink);

    let dispatcher = Dispatcher::from_routes(ctx, settings.routes()?)?;

    let response = handle(&dispatcher, &event).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(if response.status_code == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
