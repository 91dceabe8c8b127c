use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Instrument, error, info, info_span};
use tracing_subscriber::EnvFilter;

use siri_sm::config::{SubscribeConfig, SupplierConfig, TransportConfig, parse_stop_point_list};
use siri_sm::siri::{
    Exchange, HttpTransport, MockTransport, SiriClient, Transport, pretty_print_xml,
};

/// Stop point queried by `stop-monitoring` when none is given.
const DEFAULT_MONITORING_REF: &str = "ILEVIA:StopPoint:BP:CAS001:LOC";

/// SIRI stop monitoring client.
#[derive(Parser, Debug)]
#[command(name = "siri-sm")]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of the supplier's SIRI endpoint.
    #[arg(long, env = "SIRISM_SUPPLIER_ADDRESS")]
    supplier_address: String,

    /// Requestor reference sent with every request.
    #[arg(long, env = "SIRISM_SUBSCRIBER_REF", default_value = "NAVITIA")]
    subscriber_ref: String,

    /// Request timeout in seconds.
    #[arg(long, env = "SIRISM_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Serve canned responses from `<DIR>/<Action>.xml` instead of calling the supplier.
    #[arg(long, value_name = "DIR")]
    mock_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the supplier's service is up.
    CheckStatus,

    /// Fetch real-time visits at one stop point.
    StopMonitoring {
        /// Composite stop point reference.
        #[arg(long, default_value = DEFAULT_MONITORING_REF)]
        monitoring_ref: String,
    },

    /// Subscribe to stop monitoring updates.
    Subscribe {
        /// Address the supplier pushes notifications to.
        #[arg(long, env = "SIRISM_CONSUMER_ADDRESS")]
        consumer_address: String,

        /// Network prefix of the subscribed stop points.
        #[arg(long, env = "SIRISM_PRODUCER_REF")]
        producer_ref: String,

        /// Comma-separated short stop point ids.
        #[arg(long, env = "SIRISM_STOP_POINT_IDS")]
        stop_point_ids: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::CheckStatus => "checkstatus",
            Command::StopMonitoring { .. } => "getstopmonitoring",
            Command::Subscribe { .. } => "subscribe",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let span = info_span!("siri-sm", app = args.command.name());

    match &args.mock_dir {
        Some(dir) => match MockTransport::from_dir(dir) {
            Ok(mock) => {
                info!(dir = %dir.display(), "serving mock responses");
                run(SiriClient::new(mock), &args).instrument(span).await
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to load mock responses");
                ExitCode::FAILURE
            }
        },
        None => {
            let config = TransportConfig::default().with_timeout(args.timeout_secs);
            run(SiriClient::new(HttpTransport::new(config)), &args)
                .instrument(span)
                .await
        }
    }
}

async fn run<T: Transport>(client: SiriClient<T>, args: &Args) -> ExitCode {
    let supplier = SupplierConfig::new(&args.supplier_address, &args.subscriber_ref);
    let requested_at = Local::now().fixed_offset();

    match &args.command {
        Command::CheckStatus => report(client.check_status(&supplier, &requested_at).await),
        Command::StopMonitoring { monitoring_ref } => report(
            client
                .get_stop_monitoring(&supplier, &requested_at, monitoring_ref)
                .await,
        ),
        Command::Subscribe {
            consumer_address,
            producer_ref,
            stop_point_ids,
        } => {
            let stop_point_ids = match parse_stop_point_list(stop_point_ids) {
                Ok(ids) => ids,
                Err(e) => {
                    error!(error = %e, "fatal error");
                    return ExitCode::FAILURE;
                }
            };
            let config = SubscribeConfig::new(supplier, consumer_address, producer_ref)
                .with_stop_points(stop_point_ids);
            report(client.subscribe(&config, &requested_at).await)
        }
    }
}

/// Print the exchange and turn its outcome into an exit code.
fn report<T: Serialize>(exchange: Exchange<T>) -> ExitCode {
    if let Some(body) = &exchange.request_body {
        println!("{body}");
    }
    if let Some(body) = &exchange.response_body {
        println!("{}", pretty_print_xml(body));
    }

    match exchange.result {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "failed to serialize result");
                ExitCode::FAILURE
            }
        },
        Err(e) if e.is_remote() => {
            error!(error = %e, "remote error");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}
