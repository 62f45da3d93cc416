use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dooropen_client::{
    AddressResolver, Alert, Bindings, Console, ConsoleSink, DoorClient, HostField, Operation,
    Variant, DEFAULT_HOST,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

type Page = Bindings<AddressResolver, Console, Alert>;

#[derive(Debug, Parser)]
#[command(name = "dooropen")]
#[command(about = "Ping a door service and query its door status")]
struct Cli {
    /// Host of the door service, used verbatim in the URL
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, value_enum, default_value_t = VariantArg::Current)]
    variant: VariantArg,
    /// Override the variant's port
    #[arg(long)]
    port: Option<u16>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    /// port 8080, ping and door status, answers on the console
    Current,
    /// port 5000, ping only, answer shown as an alert
    Legacy,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Current => Variant::Current,
            VariantArg::Legacy => Variant::Legacy,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Ping,
    DoorStatus,
    /// Read commands from stdin: ping, door_status, host [VALUE], log, quit
    Console,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let variant = Variant::from(cli.variant);
    let resolver = AddressResolver::new(
        HostField::new(cli.host),
        cli.port.unwrap_or(variant.port()),
    );
    let page = Bindings::new(
        DoorClient::new(resolver, Console::echoing()),
        variant,
        Alert,
    );

    match cli.command {
        Commands::Ping => page.invoke(Operation::Ping).await,
        Commands::DoorStatus => page.invoke(Operation::DoorStatus).await,
        Commands::Console => interactive(&page).await,
    }
}

async fn interactive(page: &Page) -> Result<()> {
    let host = page.client().base().host();
    println!(
        "door service at {} ({:?} client)",
        page.client().base().resolve(),
        page.variant()
    );
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        in_flight.retain(|handle| !handle.is_finished());
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, Some(argument.trim())),
            None => (line, None),
        };
        match (command, argument) {
            ("", _) => {}
            ("quit" | "exit", _) => {
                in_flight.iter().for_each(JoinHandle::abort);
                return Ok(());
            }
            ("host", None) => println!("{}", host.get()),
            ("host", Some(value)) => host.set(value),
            ("log", _) => page
                .client()
                .console()
                .entries()
                .iter()
                .for_each(|entry| println!("  {}", entry)),
            (command, _) => match command.parse::<Operation>() {
                Ok(operation) => match page.click(operation) {
                    Some(handle) => in_flight.push(handle),
                    None => Alert.log(&format!("no {} button on this page", operation)),
                },
                Err(error) => eprintln!("{error}"),
            },
        }
    }
    // stdin closed: let pending answers land before leaving
    for handle in in_flight {
        handle.await.context("request task")?;
    }
    Ok(())
}
