use std::path::PathBuf;

use clap::{Parser, Subcommand};

use switchyard::config::{load_config, ClientConfig};
use switchyard::http::{Body, Method, Request, Response};
use switchyard::HttpClient;

#[derive(Parser)]
#[command(name = "switchyard-cli")]
#[command(about = "Issue requests through the switchyard client port", long_about = None)]
struct Cli {
    /// Base URL prepended to request paths.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// TOML configuration file whose [client] section is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Accept any server certificate.
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Return redirects instead of following them.
    #[arg(long)]
    no_redirects: bool,

    /// Extra request header, `name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path
    Get { path: String },
    /// DELETE a path
    Delete { path: String },
    /// POST a text body to a path
    Post { path: String, body: String },
    /// PUT a text body to a path
    Put { path: String, body: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ClientConfig::default(),
    };
    if config.base_url.is_none() {
        config.base_url = Some(cli.url.clone());
    }
    config.insecure |= cli.insecure;
    config.follow_redirects &= !cli.no_redirects;

    let mut client = HttpClient::from_config(&config)?;

    let (method, path, body) = match cli.command {
        Commands::Get { path } => (Method::GET, path, Body::Empty),
        Commands::Delete { path } => (Method::DELETE, path, Body::Empty),
        Commands::Post { path, body } => (Method::POST, path, Body::from(body)),
        Commands::Put { path, body } => (Method::PUT, path, Body::from(body)),
    };

    let mut request = Request::new(method, path).with_body(body);
    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("invalid header '{header}', expected 'name: value'"))?;
        request = request.with_header(name.trim(), value.trim())?;
    }

    let response = client.send(request).await?;
    print_response(&response)?;
    Ok(())
}

fn print_response(response: &Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = response.status;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    } else {
        println!("{}", status);
    }

    for cookie in &response.cookies {
        println!("Set-Cookie: {}", cookie);
    }

    match &response.body {
        Body::Value(value) => println!("{}", serde_json::to_string_pretty(value)?),
        Body::Empty => {}
        other => println!("{}", other.to_text()),
    }
    Ok(())
}
