use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "kube-mcp-ctl")]
#[command(about = "Management CLI for the Kubernetes MCP server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    /// Admin API key; falls back to MCP_ADMIN_API_KEY
    #[arg(short, long, env = "MCP_ADMIN_API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server status, reload counters and registered tools
    Status,
    /// Show the active safety mode and what it blocks
    Safety,
    /// Ask whether a tool would be allowed right now
    Check { tool: String },
    /// Show tool call statistics
    Stats,
    /// Print the effective configuration (secrets redacted)
    Config,
    /// Reload configuration from disk
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request: RequestBuilder = match &cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Safety => client.get(format!("{base}/admin/safety")),
        Commands::Check { tool } => client.get(format!("{base}/admin/safety/check/{tool}")),
        Commands::Stats => client.get(format!("{base}/admin/stats")),
        Commands::Config => client.get(format!("{base}/admin/config")),
        Commands::Reload => client.post(format!("{base}/admin/reload")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
