use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the recommendation gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recommendations for a user
    Recommend { user_id: String },
    /// Show circuit breaker state and counts
    Breakers,
    /// Switch a downstream mock to normal, slow or fail
    Simulate { service: String, behavior: String },
    /// Check gateway liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Recommend { user_id } => {
            let res = client
                .get(format!("{}/recommendations/{}", cli.url, user_id))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Breakers => {
            let res = client
                .get(format!("{}/metrics/circuit-breakers", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Simulate { service, behavior } => {
            let res = client
                .post(format!("{}/simulate/{}/{}", cli.url, service, behavior))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            let status = res.status();
            println!("{} {}", status, res.text().await?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
