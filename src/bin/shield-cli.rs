use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde_json::Value;
use std::path::PathBuf;

use api_shield::config;

#[derive(Parser)]
#[command(name = "shield-cli")]
#[command(about = "Operator CLI for api-shield", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a config file (plus environment overrides)
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Send one request through a running shield and show what came back
    Probe {
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,

        #[arg(short, long, default_value = "/health")]
        path: String,

        /// Origin header to send
        #[arg(long)]
        origin: Option<String>,

        /// JSON body; sent as POST when present
        #[arg(long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { config: path } => {
            let loaded = match path {
                Some(path) => config::load_config(&path),
                None => config::from_env(),
            };
            match loaded {
                Ok(config) => {
                    println!("Configuration OK");
                    println!("{}", toml::to_string_pretty(&config)?);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Probe { url, path, origin, body } => {
            let client = reqwest::Client::builder().no_proxy().build()?;

            let mut headers = HeaderMap::new();
            if let Some(origin) = origin {
                headers.insert(ORIGIN, HeaderValue::from_str(&origin)?);
            }

            let target = format!("{}{}", url.trim_end_matches('/'), path);
            let request = match body {
                Some(body) => {
                    let json: Value = serde_json::from_str(&body)?;
                    client.post(target).json(&json)
                }
                None => client.get(target),
            };

            let res = request.headers(headers).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    println!("Status: {}", res.status());
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("\n{}", serde_json::to_string_pretty(&json)?),
        Err(_) if text.is_empty() => {}
        Err(_) => println!("\n{}", text),
    }
    Ok(())
}
