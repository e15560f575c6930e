use std::io::Write;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ask-cli")]
#[command(about = "Send questions to a running ask relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask and wait for the full answer
    Ask {
        question: String,
        #[arg(short, long)]
        k: Option<i64>,
    },
    /// Ask and print the answer stream as it arrives
    Stream {
        question: String,
        #[arg(short, long)]
        k: Option<i64>,
    },
}

fn payload(question: &str, k: Option<i64>) -> Value {
    match k {
        Some(k) => json!({ "question": question, "k": k }),
        None => json!({ "question": question }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Ask { question, k } => {
            let res = client
                .post(format!("{}/ask", cli.url))
                .json(&payload(&question, k))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stream { question, k } => {
            let res = client
                .post(format!("{}/ask/stream", cli.url))
                .json(&payload(&question, k))
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            let mut stdout = std::io::stdout();
            let mut chunks = res.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                stdout.write_all(&chunk?)?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
