use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "wallet-cli")]
#[command(about = "Command-line client for the token wallet", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Privacy group member key; repeat for several counterparties.
    #[arg(long = "private-for", global = true)]
    private_for: Vec<String>,

    /// Confirmation timeout in seconds for state-changing commands.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token contract
    Deploy {
        #[arg(long)]
        initial_amount: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        decimals: u8,
        #[arg(long)]
        symbol: String,
    },
    /// Read a token field (name, symbol, decimals, totalSupply, version)
    Read { contract: String, field: String },
    /// Approve a spender
    Approve {
        contract: String,
        spender: String,
        value: String,
    },
    /// Show the allowance of spender over owner's tokens
    Allowance {
        contract: String,
        owner: String,
        spender: String,
    },
    /// List transactions touching an address
    History { address: String },
    /// List transactions whose outcome is unknown
    Pending,
    /// Show node configuration
    Config,
    /// Check ledger reachability
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    for key in &cli.private_for {
        headers.append("privatefor", HeaderValue::from_str(key)?);
    }
    if let Some(secs) = cli.timeout {
        headers.insert("x-confirmation-timeout", HeaderValue::from(secs));
    }

    let res = match &cli.command {
        Commands::Deploy {
            initial_amount,
            name,
            decimals,
            symbol,
        } => {
            client
                .post(format!("{}/deploy", cli.url))
                .headers(headers)
                .json(&json!({
                    "initialAmount": initial_amount,
                    "tokenName": name,
                    "decimalUnits": decimals,
                    "tokenSymbol": symbol,
                }))
                .send()
                .await?
        }
        Commands::Read { contract, field } => {
            client
                .get(format!("{}/{}/{}", cli.url, contract, field))
                .send()
                .await?
        }
        Commands::Approve {
            contract,
            spender,
            value,
        } => {
            client
                .post(format!("{}/{}/approve", cli.url, contract))
                .headers(headers)
                .json(&json!({ "spender": spender, "value": value }))
                .send()
                .await?
        }
        Commands::Allowance {
            contract,
            owner,
            spender,
        } => {
            client
                .get(format!("{}/{}/allowance", cli.url, contract))
                .query(&[("ownerAddress", owner), ("spenderAddress", spender)])
                .send()
                .await?
        }
        Commands::History { address } => {
            client
                .get(format!("{}/transactions/{}", cli.url, address))
                .send()
                .await?
        }
        Commands::Pending => client.get(format!("{}/transactions/pending", cli.url)).send().await?,
        Commands::Config => client.get(format!("{}/config", cli.url)).send().await?,
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(tx_id) = res.headers().get("x-transaction-id") {
        eprintln!("Transaction: {}", tx_id.to_str().unwrap_or("<invalid>"));
    }
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: wallet returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(s)) => println!("{}", s),
        Ok(json) if json.is_object() || json.is_array() => {
            println!("{}", serde_json::to_string_pretty(&json)?)
        }
        _ => println!("{}", text),
    }
    Ok(())
}
