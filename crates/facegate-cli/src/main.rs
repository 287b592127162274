use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "facegate", about = "Face gateway CLI")]
struct Cli {
    /// Gateway base URL.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a person record
    Add {
        /// Record name (primary key)
        #[arg(short, long)]
        name: String,
        /// Path to the face image file
        #[arg(short, long)]
        image: PathBuf,
        /// Extra free-form fields, key=value
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// List one record or the whole collection
    List {
        /// Record name to fetch; omit for all records
        #[arg(long)]
        id: Option<String>,
    },
    /// Merge fields into an existing record; omit --image to keep the
    /// stored face image
    Update {
        #[arg(short, long)]
        name: String,
        /// New face image; the stored one is kept when omitted
        #[arg(short, long)]
        image: Option<PathBuf>,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Delete a person record
    Delete {
        /// Record name to delete
        id: String,
    },
    /// Match an unknown photo against the stored faces
    Match {
        /// Path to the probe image file
        image: PathBuf,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn record_body(
    name: &str,
    image: Option<&Path>,
    fields: &[(String, String)],
) -> Result<serde_json::Value> {
    let mut body = serde_json::json!({ "name": name });
    if let Some(image) = image {
        let bytes = std::fs::read(image)
            .with_context(|| format!("failed to read image {}", image.display()))?;
        body["base64"] = serde_json::Value::String(STANDARD.encode(bytes));
    }
    for (key, value) in fields {
        body[key] = serde_json::Value::String(value.clone());
    }
    Ok(body)
}

async fn print_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("gateway returned a non-JSON body")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("gateway returned {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let http = reqwest::Client::new();
    let gateway = cli.gateway.trim_end_matches('/');

    match cli.command {
        Commands::Add {
            name,
            image,
            fields,
        } => {
            let body = record_body(&name, Some(&image), &fields)?;
            let response = http
                .post(format!("{gateway}/add"))
                .json(&body)
                .send()
                .await?;
            print_response(response).await?;
        }
        Commands::List { id } => {
            let mut request = http.get(format!("{gateway}/list"));
            if let Some(id) = id {
                request = request.query(&[("id", id)]);
            }
            print_response(request.send().await?).await?;
        }
        Commands::Update {
            name,
            image,
            fields,
        } => {
            let body = record_body(&name, image.as_deref(), &fields)?;
            let response = http
                .put(format!("{gateway}/update"))
                .json(&body)
                .send()
                .await?;
            print_response(response).await?;
        }
        Commands::Delete { id } => {
            let response = http
                .delete(format!("{gateway}/delete"))
                .query(&[("id", id)])
                .send()
                .await?;
            print_response(response).await?;
        }
        Commands::Match { image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read image {}", image.display()))?;
            let body = serde_json::json!({ "base64": STANDARD.encode(bytes) });
            let response = http
                .post(format!("{gateway}/match"))
                .json(&body)
                .send()
                .await?;
            print_response(response).await?;
        }
    }

    Ok(())
}
