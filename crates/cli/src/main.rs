use anyhow::{Context, Result};
use clap::Parser;
use profile_edit_core::{Config, ProfileEditor, init};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run against the in-memory demo backend (no configuration needed)
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Override the base URL defined in the environment
    #[arg(long)]
    base_url: Option<String>,

    /// Override the application key defined in the environment
    #[arg(long)]
    application_key: Option<String>,

    /// Print the fetched profile as JSON and exit
    #[arg(long, default_value_t = false)]
    show: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    init();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let editor = if args.demo {
        ProfileEditor::demo()
    } else {
        // Load config and apply CLI overrides
        let mut config = Config::load().context("Failed to load configuration")?;
        if let Some(base_url) = args.base_url {
            config.base_url = base_url;
        }
        if let Some(application_key) = args.application_key {
            config.application_key = application_key;
        }
        ProfileEditor::with_config(&config).context("Failed to build the profile client")?
    };

    // Handle --show
    if args.show {
        let profile = editor
            .fetch_profile()
            .await
            .context("Failed to fetch profile")?;
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    // Edit screen
    editor
        .run_interactive()
        .context("Failed to run the edit screen")?;

    Ok(())
}
