use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use imgwelcome::banner::{
    BannerConfig, GuildBannerConfigStore, HttpAvatarFetcher, MemberJoinEvent,
    RenderOutcome,
};
use imgwelcome::config::Config;
use std::path::PathBuf;
use std::sync::Arc;

/// Imgwelcome - welcome banner renderer for chat bots
#[derive(Parser, Debug)]
#[command(name = "imgwelcome")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one banner through the full pipeline
    Preview {
        #[arg(long)]
        guild_id: u64,
        #[arg(long)]
        guild_name: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "0001")]
        discriminator: String,
        #[arg(long)]
        avatar_url: String,
        #[arg(long, default_value_t = 1)]
        member_id: u64,
        /// Where to write the PNG
        #[arg(short, long, default_value = "banner.png")]
        out: PathBuf,
        /// Render even if banners are disabled for the guild
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    imgwelcome::logging::init_subscriber()
        .map_err(|e| anyhow!("Failed to initialize logging subsystem: {e}"))?;

    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .context("Invalid configuration")?;

    tracing::info!(
        config_file = %args.config.display(),
        guilds = config.guilds.len(),
        enabled_guilds = config.guilds.iter().filter(|g| g.enabled).count(),
        avatar_timeout_secs = config.render.avatar_timeout_secs,
        background_dir = %config.render.background_dir.display(),
        "Configuration loaded successfully"
    );

    if args.test {
        println!("configuration {} is valid", args.config.display());
        return Ok(());
    }

    match args.command {
        Some(Command::Preview {
            guild_id,
            guild_name,
            name,
            discriminator,
            avatar_url,
            member_id,
            out,
            force,
        }) => {
            let event = MemberJoinEvent::new(
                guild_id,
                member_id,
                avatar_url,
                name,
                discriminator,
                guild_name,
            );
            preview(&config, event, out, force).await
        }
        None => bail!("No command given; use `preview` or `--test`"),
    }
}

async fn preview(
    config: &Config,
    event: MemberJoinEvent,
    out: PathBuf,
    force: bool,
) -> anyhow::Result<()> {
    let store = Arc::new(config.banner_store());
    if force {
        let snapshot = store
            .snapshot(event.guild_id)
            .map(|s| (*s).clone())
            .unwrap_or_else(|_| BannerConfig::new(event.guild_id));
        store.upsert(snapshot.with_enabled(true));
    }

    let renderer = config
        .render
        .renderer(store, Arc::new(HttpAvatarFetcher::new()?))?;

    let message = renderer.render(&event).await;
    println!("{}", message.output.caption());

    match message.outcome {
        RenderOutcome::Success => {
            message.output.persist(&out)?;
            if let Some(scratch) = &config.render.scratch_path {
                message.output.persist(scratch)?;
            }
            tracing::info!(path = %out.display(), "Banner written");
            Ok(())
        }
        RenderOutcome::Disabled => {
            tracing::info!(
                guild_id = event.guild_id,
                "Banners are disabled for this guild; pass --force to render anyway"
            );
            Ok(())
        }
        RenderOutcome::Failure { stage, reason } => {
            bail!("Banner render failed at {} ({})", stage.as_str(), reason)
        }
    }
}
