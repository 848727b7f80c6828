use chrono::Duration;
use clap::Parser;
use dotenvy::dotenv;
use study_planner_backend::utils::auth::create_jwt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mints an HS256 bearer token for local development against JWT_SECRET.
#[derive(Parser, Debug)]
#[command(about = "Issue a development bearer token")]
struct Args {
    /// User id placed in the `sub` claim
    #[arg(long)]
    user: String,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 24)]
    hours: i64,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_token=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if args.secret.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }
    if args.hours <= 0 {
        anyhow::bail!("--hours must be positive");
    }

    let token = create_jwt(&args.user, &args.secret, Duration::hours(args.hours))?;
    info!("🔑 Token for '{}' valid for {}h", args.user, args.hours);
    println!("{}", token);
    Ok(())
}
