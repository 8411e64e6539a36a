use anyhow::Result;
use clap::Parser;
use dipwatch::db::{self, SqliteBoards};
use dipwatch::fetch::DipClient;
use dipwatch::notify::{Notifier, SmtpNotifier};
use dipwatch::{config, extract, reconcile, setup};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to an optional YAML config file; built-in defaults apply without one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database URL override (DATABASE_URL is also honored)
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;

    let database_url = args
        .db
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| cfg.database_url.clone());

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let creds = match db::load_credentials(&pool).await? {
        Some(creds) => creds,
        None => {
            // First run: collect the singleton credential record.
            let creds = setup::prompt_credentials()?;
            db::save_credentials(&pool, &creds).await?;
            creds
        }
    };

    let client = DipClient::new(&cfg)?;
    let html = client.fetch_home(&creds).await?;
    let boards = extract::extract_boards(&html);

    let store = SqliteBoards::new(pool.clone());
    let summary = reconcile::reconcile(&boards, &store).await?;
    info!(
        observed = summary.observed,
        new = summary.new_boards,
        changed = summary.changed_boards,
        notify = summary.notify,
        "snapshot reconciled"
    );

    if summary.notify {
        SmtpNotifier::new(creds).send_alert().await?;
    }

    Ok(())
}
