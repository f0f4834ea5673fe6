use std::path::PathBuf;

use clap::Parser;
use roster::Status;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV file to write
    #[arg(long, default_value = "registrations.csv")]
    out: PathBuf,

    /// Same search as the dashboard: team name, email or institution
    #[arg(long, default_value = "")]
    query: String,

    #[arg(long)]
    status: Option<Status>,

    #[arg(long, env = "SUPABASE_URL")]
    url: String,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let summary = export::export(&args.url, &args.key, &args.out, &args.query, args.status).await?;

    println!(
        "Wrote {} registration(s) to {}",
        summary.written,
        args.out.display()
    );
    println!(
        "Total {} | approved {} | pending {} | rejected {} | paid {}",
        summary.stats.total,
        summary.stats.approved,
        summary.stats.pending,
        summary.stats.rejected,
        summary.stats.paid
    );

    Ok(())
}
