use anyhow::{Context, Result, bail};

use social_agent::Timeframe;
use social_agent::api::ApiClient;
use social_agent::cli::{self, Commands, Toggle};
use social_agent::config::{self, AppPaths, Settings};
use social_agent::dashboard::{Dashboard, Route};
use social_agent::logging;
use social_agent::model::DecisionRequest;
use social_agent::state::LocalStore;
use social_agent::tui::{App, run_tui};

fn main() -> Result<()> {
    let args = cli::parse_args();

    let paths = AppPaths::resolve().context("Failed to resolve the app directory")?;
    let mut settings = config::load_or_default(&paths).context("Failed to load configuration")?;
    settings.override_api_base(args.api_base.clone());

    let interactive = args.command.is_none() && !args.status;
    if interactive {
        logging::init_file(&paths.logs_dir(), &settings.logging.level)?;
    } else {
        logging::init_stderr("warn")?;
    }

    let mut store = LocalStore::open(&paths.store_file()).context("Failed to open local state")?;
    let api = ApiClient::new(&settings.api, store.auth_token()?);

    match args.command {
        None if args.status => handle_status(&api, &settings)?,
        None => handle_dashboard(api, store, &settings, args.screen.as_deref())?,
        Some(Commands::Status) => handle_status(&api, &settings)?,
        Some(Commands::Queue(queue_args)) => handle_queue(&api, queue_args.json)?,
        Some(Commands::Approve(approve_args)) => {
            let request = match approve_args.text {
                Some(text) if text.trim().is_empty() => bail!("Edited text must not be empty"),
                Some(text) => DecisionRequest::approve_edited(text),
                None => DecisionRequest::approve(),
            };
            api.decide(&approve_args.id, &request)
                .with_context(|| format!("Failed to approve {}", approve_args.id))?;
            println!("✓ Approved {}", approve_args.id);
        }
        Some(Commands::Reject(reject_args)) => {
            api.decide(&reject_args.id, &DecisionRequest::reject(reject_args.reason))
                .with_context(|| format!("Failed to reject {}", reject_args.id))?;
            println!("✓ Rejected {}", reject_args.id);
        }
        Some(Commands::KillSwitch(ks_args)) => {
            let active = ks_args.state == Toggle::On;
            let ack = api
                .set_kill_switch(active, ks_args.reason)
                .context("Failed to update the kill switch")?;
            if ack.kill_switch.active {
                println!("✓ Kill switch active: automated posting halted");
            } else {
                println!("✓ Kill switch off: automated posting resumed");
            }
        }
        Some(Commands::Login { token }) => {
            let token = token.trim();
            if token.is_empty() {
                bail!("Token must not be empty");
            }
            store.set_auth_token(token)?;
            println!("✓ Token saved to {}", paths.store_file().display());
        }
        Some(Commands::Logout) => {
            if store.clear_auth_token()? {
                println!("✓ Token removed");
            } else {
                println!("No token stored");
            }
        }
    }

    Ok(())
}

/// Launch the interactive dashboard.
fn handle_dashboard(
    api: ApiClient,
    store: LocalStore,
    settings: &Settings,
    screen: Option<&str>,
) -> Result<()> {
    let start = match screen {
        Some(path) => match Route::from_path(path) {
            Some(route) => Some(route),
            None => bail!("Unknown screen: {path}"),
        },
        None => None,
    };
    let timeframe = settings.dashboard.timeframe()?;
    let dashboard = Dashboard::new(&settings.dashboard, timeframe);
    run_tui(App::new(api, store, dashboard, start))
}

/// Print overview metrics and the review queue summary.
fn handle_status(api: &ApiClient, settings: &Settings) -> Result<()> {
    let timeframe: Timeframe = settings.dashboard.timeframe()?;
    let overview = api
        .overview(timeframe)
        .context("Failed to fetch the overview")?;
    let queue = api
        .review_queue()
        .context("Failed to fetch the review queue")?;

    println!("Overview ({})", timeframe.as_str());
    println!("─────────────────────────────────────");
    println!("  Engagements:      {}", overview.total_engagements);
    println!("  Engagement rate:  {:.1}%", overview.avg_engagement_rate);
    println!("  Approval rate:    {:.1}%", overview.approval_rate);
    println!("  Active platforms: {}", overview.active_platforms);
    for summary in &overview.platform_summaries {
        println!(
            "    {:12} {:>6} comments  {:>7.1} avg likes  [{}]",
            summary.platform, summary.comments_posted, summary.avg_likes, summary.trending_status
        );
    }

    println!("\nReview queue");
    println!("─────────────────────────────────────");
    println!("  Pending:      {}", queue.pending());
    println!("  Avg wait:     {:.1} min", queue.avg_wait_min);
    println!("  SLA breaches: {}", queue.sla_breaches);

    if queue.pending() == 0 {
        println!("\n✓ Nothing waiting for review");
    } else if queue.sla_breaches > 0 {
        println!("\n⚠ Some items have waited past the review SLA");
    }
    Ok(())
}

/// Print pending review items, as a table or JSON.
fn handle_queue(api: &ApiClient, json: bool) -> Result<()> {
    let queue = api
        .review_queue()
        .context("Failed to fetch the review queue")?;
    if json {
        let out = serde_json::to_string_pretty(&queue.items)?;
        println!("{out}");
        return Ok(());
    }
    if queue.items.is_empty() {
        println!("Review queue is empty");
        return Ok(());
    }
    for item in &queue.items {
        println!(
            "{:>8}  {:11} {:>3}  {:20}  {}",
            item.id,
            item.risk_label(),
            item.risk_score,
            item.author(),
            item.proposed_text.replace('\n', " ")
        );
    }
    Ok(())
}
