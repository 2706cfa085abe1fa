use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "social-agent",
    about = "Moderation dashboard for AI-drafted social media replies"
)]
pub struct Cli {
    /// Backend base URL (overrides config and SOCIAL_AGENT_API_BASE).
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Screen to open, as a route path (e.g. "/review", "/hub/x").
    #[arg(long)]
    pub screen: Option<String>,

    /// Print an overview and queue summary instead of launching the TUI.
    #[arg(short, long)]
    pub status: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print overview metrics and the review queue summary.
    Status,
    /// List items waiting in the review queue.
    Queue(QueueArgs),
    /// Approve a review queue item, optionally with edited text.
    Approve(ApproveArgs),
    /// Reject a review queue item.
    Reject(RejectArgs),
    /// Halt or resume all automated posting.
    KillSwitch(KillSwitchArgs),
    /// Store a bearer token for the backend.
    Login {
        /// Token sent as `Authorization: Bearer <token>`.
        token: String,
    },
    /// Forget the stored bearer token.
    Logout,
}

#[derive(Args, Debug)]
pub struct QueueArgs {
    /// Print the items as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ApproveArgs {
    /// Review queue item id.
    pub id: String,
    /// Replacement reply text to post instead of the draft.
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct RejectArgs {
    /// Review queue item id.
    pub id: String,
    #[arg(short, long)]
    pub reason: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct KillSwitchArgs {
    pub state: Toggle,
    #[arg(short, long)]
    pub reason: Option<String>,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}

#[derive(Parser, Debug)]
#[command(name = "twclaw", about = "X/Twitter v2 from the command line")]
pub struct TwclawCli {
    #[command(subcommand)]
    pub command: TwclawCommand,
}

#[derive(Subcommand, Debug)]
pub enum TwclawCommand {
    /// Search recent tweets.
    Search {
        query: String,
        /// Number of results to print.
        #[arg(
            short = 'n',
            long = "count",
            default_value_t = 10,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        count: u32,
        #[arg(long)]
        json: bool,
        /// Newest first.
        #[arg(long, conflicts_with = "popular")]
        recent: bool,
        /// Most relevant first.
        #[arg(long)]
        popular: bool,
    },
    /// Show one tweet by id or URL.
    Read {
        tweet: String,
        #[arg(long)]
        json: bool,
    },
    /// Reply to a tweet by id or URL.
    Reply {
        tweet: String,
        text: String,
        #[arg(long)]
        json: bool,
    },
    /// Post a new tweet.
    Tweet {
        text: String,
        #[arg(long)]
        json: bool,
    },
    /// Check that the bearer token is accepted.
    AuthCheck,
}

pub fn parse_twclaw_args() -> TwclawCli {
    TwclawCli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_launches_dashboard() {
        let cli = Cli::try_parse_from(["social-agent", "--screen", "/review"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.screen.as_deref(), Some("/review"));
        assert!(!cli.status);
    }

    #[test]
    fn api_base_is_global() {
        let cli = Cli::try_parse_from([
            "social-agent",
            "queue",
            "--json",
            "--api-base",
            "http://localhost:9000/api/v1",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:9000/api/v1"));
        assert!(matches!(cli.command, Some(Commands::Queue(QueueArgs { json: true }))));
    }

    #[test]
    fn approve_with_edited_text() {
        let cli = Cli::try_parse_from(["social-agent", "approve", "42", "--text", "thanks!"]).unwrap();
        match cli.command {
            Some(Commands::Approve(args)) => {
                assert_eq!(args.id, "42");
                assert_eq!(args.text.as_deref(), Some("thanks!"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn kill_switch_takes_on_or_off() {
        let cli = Cli::try_parse_from(["social-agent", "kill-switch", "on", "-r", "incident"]).unwrap();
        match cli.command {
            Some(Commands::KillSwitch(args)) => {
                assert_eq!(args.state, Toggle::On);
                assert_eq!(args.reason.as_deref(), Some("incident"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["social-agent", "kill-switch", "maybe"]).is_err());
    }

    #[test]
    fn twclaw_search_defaults_and_order_conflict() {
        let cli = TwclawCli::try_parse_from(["twclaw", "search", "budget tips"]).unwrap();
        match cli.command {
            TwclawCommand::Search {
                query,
                count,
                json,
                recent,
                popular,
            } => {
                assert_eq!(query, "budget tips");
                assert_eq!(count, 10);
                assert!(!json && !recent && !popular);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(
            TwclawCli::try_parse_from(["twclaw", "search", "x", "--recent", "--popular"]).is_err()
        );
    }

    #[test]
    fn twclaw_search_count_must_be_positive() {
        assert!(TwclawCli::try_parse_from(["twclaw", "search", "budget", "-n", "0"]).is_err());
        let cli = TwclawCli::try_parse_from(["twclaw", "search", "budget", "-n", "1"]).unwrap();
        assert!(matches!(cli.command, TwclawCommand::Search { count: 1, .. }));
    }

    #[test]
    fn twclaw_auth_check_is_kebab_case() {
        let cli = TwclawCli::try_parse_from(["twclaw", "auth-check"]).unwrap();
        assert!(matches!(cli.command, TwclawCommand::AuthCheck));
    }
}
