use anyhow::{Result, anyhow};
use serde::Serialize;
use std::process::ExitCode;

use social_agent::cli::{self, TwclawCommand};
use social_agent::logging;
use social_agent::twitter::{
    self, PostedTweet, SearchOrder, TwitterClient, TwitterError, WRITE_SCOPE_HINT,
};

fn main() -> ExitCode {
    let args = cli::parse_twclaw_args();
    if let Err(err) = logging::init_stderr("warn") {
        eprintln!("Warning: {err}");
    }

    let client = match TwitterClient::from_env() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// The response body for HTTP failures, else the error itself.
fn describe(err: &TwitterError) -> String {
    match err {
        TwitterError::Http { body, .. } if !body.trim().is_empty() => body.clone(),
        other => other.to_string(),
    }
}

fn plain(err: TwitterError) -> anyhow::Error {
    anyhow!("Error: {}", describe(&err))
}

fn write_failure(err: TwitterError) -> anyhow::Error {
    anyhow!("Error: {}\n\n{WRITE_SCOPE_HINT}", describe(&err))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|err| anyhow!("Error: {err}"))?;
    println!("{out}");
    Ok(())
}

fn print_posted(posted: &PostedTweet, json: bool, banner: &str) -> Result<()> {
    if json {
        return print_json(posted);
    }
    println!("{banner}");
    println!("🔗 {}", posted.url);
    Ok(())
}

fn run(client: &TwitterClient, command: TwclawCommand) -> Result<()> {
    match command {
        TwclawCommand::Search {
            query,
            count,
            json,
            recent,
            popular,
        } => {
            let order = if recent {
                SearchOrder::Recent
            } else if popular {
                SearchOrder::Popular
            } else {
                SearchOrder::Default
            };
            let results = client.search(&query, count, order).map_err(plain)?;
            if json {
                return print_json(&results);
            }
            if results.is_empty() {
                println!("No tweets found for \"{query}\"");
            }
            for result in &results {
                println!("{}", twitter::format_search_result(result));
            }
            Ok(())
        }
        TwclawCommand::Read { tweet, json } => {
            let detail = client.read(&tweet).map_err(plain)?;
            if json {
                return print_json(&detail);
            }
            println!("{}", twitter::format_tweet_detail(&detail));
            Ok(())
        }
        TwclawCommand::Reply { tweet, text, json } => {
            let posted = client.reply(&tweet, &text).map_err(write_failure)?;
            print_posted(&posted, json, "✅ Reply posted successfully!")
        }
        TwclawCommand::Tweet { text, json } => {
            let posted = client.tweet(&text).map_err(write_failure)?;
            print_posted(&posted, json, "✅ Tweet posted successfully!")
        }
        TwclawCommand::AuthCheck => match client.auth_check() {
            Ok(username) => {
                println!("✅ Authentication successful!");
                println!("Authenticated as: @{username}");
                Ok(())
            }
            Err(err) => Err(anyhow!("❌ Authentication failed\n{}", describe(&err))),
        },
    }
}
