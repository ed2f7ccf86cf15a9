//! Drives the tournament workflow from the command line.
//!
//! Connection settings come from the `TOURNEY_*` environment variables;
//! keys, the session and resume pointers persist in a JSON file.
//!
//! ```text
//! TOURNEY_API_KEY=... TOURNEY_GAME_PUBLIC_KEY=... tourney-demo list
//! tourney-demo join t-1 --access-key SECRET
//! tourney-demo score m-1 42000 2
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tourney::prelude::*;
use tourney::transport::ReqwestTransport;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tourney-demo", version, about = "Tournament client demo")]
struct Cli {
    /// Where keys and the session are kept between runs
    #[arg(long, env = "TOURNEY_STORE_PATH", default_value = "tourney-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register this device (done automatically on first use otherwise)
    Register,
    /// List developer and streamer tournaments
    List,
    /// Show a tournament, or the match to resume if already joined
    Open { tournament_id: String },
    /// Join a tournament and print the match and level to play
    Join {
        tournament_id: String,
        #[arg(long)]
        access_key: Option<String>,
        /// Streaming-platform linking code, for streamer tournaments
        #[arg(long)]
        linking_code: Option<String>,
    },
    /// Submit a finished attempt (milliseconds, or lives used for
    /// lives-ranked tournaments)
    Score {
        match_id: String,
        score: i64,
        lives: i64,
    },
    /// Show the leaderboard and your rank
    Leaderboard { match_id: String },
    /// List prizes waiting to be claimed
    Prizes,
    /// Claim the prize won in a match
    Claim { match_id: String, prize_id: String },
}

type DemoClient = TournamentClient<ReqwestTransport>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tourney=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(store = %cli.store.display(), "opening store");
    let store = Arc::new(JsonFileStore::open(&cli.store)?);
    let client = TournamentClient::builder()
        .config(ClientConfig::from_env())
        .store(store)
        .build()
        .await?;

    let result = run(&client, cli.command).await;
    client.shutdown().await?;
    result
}

async fn run(client: &DemoClient, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    match command {
        Command::Register => {
            client.ensure_device_registered().await?;
            writeln!(out, "device registered as {}", client.player_name())?;
        }
        Command::List => {
            let listing = client.list_tournaments().await?;
            writeln!(out, "developer tournaments:")?;
            for t in &listing.developer {
                print_tournament(&mut out, t)?;
            }
            writeln!(out, "streamer tournaments:")?;
            for t in &listing.player {
                print_tournament(&mut out, t)?;
            }
        }
        Command::Open { tournament_id } => match client.open_tournament(&tournament_id).await? {
            TournamentView::Joinable {
                tournament,
                access_key_required,
                needs_linking_code,
            } => {
                print_tournament(&mut out, &tournament)?;
                writeln!(
                    out,
                    "joinable (access key: {access_key_required}, linking code needed: {needs_linking_code})"
                )?;
            }
            TournamentView::AlreadyJoined { tournament, resume } => {
                print_tournament(&mut out, &tournament)?;
                match resume {
                    Some(details) => print_details(&mut out, &details)?,
                    None => writeln!(out, "already joined")?,
                }
            }
        },
        Command::Join {
            tournament_id,
            access_key,
            linking_code,
        } => {
            let tournament = match client.open_tournament(&tournament_id).await? {
                TournamentView::Joinable { tournament, .. } => tournament,
                TournamentView::AlreadyJoined { .. } => {
                    writeln!(out, "already joined {tournament_id}")?;
                    return Ok(());
                }
            };
            let entered = if tournament.is_player_tournament() {
                client
                    .enter_player_tournament(
                        &tournament,
                        linking_code.as_deref(),
                        access_key.as_deref(),
                    )
                    .await?
            } else {
                client
                    .join_tournament(&tournament, access_key.as_deref())
                    .await?
            };
            writeln!(
                out,
                "match {} on level {} ({} attempts left)",
                entered.match_id,
                entered.level,
                entered
                    .attempts_remaining
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            )?;
        }
        Command::Score {
            match_id,
            score,
            lives,
        } => {
            let score = client.match_details(&match_id).await?.score_from(score);
            let details = client.submit_score(&match_id, score, lives).await?;
            print_details(&mut out, &details)?;
        }
        Command::Leaderboard { match_id } => {
            let view = client.leaderboard(&match_id).await?;
            for entry in &view.board.leaderboard {
                writeln!(
                    out,
                    "{:>4}  {:<24} {}",
                    entry.rank.unwrap_or_default(),
                    entry.player_name.as_deref().unwrap_or("?"),
                    format_score(view.board.score_of(entry))
                )?;
            }
            match &view.current_player {
                Some(me) => writeln!(
                    out,
                    "you: rank {} with {}",
                    me.rank.unwrap_or_default(),
                    format_score(view.current_score())
                )?,
                None => writeln!(out, "you are not ranked yet")?,
            }
        }
        Command::Prizes => {
            let prizes = client.unclaimed_prizes().await?;
            if prizes.is_empty() {
                writeln!(out, "no unclaimed prizes")?;
            }
            for p in prizes {
                writeln!(out, "{}  {}  (prize {})", p.match_id, p.title, p.prize_id)?;
            }
        }
        Command::Claim { match_id, prize_id } => {
            let offer = client.prize_offer(&match_id, &prize_id).await?;
            writeln!(out, "claiming {}", offer.details.title)?;
            match client.claim_prize(&offer.awarded_prize_id).await? {
                ClaimOutcome::AlreadyFulfilled => writeln!(out, "already claimed")?,
                ClaimOutcome::OpenUrl(url) => writeln!(out, "redeem at {url}")?,
                ClaimOutcome::Fulfilled { prize_info, .. } => {
                    writeln!(out, "prize: {prize_info}")?;
                }
            }
        }
    }
    Ok(())
}

fn print_tournament(out: &mut impl Write, t: &Tournament) -> io::Result<()> {
    let lock = if t.has_access_key { " [key]" } else { "" };
    let open = if t.can_enter { "" } else { " (joined)" };
    writeln!(out, "  {}  {}{lock}{open}", t.id, t.title)
}

fn print_details(out: &mut impl Write, details: &MatchDetails) -> io::Result<()> {
    writeln!(
        out,
        "match {}: best {}, {} attempts left",
        details.match_id,
        format_score(details.score()),
        details
            .attempts_remaining
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    )
}

fn format_score(score: Option<Score>) -> String {
    match score {
        Some(Score::ElapsedMillis(ms)) => format!("{}.{:03}s", ms / 1000, ms % 1000),
        Some(Score::LivesUsed(n)) => format!("{n} lives"),
        None => "-".to_string(),
    }
}
