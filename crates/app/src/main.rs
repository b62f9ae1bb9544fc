use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{CurrentQuestion, PlayerName, QuestionId, QuizId};
use quiz_core::time::format_elapsed_seconds;
use services::{
    Clock, GameController, GamePhase, GameSettings, GameSnapshot, HttpSessionClient,
    SessionClientConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingQuizId,
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidTimeLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingQuizId => write!(f, "--quiz-id (or QUIZ_ID) is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidTimeLimit { raw } => write!(f, "invalid --time-limit value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- --quiz-id <id> [--base-url <url>] [--player <name>] [--time-limit <secs>]");
    eprintln!();
    eprintln!("During play, type the option number and press enter; `q` quits.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_ID, QUIZ_PLAYER_NAME, QUIZ_TIME_LIMIT_SECS, RUST_LOG");
}

struct Args {
    client: SessionClientConfig,
    quiz_id: QuizId,
    player: PlayerName,
    settings: GameSettings,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut client = SessionClientConfig::from_env();
        let mut quiz_id = std::env::var("QUIZ_ID")
            .ok()
            .and_then(|value| value.parse::<QuizId>().ok());
        let mut player = PlayerName::new(std::env::var("QUIZ_PLAYER_NAME").unwrap_or_default());
        let mut settings = GameSettings::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    client = SessionClientConfig::new(require_value(args, "--base-url")?);
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let parsed = value
                        .parse::<QuizId>()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    quiz_id = Some(parsed);
                }
                "--player" => {
                    player = PlayerName::new(require_value(args, "--player")?);
                }
                "--time-limit" => {
                    let value = require_value(args, "--time-limit")?;
                    let secs: u32 = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidTimeLimit { raw: value.clone() })?;
                    settings = settings.with_time_limit_secs(secs);
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            client,
            quiz_id: quiz_id.ok_or(ArgsError::MissingQuizId)?,
            player,
            settings,
        }))
    }
}

fn init_tracing() {
    // Logs go to stderr so they do not interleave with the game on stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Remembers what was last printed so each change is rendered once.
#[derive(Default)]
struct Screen {
    question: Option<QuestionId>,
    remaining: Option<u32>,
    error: Option<String>,
}

impl Screen {
    fn render(&mut self, snap: &GameSnapshot) {
        if snap.last_error != self.error {
            if let Some(err) = &snap.last_error {
                println!("! {err}");
            }
            self.error.clone_from(&snap.last_error);
        }

        if let Some(CurrentQuestion::Active(question)) = &snap.current {
            if self.question != Some(question.question_id()) {
                self.question = Some(question.question_id());
                println!();
                println!(
                    "Q {} / {}   score: {}",
                    question.position(),
                    question.total(),
                    snap.score
                );
                println!("{}", question.text());
                for (i, option) in question.options().iter().enumerate() {
                    println!("  {}) {option}", i + 1);
                }
            }
        }

        if snap.phase == GamePhase::Playing && snap.remaining_seconds != self.remaining {
            if let Some(secs) = snap.remaining_seconds {
                if secs % 5 == 0 || secs <= 3 {
                    println!("  {secs}s left");
                }
            }
        }
        self.remaining = snap.remaining_seconds;
    }
}

fn render_finished(snap: &GameSnapshot) {
    println!();
    println!("Finished!");
    println!(
        "Final score: {}   Total time: {}s",
        snap.score,
        format_elapsed_seconds(i64::try_from(snap.total_elapsed_ms).unwrap_or(i64::MAX))
    );
    if snap.leaderboard.is_empty() {
        println!("No scores yet");
        return;
    }
    println!();
    println!("{:>3}  {:<20} {:>8} {:>9}", "#", "Player", "Score", "Time (s)");
    for (i, row) in snap.leaderboard.iter().enumerate() {
        println!(
            "{:>3}  {:<20} {:>8} {:>9}",
            i + 1,
            row.player_name,
            row.score,
            row.duration_seconds()
        );
    }
}

/// Returns false when the player asked to quit.
async fn handle_input(game: &GameController, snap: &GameSnapshot, input: &str) -> bool {
    if input.eq_ignore_ascii_case("q") {
        return false;
    }
    let Some(question) = snap.current.as_ref().and_then(CurrentQuestion::question) else {
        return true;
    };
    let choice = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| question.option(index).map(|text| (index, text.to_owned())));
    match choice {
        Some((index, text)) => {
            // Failures are already on the snapshot; the next render shows them.
            if let Err(err) = game.select_answer(&text, index).await {
                tracing::debug!(error = %err, "answer not accepted");
            }
        }
        None => println!("  pick 1-{}", question.options().len()),
    }
    true
}

async fn play(game: &GameController) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval(Duration::from_millis(250));
    let mut screen = Screen::default();

    loop {
        let snap = game.snapshot();
        screen.render(&snap);
        if snap.phase == GamePhase::Finished {
            // The board is fetched after the phase flips; closing earlier drops it.
            if snap.leaderboard_loaded {
                return Ok(());
            }
            refresh.tick().await;
            continue;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if !handle_input(game, &snap, line.trim()).await {
                    return Ok(());
                }
            }
            _ = refresh.tick() => {}
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    init_tracing();

    let client = HttpSessionClient::new(args.client);
    tracing::info!(base_url = client.base_url(), quiz_id = %args.quiz_id, "starting game");
    let game = GameController::new(
        Arc::new(client),
        args.quiz_id,
        args.player,
        args.settings,
        Clock::default_clock(),
    );

    println!("Player: {}", game.player_name());
    game.start().await?;

    let ticker = game.spawn_ticker();
    let result = play(&game).await;
    drop(ticker);
    game.close();
    result?;

    let snap = game.snapshot();
    if snap.phase == GamePhase::Finished {
        render_finished(&snap);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
