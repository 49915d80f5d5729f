use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use likesync::{cli, config, types::PkceToken, warning};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with your station account
    Auth,

    /// Like an audio block
    Like(LikeArgs),

    /// Remove the like from an audio block
    Unlike(UnlikeArgs),

    /// Like an audio block, or remove the like if it is already liked
    Toggle(LikeArgs),

    /// List liked audio blocks
    Likes(LikesOptions),

    /// Show or maintain operations waiting to sync
    Queue(QueueOptions),

    /// Send queued likes and unlikes to the station
    Sync,

    /// Track listening time
    Listening(ListeningOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LikeArgs {
    /// Audio block id
    pub id: String,

    /// Title shown in listings when the block is not known yet
    #[clap(long)]
    pub title: Option<String>,

    /// Artist shown in listings when the block is not known yet
    #[clap(long)]
    pub artist: Option<String>,

    /// Spin (playback) the like happened in
    #[clap(long)]
    pub spin: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct UnlikeArgs {
    /// Audio block id
    pub id: String,

    /// Spin (playback) the unlike happened in
    #[clap(long)]
    pub spin: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct LikesOptions {
    /// Filter by title or artist
    #[clap(long, conflicts_with = "check")]
    pub search: Option<String>,

    /// Show whether a single audio block is liked
    #[clap(long)]
    pub check: Option<String>,
}

#[derive(Parser, Debug, Clone)]
#[command(args_conflicts_with_subcommands = true)]
pub struct QueueOptions {
    #[command(subcommand)]
    pub command: Option<QueueSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueueSubcommand {
    /// Drop operations older than seven days
    Cleanup,
}

#[derive(Parser, Debug, Clone)]
pub struct ListeningOptions {
    #[command(subcommand)]
    pub command: Option<ListeningSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListeningSubcommand {
    /// Start a listening session
    Start,
    /// Stop the current listening session
    Stop,
    /// Set the listening total reported by the station, in seconds
    Baseline { seconds: i64 },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let pkce_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&pkce_state)).await;
        }
        Command::Like(args) => cli::like(args.id, args.title, args.artist, args.spin).await,
        Command::Unlike(args) => cli::unlike(args.id, args.spin).await,
        Command::Toggle(args) => cli::toggle(args.id, args.title, args.artist, args.spin).await,
        Command::Likes(opt) => cli::list_likes(opt.search, opt.check).await,
        Command::Queue(opt) => match opt.command {
            Some(QueueSubcommand::Cleanup) => cli::cleanup().await,
            None => cli::list_queue().await,
        },
        Command::Sync => cli::sync().await,
        Command::Listening(opt) => match opt.command {
            Some(ListeningSubcommand::Start) => cli::listening::start().await,
            Some(ListeningSubcommand::Stop) => cli::listening::stop().await,
            Some(ListeningSubcommand::Baseline { seconds }) => {
                cli::listening::baseline(seconds).await
            }
            None => cli::listening::show().await,
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
