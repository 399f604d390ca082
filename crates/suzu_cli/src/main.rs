use async_trait::async_trait;
use clap::Parser;
use std::io::{self, Write};
use std::sync::Arc;
use suzu_core::{ChatMessage, ChatSink, SuzuConfig};
use suzu_engine::ChannelHandle;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "suzu.toml")]
    config: String,

    /// Channel to serve (overrides config)
    #[arg(long)]
    channel: Option<String>,

    /// Channel owner user id (overrides config)
    #[arg(long)]
    owner: Option<String>,
}

/// Console transport: prints everything the engine wants to say or do.
/// Stands in for the real chat connection when driving the engine locally.
struct ConsoleSink;

#[async_trait]
impl ChatSink for ConsoleSink {
    async fn send(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        println!("[#{channel}] suzu: {text}");
        Ok(())
    }

    async fn mute(&self, channel: &str, user_id: &str, seconds: u64) -> anyhow::Result<()> {
        println!("[#{channel}] * muted {user_id} for {seconds}s *");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut cfg = SuzuConfig::load_or_default(&args.config);
    if let Some(channel) = args.channel {
        cfg.bot.channel = channel;
    }
    if let Some(owner) = args.owner {
        cfg.bot.owner = owner;
    }
    cfg.validate()?;

    info!("Serving channel #{} (owner {})", cfg.bot.channel, cfg.bot.owner);
    let channel = cfg.bot.channel.clone();
    let handle = ChannelHandle::spawn(&cfg, Arc::new(ConsoleSink));

    println!("suzu console. Lines are \"user: message\"; type 'quit' to exit.");
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let trimmed = input.trim();

        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        if trimmed.is_empty() {
            print!("> ");
            io::stdout().flush()?;
            continue;
        }

        let (user, text) = match trimmed.split_once(':') {
            Some((user, text)) => (user.trim(), text.trim()),
            None => {
                println!("expected \"user: message\"");
                print!("> ");
                io::stdout().flush()?;
                continue;
            }
        };

        let msg = ChatMessage::new(&channel, user, text, chrono::Utc::now().timestamp());
        handle.deliver(msg).await?;

        print!("> ");
        io::stdout().flush()?;
    }

    handle.shutdown();
    Ok(())
}
