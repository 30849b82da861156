use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tvpick::candidates::{import, SqlitePool};
use tvpick::session::{spawn_sweeper, MemorySessionStore};
use tvpick::{Conversation, RankRequest, Settings};

#[derive(Parser)]
#[command(name = "tvpick", about = "Conversational TV recommendations")]
struct Cli {
    /// Settings file (defaults to <data_dir>/tvpick/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Candidate database (overrides settings and TVPICK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Answer four questions on stdin and get a Top-3 + 2 recommendation
    Chat {
        /// Session id (any string)
        #[arg(long, default_value = "cli")]
        session: String,
    },
    /// Rank candidates for a size and scene without the conversation
    Rank {
        #[arg(long)]
        size: u32,
        /// Score profile: movie, ps5, bright, sport or newest
        #[arg(long)]
        scene: String,
        #[arg(long)]
        brand: Option<String>,
        /// Budget ceiling in RMB
        #[arg(long)]
        budget: Option<u32>,
        /// Launch year ranked first
        #[arg(long)]
        prefer_year: Option<i32>,
        #[arg(long, default_value = "10")]
        top: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the raw candidate pool, newest first
    Candidates {
        #[arg(long)]
        size: u32,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        budget: Option<u32>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Load a JSON array of candidates into the database
    Import {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tvpick::init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        settings.db_path = Some(db);
    }

    match cli.cmd {
        Cmd::Import { file } => {
            let pool = settings.open_pool()?;
            let candidates = import::load_json_file(&file)?;
            let written = pool.upsert(&candidates)?;
            println!(
                "Imported {} candidates ({} total in database)",
                written,
                pool.count()?
            );
        }
        Cmd::Chat { session } => run_chat(&settings, &session)?,
        Cmd::Rank {
            size,
            scene,
            brand,
            budget,
            prefer_year,
            top,
            json,
        } => {
            let chat = service(&settings, MemorySessionStore::new(settings.session_ttl()))?;
            let rows = chat.rank(&RankRequest {
                size,
                scene,
                brand,
                budget,
                preferred_year: prefer_year,
                top,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No candidates match.");
            } else {
                for r in rows {
                    println!(
                        "{:>2}. {} {} | {}寸 | {} | {} | score {:.3}",
                        r.rank,
                        r.brand,
                        r.model,
                        r.size_inch,
                        r.price.map_or("￥?".to_string(), |p| format!("￥{}", p)),
                        r.launch.map_or("未知".to_string(), |l| l.to_string()),
                        r.score
                    );
                }
            }
        }
        Cmd::Candidates {
            size,
            brand,
            budget,
            limit,
            json,
        } => {
            let chat = service(&settings, MemorySessionStore::new(settings.session_ttl()))?;
            let preview = chat.preview(size, brand.as_deref(), budget, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                println!("{} candidates", preview.total);
                for c in preview.candidates {
                    println!(
                        "- {} {} | {}寸 | {} | {}",
                        c.brand,
                        c.model,
                        c.size_inch,
                        c.valid_price()
                            .map_or("￥?".to_string(), |p| format!("￥{}", p)),
                        c.launch.map_or("未知".to_string(), |l| l.to_string())
                    );
                }
            }
        }
    }

    Ok(())
}

fn service<S: tvpick::session::SessionStore>(
    settings: &Settings,
    store: S,
) -> Result<Conversation<S, SqlitePool>> {
    let pool = settings.open_pool()?;
    Ok(Conversation::new(
        store,
        pool,
        settings.scoring_engine()?,
        settings.selection_engine(),
    ))
}

fn run_chat(settings: &Settings, session: &str) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let _guard = runtime.enter();

    let store = Arc::new(MemorySessionStore::new(settings.session_ttl()));
    let sweeper = spawn_sweeper(Arc::clone(&store), settings.sweep_interval());
    let chat = service(settings, store)?;
    info!("Chat session {} started", session);

    println!("{}", tvpick::conversation::collector::first_prompt());
    println!("（随时输入“重置”重新开始，“更多”查看上次结果的详细分析，“对比”比较前两名，“exit”退出；一句话可同时回答多个问题，如“75寸 预算13000 打游戏”）");

    let stdin = io::stdin();
    let mut out = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit" | "退出") {
            break;
        }
        match chat.handle(session, &line) {
            Ok(turn) => println!("{}", turn.reply),
            Err(e) => println!("⚠️ {}（请重新发送上一条回答）", e),
        }
        println!();
        out.flush()?;
    }

    sweeper.abort();
    Ok(())
}
