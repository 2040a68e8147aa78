//! Moltbuddy - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use moltbuddy::agent::AgentSession;
use moltbuddy::cli::{Args, Commands};
use moltbuddy::config::Config;
use moltbuddy::experience::{
    actions_since_last_revision, update_due, ActionLog, PersonaHistory, PersonaUpdater,
};
use moltbuddy::llm::LlmClient;
use moltbuddy::moltbook::MoltbookEngagement;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match args.command.unwrap_or(Commands::Start) {
        Commands::Start => run_start(&config, args.verbose).await,
        Commands::Update => run_update(&config, args.verbose).await,
        Commands::History => run_history(&config),
        Commands::Config => run_config(&config),
    }
}

/// Interactive agent session (default command)
async fn run_start(config: &Config, verbose: bool) -> Result<()> {
    let Some(api_key) = config.moltbook_api_key() else {
        eprintln!(
            "{}",
            "Error: MOLTBOOK_API_KEY not found in environment or ~/.moltbuddy/api_key".red()
        );
        eprintln!("Set MOLTBOOK_API_KEY or create the api_key file, then try again.");
        std::process::exit(1);
    };

    println!("{}", "🦞 Moltbuddy".cyan().bold());
    println!("{}", "=".repeat(50));
    let key_preview: String = api_key.chars().take(20).collect();
    println!("Using API key: {}...", key_preview);
    if let Some(seed) = &config.learning.seed_persona {
        let seed = seed.trim();
        if !seed.is_empty() {
            let line = seed.replace('\n', " ");
            let preview: String = line.chars().take(80).collect();
            let ellipsis = if line.chars().count() > 80 { "..." } else { "" };
            println!("Persona: {}{}", preview, ellipsis);
        }
    }
    println!();

    print_update_hint(config);

    let session = AgentSession::build(config, &api_key, verbose).await?;

    println!("Checking agent status...");
    match session.run_task("Check my status on Moltbook.").await {
        Ok(result) => println!("Status: {}\n", result),
        Err(err) => eprintln!("{} {}\n", "Error:".red(), err),
    }

    println!("Getting latest feed...");
    match session
        .run_task("Get the latest hot posts from my feed.")
        .await
    {
        Ok(result) => println!("Feed: {}\n", result),
        Err(err) => eprintln!("{} {}\n", "Error:".red(), err),
    }

    println!("Entering interactive mode. Type 'exit' to quit.");
    println!();
    println!("You can:");
    println!("  • Give direct commands: 'Post in general: Hello Moltbook!', 'Search for agent memory'");
    println!("  • Let the agent work freely: 'Browse the feed and reply to one interesting post'");
    println!("  • Ask about you: 'What's my profile?', 'List my subscribed submolts'");
    println!();

    let mut editor = DefaultEditor::new()?;
    let history_file = Config::app_dir().ok().map(|dir| dir.join("history"));
    if let Some(path) = &history_file {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("You: ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                    println!("Goodbye! 🦞");
                    break;
                }
                let _ = editor.add_history_entry(input);

                match session.run_task(input).await {
                    Ok(result) => println!("\n{} {}\n", "Agent:".green().bold(), result),
                    Err(err) => eprintln!("\n{} {}\n", "Error:".red(), err),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nGoodbye! 🦞");
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Input error:".red(), err);
                break;
            }
        }
    }

    if let Some(path) = &history_file {
        let _ = editor.save_history(path);
    }

    Ok(())
}

/// One persona training step
async fn run_update(config: &Config, verbose: bool) -> Result<()> {
    let api_key = config.moltbook_api_key();
    let model_key = config.model_api_key();
    if model_key.is_none() {
        eprintln!(
            "{}",
            "Error: model API key not set (MOLTBUDDY_MODEL_API_KEY)".red()
        );
        std::process::exit(1);
    }

    let action_log = ActionLog::new(config.action_log_path()?, config.learning.enabled);
    let history = PersonaHistory::new(config.persona_history_path()?);

    let provider = Arc::new(MoltbookEngagement::new(&config.moltbook.base_url));
    let model = Arc::new(LlmClient::new(
        &config.model.base_url,
        model_key.as_deref().unwrap_or_default(),
        &config.model.model,
    )?);

    let mut updater = PersonaUpdater::new(
        provider,
        model,
        action_log,
        history,
        api_key,
        &config.learning.metric,
        config.learning.seed_persona.clone(),
    )
    .with_verbose(verbose);

    println!("{}", "🦞 Moltbuddy persona update".cyan().bold());
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Fetching engagement and running the critic...");

    let outcome = match updater.run_step().await {
        Ok(outcome) => {
            spinner.finish_and_clear();
            outcome
        }
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", "Update failed:".red(), err);
            std::process::exit(1);
        }
    };

    let snapshot = &outcome.snapshot;
    println!(
        "Engagement: karma={}, followers={}, upvotes_received={}, replies_received={}",
        snapshot.karma, snapshot.follower_count, snapshot.upvotes_received, snapshot.replies_received
    );
    println!(
        "Metric '{}' = {}",
        outcome.metric.name(),
        outcome.metric_value
    );
    println!();
    println!(
        "{}",
        "New persona appended to history. The next session will use it.".green()
    );
    println!("--- New persona ---");
    let persona = &outcome.revision.persona;
    let preview: String = persona.chars().take(500).collect();
    let ellipsis = if persona.chars().count() > 500 { "..." } else { "" };
    println!("{}{}", preview, ellipsis);

    Ok(())
}

/// Print persona history so you can see how the persona changed
fn run_history(config: &Config) -> Result<()> {
    let history = PersonaHistory::new(config.persona_history_path()?);
    let revisions = history.load_all()?;

    if revisions.is_empty() {
        println!("No persona history yet. Run the agent, then `moltbuddy update` to add entries.");
        return Ok(());
    }

    println!("Persona history ({} entries)\n", revisions.len());
    for (i, revision) in revisions.iter().enumerate() {
        println!(
            "--- Entry {} ({}) | {}={} ---",
            i + 1,
            revision.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            revision.metric_name,
            revision.metric_value
        );
        let preview: String = revision.persona.chars().take(400).collect();
        println!("{}", preview);
        if !revision.critic_notes.is_empty() {
            let notes: String = revision.critic_notes.chars().take(100).collect();
            println!("[Critic: {}]", notes);
        }
        println!();
    }

    Ok(())
}

/// Display the effective configuration with secrets redacted
fn run_config(config: &Config) -> Result<()> {
    println!("{}", "Moltbuddy configuration".cyan().bold());
    println!("Config file: {}", Config::config_path()?.display());
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    println!(
        "Moltbook API key: {}",
        if config.moltbook_api_key().is_some() {
            "set".green()
        } else {
            "not set".red()
        }
    );
    println!(
        "Model API key:    {}",
        if config.model_api_key().is_some() {
            "set".green()
        } else {
            "not set".red()
        }
    );
    println!();
    println!("Action log:      {}", config.action_log_path()?.display());
    println!(
        "Persona history: {}",
        config.persona_history_path()?.display()
    );

    Ok(())
}

/// Advisory cadence hint: suggest an update once enough actions accrued
fn print_update_hint(config: &Config) {
    let Ok(log_path) = config.action_log_path() else {
        return;
    };
    let Ok(history_path) = config.persona_history_path() else {
        return;
    };
    let action_log = ActionLog::new(log_path, config.learning.enabled);
    let history = PersonaHistory::new(history_path);
    let threshold = config.learning.update_after_actions;

    if let (Ok(true), Ok(count)) = (
        update_due(&action_log, &history, threshold),
        actions_since_last_revision(&action_log, &history),
    ) {
        println!(
            "{}",
            format!(
                "{} actions logged since the last persona revision; consider running `moltbuddy update`.",
                count
            )
            .yellow()
        );
        println!();
    }
}
