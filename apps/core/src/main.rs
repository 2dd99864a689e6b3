// Haven terminal host
// One line in, one reply out. Slash commands map to the journal's user actions.

use anyhow::Context;
use haven_core::actors::orchestrator::Reply;
use haven_core::brain::Emotion;
use haven_core::config::AppConfig;
use haven_core::database;
use haven_core::fs_manager::PortablePathManager;
use haven_core::geo::GeoLocator;
use haven_core::models::{Message, Role, Theme};
use haven_core::mood::summarize;
use haven_core::resources::Resource;
use haven_core::telemetry;
use haven_core::voice::{VoiceInput, VoiceIo};
use haven_core::{SupervisorHandle, TurnOutcome};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const HELP: &str = "\
Commands:
  /mood <emotion>=<0..1> ... [-- note]   log how you feel (e.g. /mood joy=0.6 anxiety=0.2 -- good walk)
  /moods                                 show your mood history
  /history                               show this conversation
  /theme                                 toggle light/dark theme
  /voice                                 start or stop dictation (when available)
  /clear-profile                         forget what Haven has learned about you
  /reset                                 start a new session
  /help                                  show this help
  /quit                                  leave";

fn print_reply(outcome: &TurnOutcome) {
    match &outcome.reply {
        Reply::Safety(text) => println!("\n!! {}\n", text),
        Reply::Model(text) | Reply::Fallback(text) => println!("\nHaven: {}\n", text),
        Reply::Abandoned => {}
    }
    if let Some(resource) = &outcome.resource {
        print_resource(resource);
    }
}

fn print_resource(resource: &Resource) {
    println!("  [{}] {}", resource.title, resource.body);
    for contact in &resource.contacts {
        match (contact.phone.is_empty(), contact.text) {
            (false, Some(text)) => println!("    {}: {} ({})", contact.name, contact.phone, text),
            (false, None) => println!("    {}: {}", contact.name, contact.phone),
            (true, Some(text)) => println!("    {}: {}", contact.name, text),
            (true, None) => println!("    {}", contact.name),
        }
    }
    println!();
}

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Haven",
    };
    println!("[{}] {}: {}", message.timestamp.format("%Y-%m-%d %H:%M"), who, message.text);
}

/// Parses `joy=0.6 anxiety=0.2 -- note text`.
fn parse_mood(args: &str) -> anyhow::Result<(BTreeMap<Emotion, f64>, Option<String>)> {
    let (levels, note) = match args.split_once("--") {
        Some((levels, note)) => (levels, Some(note.trim().to_string()).filter(|n| !n.is_empty())),
        None => (args, None),
    };

    let mut emotions = BTreeMap::new();
    for pair in levels.split_whitespace() {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("expected <emotion>=<level>, got {:?}", pair))?;
        let emotion: Emotion = name.parse()?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("invalid level {:?}", value))?;
        anyhow::ensure!((0.0..=1.0).contains(&value), "levels must be between 0 and 1");
        emotions.insert(emotion, value);
    }
    anyhow::ensure!(!emotions.is_empty(), "name at least one emotion");
    Ok((emotions, note))
}

async fn submit(supervisor: &SupervisorHandle, text: String) {
    match supervisor.process_message(text).await {
        Ok(outcome) => {
            if outcome.reply != Reply::Abandoned {
                eprint!("Haven is typing...");
                let _ = std::io::stderr().flush();
                tokio::time::sleep(outcome.typing_delay).await;
                eprint!("\r                  \r");
            }
            print_reply(&outcome);
        }
        Err(e) => error!("Turn failed: {}", e),
    }
}

async fn show_moods(supervisor: &SupervisorHandle) -> anyhow::Result<()> {
    let history = supervisor.mood_history().await?;
    if history.is_empty() {
        println!("No moods recorded yet.");
        return Ok(());
    }
    for entry in &history {
        let levels = entry
            .emotions
            .iter()
            .map(|(e, v)| format!("{}={:.1}", e, v))
            .collect::<Vec<_>>()
            .join(" ");
        match &entry.note {
            Some(note) => println!("{}  {}  ({})", entry.timestamp.format("%Y-%m-%d %H:%M"), levels, note),
            None => println!("{}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), levels),
        }
    }
    let summary = summarize(&history);
    if let Some(most) = summary.most_frequent {
        println!("Most often: {} across {} entries", most, summary.entries);
    }
    Ok(())
}

/// Commands that read or change the journal through the supervisor.
async fn execute(supervisor: &SupervisorHandle, command: &str, args: &str) -> anyhow::Result<()> {
    match command {
        "/reset" => {
            supervisor.reset_session().await?;
            println!("Started a new session.");
        }
        "/clear-profile" => {
            supervisor.clear_profile().await?;
            println!("Profile cleared.");
        }
        "/mood" => match parse_mood(args) {
            Ok((emotions, note)) => {
                let entry = supervisor.log_mood(emotions, note).await?;
                println!("Logged ({} emotions).", entry.emotions.len());
            }
            Err(e) => println!("Could not log mood: {}", e),
        },
        "/moods" => show_moods(supervisor).await?,
        "/history" => {
            for message in supervisor.conversation().await? {
                print_message(&message);
            }
        }
        "/theme" => {
            let theme: Theme = supervisor.theme().await?.toggled();
            supervisor.set_theme(theme).await?;
            println!("Theme: {:?}", theme);
        }
        _ => anyhow::bail!("unknown command {}", command),
    }
    Ok(())
}

/// Runs a command; a failure is logged and the session carries on.
async fn run_command(supervisor: &SupervisorHandle, command: &str, args: &str) {
    if let Err(e) = execute(supervisor, command, args).await {
        error!(command, "Command failed: {:#}", e);
        println!("Something went wrong with {}. Please try again.", command);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(AppConfig::from_env().context("invalid configuration")?);
    telemetry::init(config.log_format)?;

    PortablePathManager::init(&config.data_dir).context("failed to create data directory")?;
    let db_path = config.db_path();
    let pool = database::init_db(Some(db_path.as_path()))
        .await
        .context("failed to open the record store")?;

    let (country, contacts) = GeoLocator::new(&config).crisis_contacts().await;
    info!(country = %country, "Crisis contacts selected");

    let supervisor = SupervisorHandle::start(config.clone(), pool, contacts).await?;
    let voice = VoiceIo::none();
    let mut dictation: Option<VoiceInput> = None;

    if !config.has_credential() {
        eprintln!("No chat credential set (HAVEN_CHAT_API_KEY). Replies will be limited.");
    }
    let theme = supervisor.theme().await?;
    println!("Haven ({:?} theme). Write whatever is on your mind. /help for commands.\n", theme);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, args) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/reset" | "/clear-profile" | "/mood" | "/moods" | "/history" | "/theme" => {
                run_command(&supervisor, command, args).await
            }
            "/voice" => match dictation.take() {
                Some(input) => match input.stop().await {
                    Some(text) => {
                        println!("You (voice): {}", text);
                        submit(&supervisor, text).await;
                    }
                    None => println!("Didn't catch anything."),
                },
                None => match voice.listen().await {
                    Some(input) => {
                        println!("Listening... /voice again to send.");
                        dictation = Some(input);
                    }
                    None => println!("Voice input is not available here."),
                },
            },
            _ if command.starts_with('/') => println!("Unknown command. /help for the list."),
            _ => submit(&supervisor, line.to_string()).await,
        }
    }

    supervisor.shutdown().await?;
    Ok(())
}
