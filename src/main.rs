use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use link_voice::commands::BUILTIN_GROUPS;
use link_voice::config::file::{load_config_file, read_config_file};
use link_voice::pages::console::ConsolePageHost;
use link_voice::voice::console::{ConsoleMic, ConsoleRecognizer, ConsoleSynthesizer};
use link_voice::{
    Config, FilePreferenceStore, PageHost, PageScope, PreferenceStore, RecognitionErrorKind,
    VoiceController, page_name,
};

/// linK Voice - global voice commands for accessible browsing
#[derive(Parser)]
#[command(name = "link-voice", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default location
    #[arg(short, long, env = "LINK_VOICE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the voice preference
    #[arg(long, env = "LINK_VOICE_PREFERENCES_DIR")]
    preferences_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the controller from the terminal
    Run {
        /// Route to start on
        #[arg(short, long)]
        route: Option<String>,

        /// Turn blind mode on at startup
        #[arg(long)]
        blind: bool,
    },
    /// Show the saved voice preference
    Status,
    /// List the built-in voice commands
    Commands,
    /// Show the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,link_voice=info",
        1 => "info,link_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Run {
        route: None,
        blind: false,
    }) {
        Command::Run { route, blind } => {
            if let Some(route) = route {
                config.initial_route = route;
            }
            cmd_run(config, blind).await
        }
        Command::Status => cmd_status(&config),
        Command::Commands => {
            cmd_commands();
            Ok(())
        }
        Command::Config => {
            cmd_config(&config);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let file = match &cli.config {
        Some(path) => read_config_file(path)?,
        None => load_config_file(),
    };

    let mut config = Config::from_file(file)?;
    if let Some(dir) = &cli.preferences_dir {
        config.preferences.dir.clone_from(dir);
    }
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// A line typed into `link-voice run`
#[derive(Debug, PartialEq)]
enum ConsoleInput {
    /// Heard as speech
    Say(String),
    /// Host navigated
    Navigate(String),
    /// Engine error
    Fail(RecognitionErrorKind),
    /// Engine dropped the session
    DropSession,
    Blind(bool),
    Voice(bool),
    Status,
    Help,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let input = if line.starts_with('/') {
        ConsoleInput::Navigate(line.to_string())
    } else if let Some(code) = line.strip_prefix('!') {
        ConsoleInput::Fail(RecognitionErrorKind::from_code(code))
    } else if let Some(directive) = line.strip_prefix(':') {
        let mut words = directive.split_whitespace();
        match (words.next(), words.next()) {
            (Some("blind"), Some(state)) => parse_switch(state)
                .map_or_else(|| ConsoleInput::Invalid(line.to_string()), ConsoleInput::Blind),
            (Some("voice"), Some(state)) => parse_switch(state)
                .map_or_else(|| ConsoleInput::Invalid(line.to_string()), ConsoleInput::Voice),
            (Some("drop"), None) => ConsoleInput::DropSession,
            (Some("status"), None) => ConsoleInput::Status,
            (Some("help"), None) => ConsoleInput::Help,
            (Some("quit" | "q"), None) => ConsoleInput::Quit,
            _ => ConsoleInput::Invalid(line.to_string()),
        }
    } else {
        ConsoleInput::Say(line.to_string())
    };

    Some(input)
}

fn parse_switch(state: &str) -> Option<bool> {
    match state {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

fn print_usage() {
    println!("Type what you would say, e.g. \"go to chat\" or \"help\".");
    println!("  /route           navigate the page host");
    println!("  !code            engine error (no-speech, not-allowed, network, ...)");
    println!("  :drop            engine ends the session on its own");
    println!("  :blind on|off    toggle blind mode");
    println!("  :voice on|off    toggle global voice");
    println!("  :status          print the status snapshot");
    println!("  :quit            exit");
}

/// Interactive console session
async fn cmd_run(config: Config, blind: bool) -> anyhow::Result<()> {
    let (recognizer, mic) = ConsoleRecognizer::new();
    let host = ConsolePageHost::new(&config.initial_route);

    let voice = VoiceController::builder(config)
        .recognition(recognizer)
        .synthesis(ConsoleSynthesizer::new())
        .page_host(host.clone())
        .spawn();

    if blind {
        voice.toggle_blind_mode(true)?;
    }

    print_usage();
    voice.settle().await?;
    println!("[{}]", voice.status().label());

    let mut demo = DemoPage::default();
    demo.sync(&voice, &host.current_route())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            ConsoleInput::Say(text) => hear(&mic, &voice, &text),
            ConsoleInput::Navigate(route) => {
                host.clone().navigate(&route);
                voice.route_changed(route)?;
            }
            ConsoleInput::Fail(kind) => {
                if !mic.fail(kind) {
                    println!("(microphone is not listening)");
                }
            }
            ConsoleInput::DropSession => {
                if !mic.drop_session() {
                    println!("(microphone is not listening)");
                }
            }
            ConsoleInput::Blind(enabled) => voice.toggle_blind_mode(enabled)?,
            ConsoleInput::Voice(enabled) => voice.toggle_global_voice(enabled)?,
            ConsoleInput::Status => {
                println!("{}", serde_json::to_string_pretty(&voice.status())?);
            }
            ConsoleInput::Help => print_usage(),
            ConsoleInput::Quit => break,
            ConsoleInput::Invalid(line) => println!("(unknown directive: {line})"),
        }

        voice.settle().await?;
        demo.sync(&voice, &host.current_route())?;
    }

    voice.shutdown().await?;
    Ok(())
}

fn hear(mic: &ConsoleMic, voice: &VoiceController, text: &str) {
    if !mic.hear(text) {
        println!("(not listening: {})", voice.status().label());
    }
}

/// Page-specific commands the console mounts on the deaf learning page
#[derive(Default)]
struct DemoPage {
    scope: Option<PageScope>,
}

impl DemoPage {
    fn sync(&mut self, voice: &VoiceController, route: &str) -> anyhow::Result<()> {
        match (route == "/deaf", self.scope.is_some()) {
            (true, false) => {
                let mut scope = voice.page_scope();
                scope.add("next card", || println!("🃏 next card"), "show the next flash card")?;
                scope.add("previous card", || println!("🃏 previous card"), "go back one card")?;
                scope.add("flip card", || println!("🃏 card flipped"), "reveal the sign")?;
                tracing::debug!(page = page_name(route), "page commands mounted");
                self.scope = Some(scope);
            }
            (false, true) => {
                self.scope = None;
                tracing::debug!("page commands unmounted");
            }
            _ => {}
        }
        Ok(())
    }
}

/// Show the saved voice preference
fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let store = FilePreferenceStore::new(&config.preferences.dir, &config.preferences.key);
    let prefs = store.load()?;

    println!("Preference file: {}", store.path().display());
    println!(
        "Blind mode:      {}",
        if prefs.voice_mode_enabled { "on" } else { "off" }
    );
    println!("Record version:  {}", prefs.version);
    Ok(())
}

/// List the built-in commands in match order
fn cmd_commands() {
    println!("Built-in voice commands (first match wins):\n");
    for (command, triggers) in BUILTIN_GROUPS {
        println!("  {:<20} {}", command.to_string(), triggers.join(", "));
    }
    println!("\nPages may register their own commands; say \"what can I do here\" to hear them.");
}

/// Print the effective configuration
fn cmd_config(config: &Config) {
    let voice = &config.voice;
    println!("Initial route:        {}", config.initial_route);
    println!("Language:             {}", voice.language);
    println!("Confidence threshold: {}", voice.confidence_threshold);
    println!("Listening window:     {:?}", voice.listen_window);
    println!("Break:                {:?}", voice.break_duration);
    println!("No-speech retry:      {:?}", voice.no_speech_retry);
    println!("Error retry:          {:?}", voice.error_retry);
    println!("Unexpected end retry: {:?}", voice.end_restart);
    println!("Start retry:          {:?}", voice.start_retry);
    println!("Page announcement:    {:?}", voice.page_announcement_delay);
    println!("Mode summary:         {:?}", voice.mode_summary_delay);
    println!("Speech rate/volume:   {} / {}", voice.speech_rate, voice.speech_volume);
    println!(
        "Preferences:          {}",
        config
            .preferences
            .dir
            .join(format!("{}.json", config.preferences.key))
            .display()
    );
}
