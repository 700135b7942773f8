//! Application entry point — terminal front-end for live-translate.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Open the local key-value store and preferences.
//! 5. Build the translation and speech clients from config.
//! 6. Build the history backends and identity provider.
//! 7. Start the [`TranslatorSession`] and the view printers.
//! 8. Read stdin until `/quit` or EOF: plain lines are edits, `/…` lines
//!    are commands.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use live_translate::{
    config::{AppConfig, AppPaths},
    history::{HistoryBackends, HttpHistoryCollection},
    identity::{Identity, StaticIdentityProvider},
    orchestrator::TranslationView,
    preferences::{Preferences, Theme},
    session::TranslatorSession,
    storage::{FileKeyValueStore, KeyValueStore},
    translate::ApiTranslator,
    tts::{cpal_output_factory, ApiSynthesizer, PlaybackController, PlaybackNotice, PlaybackView},
};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Anything not starting with `/` replaces the source text.
    Edit(String),
    Speak,
    History,
    Favorite { id: String, value: bool },
    ClearHistory,
    Target { language: String, country: String },
    Source { language: String, country: String },
    Login { user: String, token: Option<String> },
    Logout,
    Theme(Option<String>),
    Quit,
    Help,
}

impl Command {
    fn parse(line: &str) -> Self {
        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Command::Edit(line.to_string());
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or("");
        let arg = |w: Option<&str>| w.map(str::to_string);

        match name {
            "speak" => Command::Speak,
            "history" => Command::History,
            "clear" => Command::ClearHistory,
            "logout" => Command::Logout,
            "quit" | "exit" => Command::Quit,
            "theme" => Command::Theme(arg(words.next())),
            "fav" => match (words.next(), words.next()) {
                (Some(id), Some("on")) => Command::Favorite {
                    id: id.to_string(),
                    value: true,
                },
                (Some(id), Some("off")) => Command::Favorite {
                    id: id.to_string(),
                    value: false,
                },
                _ => Command::Help,
            },
            "to" | "from" => {
                let Some(language) = words.next() else {
                    return Command::Help;
                };
                let language = language.to_string();
                let country = words.next().unwrap_or("").to_string();
                if name == "to" {
                    Command::Target { language, country }
                } else {
                    Command::Source { language, country }
                }
            }
            "login" => match words.next() {
                Some(user) => Command::Login {
                    user: user.to_string(),
                    token: arg(words.next()),
                },
                None => Command::Help,
            },
            _ => Command::Help,
        }
    }
}

const HELP: &str = "\
commands:
  <text>                 translate text (empty line clears)
  /to <lang> [country]   target language
  /from <lang> [country] source language (auto to detect)
  /speak                 read the translation aloud
  /history               list saved translations
  /fav <id> on|off       mark or unmark a favorite
  /clear                 delete all saved translations
  /login <user> [token]  use your cloud history
  /logout                back to local history
  /theme [light|dark|system]
  /quit";

// ---------------------------------------------------------------------------
// Printers
// ---------------------------------------------------------------------------

fn print_translation(view: &TranslationView) {
    if let Some(notice) = &view.notice {
        println!("! {notice}");
        return;
    }
    let Some(result) = &view.result else {
        return;
    };

    println!("→ {}  [{}]", result.translation, result.detected_language);
    if !result.alternatives.is_empty() {
        println!("  also: {}", result.alternatives.join(", "));
    }
    if !result.notes.is_empty() {
        println!("  note: {}", result.notes);
    }
}

fn print_playback(view: &PlaybackView) {
    match &view.notice {
        Some(PlaybackNotice::Speaking) => println!("♪ speaking…"),
        Some(PlaybackNotice::Failed(message)) => println!("! speech failed: {message}"),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("live-translate starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 4. Local storage
    let paths = AppPaths::new();
    let slots: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&paths.store_file));
    let preferences = Preferences::new(Arc::clone(&slots));
    log::info!("Theme: {:?}", preferences.theme());

    // 5. Capability clients
    let translator = Arc::new(ApiTranslator::from_config(&config.translation));
    let playback = PlaybackController::new(
        Arc::new(ApiSynthesizer::from_config(&config.speech)),
        cpal_output_factory(config.speech.sample_rate),
        config.speech.sample_rate,
        config.speech.channels,
    );

    // 6. History backends + identity
    let backends = HistoryBackends::new(
        Arc::clone(&slots),
        Arc::new(HttpHistoryCollection::from_config(&config.history)),
        config.history.capacity,
    );
    let identity = Arc::new(StaticIdentityProvider::new(None));

    // 7. Session + printers
    let session = TranslatorSession::new(
        translator,
        playback,
        identity.clone(),
        backends,
        config.orchestrator.clone(),
        &config.languages,
    );

    let mut views = session.orchestrator().subscribe();
    tokio::spawn(async move {
        let mut shown = None;
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if !view.loading && view.applied.is_some() && view.applied != shown {
                shown = view.applied;
                print_translation(&view);
            }
        }
    });

    let mut speech = session.playback().subscribe();
    tokio::spawn(async move {
        while speech.changed().await.is_ok() {
            let view = speech.borrow_and_update().clone();
            print_playback(&view);
        }
    });

    println!("live-translate — type to translate, /help for commands");

    // 8. Input loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Edit(text) => session.set_text(&text),
            Command::Speak => {
                if let Err(e) = session.speak_translation() {
                    println!("! {e}");
                }
            }
            Command::History => match session.history().await {
                Ok(entries) if entries.is_empty() => println!("(no history)"),
                Ok(entries) => {
                    for entry in entries {
                        let star = if entry.is_favorite { "★" } else { " " };
                        println!(
                            "{star} {}  {} → {}  ({}→{}, {})",
                            entry.id,
                            entry.source_text,
                            entry.translation,
                            entry.source_language,
                            entry.target_language,
                            entry.created_at.format("%Y-%m-%d %H:%M"),
                        );
                    }
                }
                Err(e) => log::warn!("history unavailable: {e}"),
            },
            Command::Favorite { id, value } => {
                if let Err(e) = session.set_favorite(&id, value).await {
                    log::warn!("favorite not saved: {e}");
                }
            }
            Command::ClearHistory => {
                if let Err(e) = session.clear_history().await {
                    log::warn!("history not cleared: {e}");
                }
            }
            Command::Target { language, country } => session.set_target(&language, &country),
            Command::Source { language, country } => session.set_source(&language, &country),
            Command::Login { user, token } => {
                let mut who = Identity::new(user);
                if let Some(token) = token {
                    who = who.with_token(token);
                }
                identity.sign_in(who);
            }
            Command::Logout => identity.sign_out(),
            Command::Theme(None) => println!("theme: {:?}", preferences.theme()),
            Command::Theme(Some(name)) => match Theme::parse(&name) {
                Some(theme) => {
                    if let Err(e) = preferences.set_theme(theme) {
                        log::warn!("theme not saved: {e}");
                    }
                }
                None => println!("! unknown theme {name:?}"),
            },
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
        }
    }

    log::info!("live-translate shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_edits() {
        assert_eq!(Command::parse("hello"), Command::Edit("hello".into()));
        assert_eq!(Command::parse(""), Command::Edit(String::new()));
    }

    #[test]
    fn favorite_needs_on_or_off() {
        assert_eq!(
            Command::parse("/fav abc on"),
            Command::Favorite {
                id: "abc".into(),
                value: true
            }
        );
        assert_eq!(
            Command::parse("/fav abc off"),
            Command::Favorite {
                id: "abc".into(),
                value: false
            }
        );
        assert_eq!(Command::parse("/fav abc maybe"), Command::Help);
    }

    #[test]
    fn language_commands_take_optional_country() {
        assert_eq!(
            Command::parse("/to pt BR"),
            Command::Target {
                language: "pt".into(),
                country: "BR".into()
            }
        );
        assert_eq!(
            Command::parse("/from auto"),
            Command::Source {
                language: "auto".into(),
                country: String::new()
            }
        );
        assert_eq!(Command::parse("/to"), Command::Help);
    }

    #[test]
    fn login_with_and_without_token() {
        assert_eq!(
            Command::parse("/login ada"),
            Command::Login {
                user: "ada".into(),
                token: None
            }
        );
        assert_eq!(
            Command::parse("/login ada s3cret"),
            Command::Login {
                user: "ada".into(),
                token: Some("s3cret".into())
            }
        );
    }

    #[test]
    fn unknown_command_shows_help() {
        assert_eq!(Command::parse("/dance"), Command::Help);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/theme dark"), Command::Theme(Some("dark".into())));
    }
}
