mod config;
mod display;
mod error;
mod history;
mod i18n;
mod language;
mod llm_client;
mod storage;
mod translator;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::*;
use log::{debug, warn};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use config::Config;
use error::{TranslateError, TranslateResult};
use history::HistoryStore;
use i18n::I18n;
use language::{flag_for, LanguageChoice, LANGUAGES};
use llm_client::ChatClient;
use storage::{FileStore, MemoryStore};
use translator::{TranslateOptions, Translator};

#[derive(Parser)]
#[command(name = "tl")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate text, detecting the source language and picking the target
    Translate {
        /// Text to translate (read from stdin when omitted)
        text: Option<String>,
        /// Source language [default: auto]
        #[arg(long)]
        from: Option<String>,
        /// Target language [default: auto]
        #[arg(long)]
        to: Option<String>,
        /// Do not record this translation
        #[arg(long)]
        no_history: bool,
    },
    /// Translate with auto languages and print only the result
    Quick {
        /// Text to translate (read from stdin when omitted)
        text: Option<String>,
    },
    /// Expand bullet points into Vietnamese and English prose
    Expand {
        /// Bullet points (read from stdin when omitted)
        text: Option<String>,
    },
    /// Browse and manage translation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// List built-in languages
    Languages,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show recent translations
    List {
        /// Maximum number of records to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
    /// Case-insensitive search over original and translated text
    Search { query: String },
    /// Show one record in full
    Show { id: String },
    /// Delete one record
    Delete { id: String },
    /// Delete all records
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Print the number of records
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Config is needed before parsing so help text follows the UI language
    let config = Config::new();
    let i18n = I18n::new(&config.get_effective_language());
    debug!("Using config at {}", Config::get_config_path().display());

    let matches = Cli::command().about(i18n.t("help_about")).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    match cli.command {
        Commands::Translate { text, from, to, no_history } => {
            let input = read_input(text, &i18n)?;
            let options = TranslateOptions {
                source: LanguageChoice::from(from),
                target: LanguageChoice::from(to),
            };

            debug!("Requested {} -> {}", options.source, options.target);

            let translator = match prepare(&config, &input) {
                Ok(translator) => translator,
                Err(e) => report_failure(&i18n, "translation_failed", "empty_input", &e),
            };
            let progress = if options.source == LanguageChoice::Auto { "detecting" } else { "translating" };
            eprintln!("{}", i18n.t(progress).dimmed());

            let result = match translator.smart_translate(&input, &options).await {
                Ok(result) => result,
                Err(e) => report_failure(&i18n, "translation_failed", "empty_input", &e),
            };
            println!("{}", display::format_translation(&result, &i18n));

            if !no_history {
                let history = open_history(Config::data_dir(), &i18n);
                match history.save(
                    &result.original_text,
                    &result.translated_text,
                    &result.detected_language,
                    &result.target_language,
                ) {
                    Ok(_) => eprintln!("{}", i18n.t("saved_to_history").dimmed()),
                    Err(e) => eprintln!("{}", i18n.t_format("history_save_failed", &[&format!("{:#}", e)]).yellow()),
                }
            }
        }
        Commands::Quick { text } => {
            let input = read_input(text, &i18n)?;
            let translated = match prepare(&config, &input) {
                Ok(translator) => translator.smart_translate(&input, &TranslateOptions::default()).await,
                Err(e) => Err(e),
            };
            match translated {
                Ok(result) => println!("{}", result.translated_text),
                Err(e) => report_failure(&i18n, "translation_failed", "empty_input", &e),
            }
        }
        Commands::Expand { text } => {
            let input = read_input(text, &i18n)?;
            let translator = match prepare(&config, &input) {
                Ok(translator) => translator,
                Err(e) => report_failure(&i18n, "expansion_failed", "empty_bullets", &e),
            };
            eprintln!("{}", i18n.t("expanding").dimmed());

            let expansion = translator.expand_content(&input).await;
            match expansion {
                Ok(expansion) => println!("{}", display::format_expansion(&expansion, &i18n)),
                Err(e) => report_failure(&i18n, "expansion_failed", "empty_bullets", &e),
            }
        }
        Commands::History { action } => {
            let history = open_history(Config::data_dir(), &i18n);
            run_history(action, &history, &config, &i18n)?;
        }
        Commands::Languages => print_languages(&config, &i18n),
    }

    Ok(())
}

fn build_translator(config: &Config) -> TranslateResult<Translator<ChatClient>> {
    let client = ChatClient::new(config.translator_config()?)?;
    Ok(Translator::new(client, config.language_pair()))
}

/// Rejects empty input before the configuration is validated, so neither
/// failure reaches the network.
fn prepare(config: &Config, input: &str) -> TranslateResult<Translator<ChatClient>> {
    if input.trim().is_empty() {
        return Err(TranslateError::EmptyInput);
    }
    build_translator(config)
}

fn open_history(data_dir: PathBuf, i18n: &I18n) -> HistoryStore {
    match FileStore::new(data_dir) {
        Ok(store) => {
            debug!("History stored under {}", store.base_dir().display());
            HistoryStore::new(Box::new(store))
        }
        Err(e) => {
            warn!("{:#}", e);
            eprintln!("{}", i18n.t("error_create_data_dir").yellow());
            HistoryStore::new(Box::new(MemoryStore::new()))
        }
    }
}

fn read_input(text: Option<String>, i18n: &I18n) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            if let Some(hint) = stdin_hint(io::stdin().is_terminal(), i18n) {
                eprintln!("{}", hint.dimmed());
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context(i18n.t("error_read_input"))?;
            Ok(buffer)
        }
    }
}

fn stdin_hint(interactive: bool, i18n: &I18n) -> Option<String> {
    interactive.then(|| i18n.t("stdin_hint"))
}

fn report_failure(i18n: &I18n, title_key: &str, empty_key: &str, err: &TranslateError) -> ! {
    match err {
        TranslateError::EmptyInput => eprintln!("{}", i18n.t(empty_key).yellow()),
        TranslateError::Config(_) => {
            eprintln!("{}", i18n.t("config_error_title").red().bold());
            eprintln!("{}", err.to_string().red());
            eprintln!("{}", Config::get_config_path().display().to_string().dimmed());
        }
        _ => {
            eprintln!("{}", i18n.t(title_key).red().bold());
            eprintln!("{}", err.to_string().red());
        }
    }
    std::process::exit(1);
}

fn run_history(action: HistoryAction, history: &HistoryStore, config: &Config, i18n: &I18n) -> Result<()> {
    let width = config.display.preview_width.max(10);
    let now = Utc::now();

    match action {
        HistoryAction::List { limit } => {
            let records = history.get_all();
            if records.is_empty() {
                println!("{}", i18n.t("no_history").yellow());
                return Ok(());
            }
            let limit = limit.unwrap_or(records.len());
            for record in records.iter().take(limit) {
                println!("{}\n", display::format_record_line(record, &now, width, i18n));
            }
        }
        HistoryAction::Search { query } => {
            let records = history.search(&query);
            if records.is_empty() {
                println!("{}", i18n.t_format("no_results", &[&query]).yellow());
                return Ok(());
            }
            for record in &records {
                println!("{}\n", display::format_record_line(record, &now, width, i18n));
            }
        }
        HistoryAction::Show { id } => match history.get(&id) {
            Some(record) => println!("{}", display::format_record_detail(&record, i18n)),
            None => println!("{}", i18n.t_format("history_not_found", &[&id]).yellow()),
        },
        HistoryAction::Delete { id } => {
            if history.delete_item(&id)? {
                println!("{}", i18n.t_format("history_deleted", &[&id]).green());
            } else {
                println!("{}", i18n.t_format("history_not_found", &[&id]).yellow());
            }
        }
        HistoryAction::Clear { yes } => {
            let count = history.count();
            if count == 0 {
                println!("{}", i18n.t("no_history").yellow());
                return Ok(());
            }
            if !yes {
                println!("{}", i18n.t_format("confirm_clear_title", &[&count.to_string()]).red().bold());
                if !confirm(i18n)? {
                    println!("{}", i18n.t("clear_aborted").yellow());
                    return Ok(());
                }
            }
            history.clear()?;
            println!("{}", i18n.t("history_cleared").green());
        }
        HistoryAction::Count => {
            println!("{}", i18n.t_format("history_count", &[&history.count().to_string()]));
        }
    }
    Ok(())
}

fn confirm(i18n: &I18n) -> Result<bool> {
    print!("{}", i18n.t("confirm_clear_prompt").yellow());
    io::stdout().flush().ok();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return Ok(false);
    }
    Ok(input.trim().to_lowercase() == "yes")
}

fn print_languages(config: &Config, i18n: &I18n) {
    let pair = config.language_pair();
    println!("{}", i18n.t("languages_title").cyan().bold());
    println!("  {}  {}", flag_for("auto"), i18n.t("languages_auto"));
    println!(
        "  {}  {}",
        flag_for("auto"),
        i18n.t_format("languages_smart", &[&pair.primary, &pair.secondary])
    );
    for (label, flag) in LANGUAGES {
        let marker = if label.eq_ignore_ascii_case(&pair.primary) || label.eq_ignore_ascii_case(&pair.secondary) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}  {}", marker, flag, label);
    }
    println!();
    println!("{}", i18n.t("languages_hint").dimmed());
}
