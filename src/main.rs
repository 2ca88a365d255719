mod cli;
mod editor;
mod error;
mod logger;
mod models;
mod settings;
mod ui;
mod wordlist;
mod words_app;
mod worklog;
mod worklog_app;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use models::{parse_date, LogForm};
use settings::SettingsStore;
use wordlist::WordList;
use words_app::WordsApp;
use worklog::WorkLogStore;
use worklog_app::WorkLogApp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging is best effort; the apps work without a writable state dir
    if cli.wants_logging() {
        let _ = logger::init(&settings::state_dir(), logger::level_from_env());
    }

    match cli.command {
        Some(Commands::Words { file }) => {
            run_words(file)?;
        }
        Some(Commands::WordAdd { file, word, definition }) => {
            let mut list = WordList::new();
            if file.exists() {
                list.load(&file)?;
            } else {
                list.set_path(file.clone());
            }
            list.add_word(&word, &definition)?;
            list.save(None)?;
            println!("Added '{}' to {} ({} words)", word.trim(), file.display(), list.word_count());
        }
        Some(Commands::WordList { file }) => {
            let list = load_words(&file)?;
            if list.word_count() == 0 {
                println!("No words in {}", file.display());
            }
            for entry in list.entries() {
                println!("{}", entry.display());
            }
        }
        Some(Commands::WordRandom { file }) => {
            let list = load_words(&file)?;
            match list.random_word(&mut rand::thread_rng()) {
                Some(entry) => println!("{}", entry.display()),
                None => println!("No words in {}", file.display()),
            }
        }
        Some(Commands::Log { file }) => {
            let mut app = WorkLogApp::new(WorkLogStore::new(file));
            ui::run(&mut app)?;
        }
        Some(Commands::LogAdd { file, start, end, task, notes }) => {
            let form = LogForm {
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                task,
                notes,
            };
            let store = WorkLogStore::new(file);
            let entry = store.submit(&form)?;
            println!("Logged {} to {}", entry.date_range, store.path().display());
        }
        Some(Commands::LogList { file }) => {
            let store = WorkLogStore::new(file);
            let table = store.load()?;
            if table.file_missing {
                bail!("Log file '{}' not found", store.path().display());
            }
            if table.header_mismatch {
                eprintln!("Warning: unexpected header in {}", store.path().display());
            }
            if table.entries.is_empty() {
                println!("No log entries");
            }
            for entry in &table.entries {
                println!("{} | {} | {}", entry.date_range, entry.task, entry.notes);
            }
        }
        Some(Commands::Set { key, value }) => {
            SettingsStore::open_default()?.set(&key, &value)?;
            println!("Config '{}' set to '{}'", key, value);
        }
        Some(Commands::Get { key }) => match SettingsStore::open_default()?.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("Config '{}' not set", key),
        },
        Some(Commands::ConfigList) => {
            let items = SettingsStore::open_default()?.list()?;
            if items.is_empty() {
                println!("No config values set");
            }
            for item in items {
                println!("{} = {} (updated {})", item.key_name, item.value, item.updated_at);
            }
        }
        Some(Commands::ConfigDelete { key }) => {
            if SettingsStore::open_default()?.remove(&key)? {
                println!("Config '{}' deleted", key);
            } else {
                println!("Config '{}' not found", key);
            }
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "recorder", &mut std::io::stdout());
        }
        None => {
            run_words(None)?;
        }
    }

    Ok(())
}

fn run_words(file: Option<PathBuf>) -> Result<()> {
    let settings = match SettingsStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            log::warn!("preferences unavailable, using defaults: {}", e);
            SettingsStore::open_in_memory()?
        }
    };
    let mut app = WordsApp::new(settings, file);
    ui::run(&mut app)
}

fn load_words(file: &Path) -> Result<WordList> {
    let mut list = WordList::new();
    list.load(file)?;
    Ok(list)
}
