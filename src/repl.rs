// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive resolver: each line is a specifier passed to `require`.

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Editor, Helper};
use spacey_native::{Callable, Context, ModuleRegistry, NativeError, ObjectRef, RuntimeConfig, Value};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// REPL configuration constants
const HISTORY_FILE: &str = ".spacey_ext_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    List,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<Self> {
        let cmd = input.trim().strip_prefix('.')?.to_lowercase();

        match cmd.as_str() {
            "help" | "h" | "?" => Some(ReplCommand::Help),
            "exit" | "quit" | "q" => Some(ReplCommand::Exit),
            "clear" | "cls" => Some(ReplCommand::Clear),
            "version" | "v" => Some(ReplCommand::Version),
            "list" | "ls" => Some(ReplCommand::List),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".list", "List registered modules"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".exit", "Exit the REPL"),
        ]
    }
}

/// Completion over registered base names and REPL commands
struct ExtHelper {
    words: Vec<String>,
}

impl ExtHelper {
    fn new(registry: &ModuleRegistry) -> Self {
        let mut words: Vec<String> = registry.bases().into_iter().map(String::from).collect();
        words.extend(ReplCommand::all_commands().iter().map(|(cmd, _)| cmd.to_string()));
        Self { words }
    }

    /// Completions only apply to the base part of a specifier
    fn matches<'a>(&'a self, word: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.words
            .iter()
            .filter(move |w| w.starts_with(word) && w.len() > word.len())
    }
}

impl Completer for ExtHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[..pos];
        if word.is_empty() || word.contains('@') {
            return Ok((pos, vec![]));
        }

        let matches: Vec<Pair> = self
            .matches(word)
            .map(|w| Pair {
                display: w.clone(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for ExtHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() || line.len() < 2 || line.contains('@') {
            return None;
        }

        self.matches(line)
            .next()
            .map(|w| w[line.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for ExtHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('.') {
            return Cow::Owned(line.magenta().to_string());
        }

        let Some((base, tail)) = line.split_once('@') else {
            return Cow::Owned(line.white().bold().to_string());
        };
        let version_start = tail
            .find(|c: char| !matches!(c, '<' | '>' | '='))
            .unwrap_or(tail.len());
        let (op, version) = tail.split_at(version_start);

        Cow::Owned(format!(
            "{}{}{}{}",
            base.white().bold(),
            "@".dimmed(),
            op.cyan(),
            version.yellow()
        ))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for ExtHelper {}

impl Helper for ExtHelper {}

/// The interactive resolver
pub struct Repl {
    cx: Context,
    editor: Editor<ExtHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(registry: Arc<ModuleRegistry>, config: &RuntimeConfig) -> rustyline::Result<Self> {
        let config_rl = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config_rl)?;
        editor.set_helper(Some(ExtHelper::new(&registry)));

        // Determine history file path
        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spacey")
            .join(HISTORY_FILE);

        // Create parent directory if it doesn't exist
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        // Load history
        let _ = editor.load_history(&history_path);

        Ok(Self {
            cx: Context::with_config(registry, config),
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "require>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if trimmed.starts_with('.') {
                        match ReplCommand::parse(trimmed) {
                            Some(ReplCommand::Exit) => break,
                            Some(cmd) => self.execute_command(cmd),
                            None => eprintln!(
                                "{}: unknown command '{}', try {}",
                                "Error".red().bold(),
                                trimmed.cyan(),
                                ".help".cyan()
                            ),
                        }
                        continue;
                    }

                    // Surrounding whitespace makes a specifier invalid, so pass the raw line
                    self.require_and_print(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        // Save history
        let _ = self.editor.save_history(&self.history_path);

        println!();
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "Spacey native extensions".white().bold(),
            "v".dimmed(),
            spacey_native::VERSION.bright_yellow()
        );
        println!(
            "  {} {}",
            self.cx.registry().len().to_string().yellow(),
            "module versions registered".dimmed()
        );
        println!();
        println!(
            "  {} {} {}",
            "Type a specifier such as".dimmed(),
            "net@>=1.2".cyan(),
            "or .help".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand) {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => {}
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => {
                println!(
                    "{}: {}",
                    "spacey-ext".bright_cyan().bold(),
                    spacey_native::VERSION.yellow()
                );
            }
            ReplCommand::List => {
                for (index, descriptor) in self.cx.registry().iter().enumerate() {
                    println!("{}", crate::module_line(index, descriptor));
                }
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Specifiers:".white().bold());
        println!();
        println!("  {:16} {}", "base".cyan(), "Highest registered version".dimmed());
        println!("  {:16} {}", "base@1.2.3".cyan(), "Exactly that version".dimmed());
        println!(
            "  {:16} {}",
            "base@>=1.2".cyan(),
            "Highest version matching >, >=, < or <=".dimmed()
        );
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:16} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:16} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:16} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:16} {}", "Tab".yellow(), "Complete module names".dimmed());
        println!();
    }

    fn require_and_print(&mut self, specifier: &str) {
        match self.cx.require(specifier) {
            Ok(instance) => {
                let id = self
                    .cx
                    .require_resolve(specifier)
                    .map(|descriptor| descriptor.id())
                    .unwrap_or_default();
                println!("{} {}", id.white().bold(), format_instance(&instance));
            }
            Err(e) => print_error(&e),
        }
    }
}

/// Format a module instance: own constructors, then template members
fn format_instance(instance: &ObjectRef) -> String {
    let obj = instance.read();
    let mut entries: Vec<String> = obj
        .keys()
        .into_iter()
        .map(|key| {
            let value = obj.get(&key).map(|v| format_value(&v)).unwrap_or_default();
            format!("{}: {}", key, value)
        })
        .collect();

    if let Some(template) = &obj.prototype {
        let template = template.read();
        entries.extend(template.keys().into_iter().map(|key| {
            let value = template.get(&key).map(|v| format_value(&v)).unwrap_or_default();
            format!("{}: {}", key.dimmed(), value)
        }));
    }

    format!("{{ {} }}", entries.join(", "))
}

/// Format a value for display with syntax coloring
fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".blue().dimmed().to_string(),
        Value::Null => "null".blue().to_string(),
        Value::Boolean(b) => b.to_string().yellow().to_string(),
        Value::Number(n) => n.to_string().yellow().to_string(),
        Value::String(s) => format!("'{}'", s).green().to_string(),
        Value::Object(_) => value.to_string().cyan().to_string(),
        Value::Function(callable) => match callable.as_ref() {
            Callable::Constructor(class) => format!("[class {}]", class.name).magenta().to_string(),
            Callable::Native { name, .. } => format!("[Function: {}]", name).magenta().to_string(),
        },
    }
}

/// Print a formatted error message
fn print_error(error: &NativeError) {
    let error_str = error.to_string();

    // Split error type from message
    match error_str.split_once(':') {
        Some((error_type, message)) => eprintln!("{}:{}", error_type.red().bold(), message),
        None => eprintln!("{}", error_str.red()),
    }
}
