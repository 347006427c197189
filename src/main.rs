//! adivina CLI: play the guessing game in a terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use adivina::engine::{Engine, EngineConfig};
use adivina::entity::{
    Answer, AttrValue, CLUB, CORE_ATTRIBUTES, ConfirmRule, Entity, LEAGUE, NATIONALITY, POSITION,
};
use adivina::session::Step;
use adivina::store::json::JsonFileStore;
use adivina::store::{CatalogStore, slugify, value_domains};
use adivina::text::pretty_attr;

#[derive(Parser)]
#[command(name = "adivina", version, about = "Guess-the-entity game engine")]
struct Cli {
    /// Dataset file (created when missing).
    #[arg(long, global = true, default_value = "futbol_dataset.json")]
    data: PathBuf,

    /// TOML engine configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fixed RNG seed for reproducible games.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game interactively.
    Play,

    /// Show dataset and session statistics.
    Info,

    /// List every attribute and the values seen for it.
    Domains,

    /// Add a yes/no attribute to the global catalog.
    AddAttribute {
        /// Question text, e.g. "¿Jugó en la Premier League?".
        #[arg(long)]
        question: String,

        /// Attribute key. Derived from the question when omitted.
        #[arg(long)]
        key: Option<String>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.command {
        Commands::Play => {
            let engine = open_engine(&cli.data, config)?;
            play(engine)?;
        }

        Commands::Info => {
            let engine = open_engine(&cli.data, config)?;
            print!("{}", engine.info());
            println!("  data file:    {}", engine.store().path().display());
        }

        Commands::Domains => {
            let store = JsonFileStore::open(&cli.data)?;
            let entities = store.load_entities()?;
            for (attr, values) in value_domains(&entities, CORE_ATTRIBUTES) {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                println!("{attr}: {}", values.join(", "));
            }
        }

        Commands::AddAttribute { question, key } => {
            let mut store = JsonFileStore::open(&cli.data)?;
            let key = store.add_attribute(&question, key.as_deref())?;
            println!("Added attribute \"{key}\"");
        }

        Commands::Config => {
            let text = toml::to_string_pretty(&config).into_diagnostic()?;
            print!("{text}");
        }
    }

    Ok(())
}

fn open_engine(data: &Path, config: EngineConfig) -> Result<Engine<JsonFileStore>> {
    let store = JsonFileStore::open(data)?;
    Ok(Engine::new(store, config)?)
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, text: &str) -> Result<Option<String>> {
    print!("{text} ");
    io::stdout().flush().into_diagnostic()?;
    match lines.next() {
        Some(line) => Ok(Some(line.into_diagnostic()?.trim().to_string())),
        None => Ok(None),
    }
}

fn play(mut engine: Engine<JsonFileStore>) -> Result<()> {
    println!("Piensa en un futbolista. Responde s (sí), n (no), ? (no sé), u (deshacer), q (salir).");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let mut step = engine.next();
    loop {
        match step {
            Step::Ask { ref text, .. } => {
                let Some(input) = prompt(&mut lines, text)? else {
                    return Ok(());
                };
                let input = input.to_lowercase();
                step = match (input.as_str(), yes_no(&input)) {
                    (_, Some(true)) => engine.answer(Answer::Yes)?,
                    (_, Some(false)) => engine.answer(Answer::No)?,
                    ("?" | "ns" | "no sé", _) => engine.answer(Answer::Unknown)?,
                    ("u", _) => match engine.undo() {
                        Step::NothingToUndo => {
                            println!("No hay nada que deshacer.");
                            engine.next()
                        }
                        other => other,
                    },
                    ("q", _) => return Ok(()),
                    _ => {
                        println!("Respuesta no reconocida.");
                        step
                    }
                };
            }
            Step::Result { ref name, certain } => {
                let text = if certain {
                    format!("¡Es {name}!")
                } else {
                    format!("Creo que es {name}.")
                };
                println!("{text}");
                let hit = prompt(&mut lines, "¿Acerté? (s/n)")?;
                if hit.as_deref().and_then(yes_no) == Some(true) {
                    println!("¡Genial!");
                    return Ok(());
                }
                return learn(&mut engine, &mut lines);
            }
            Step::NoMatch => {
                println!("No conozco a nadie así.");
                return learn(&mut engine, &mut lines);
            }
            Step::NothingToUndo => step = engine.next(),
        }
    }
}

/// Offer to store the player's entity, pre-filled with the confirmed facts.
///
/// The player may fill in the core attributes and every catalog flag, and add
/// new yes/no features. Flags and features are saved as confirmation rules.
fn learn(
    engine: &mut Engine<JsonFileStore>,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<()> {
    let Some(name) = prompt(lines, "¿En quién pensabas? (vacío para salir)")? else {
        return Ok(());
    };
    if name.is_empty() {
        return Ok(());
    }
    let mut entity = Entity {
        name,
        ..engine.prefill()
    };

    println!("Completa lo que sepas; vacío mantiene el valor entre corchetes.");
    let domains = value_domains(engine.session().entities(), CORE_ATTRIBUTES);
    for attr in [POSITION, NATIONALITY, LEAGUE, CLUB] {
        let known: Vec<String> = domains
            .get(attr)
            .into_iter()
            .flatten()
            .filter(|v| !v.is_bool())
            .map(ToString::to_string)
            .collect();
        if !known.is_empty() {
            println!("  conocidos: {}", known.join(", "));
        }
        let current = entity.get(attr).map(ToString::to_string).unwrap_or_default();
        let Some(input) = prompt(lines, &format!("{} [{current}]:", pretty_attr(attr)))? else {
            return Ok(());
        };
        if !input.is_empty() {
            entity.attributes.insert(attr.to_string(), AttrValue::from(input));
        }
    }

    let flags: Vec<(String, String)> = engine
        .session()
        .catalog()
        .questions
        .iter()
        .map(|(k, q)| (k.clone(), q.clone()))
        .collect();
    for (attr, question) in flags {
        let current = entity.get(&attr).map(ToString::to_string).unwrap_or_default();
        let Some(input) = prompt(lines, &format!("{question} (s/n) [{current}]"))? else {
            return Ok(());
        };
        if let Some(flag) = yes_no(&input) {
            entity.attributes.insert(attr, AttrValue::Bool(flag));
        }
    }

    loop {
        let Some(question) = prompt(lines, "Nueva característica (pregunta, vacío para terminar):")?
        else {
            return Ok(());
        };
        if question.is_empty() {
            break;
        }
        let Some(flag) = prompt(lines, "¿Su respuesta? (s/n)")?.as_deref().and_then(yes_no) else {
            println!("Respuesta no reconocida.");
            continue;
        };
        let to_catalog = prompt(lines, "¿Añadir al catálogo? (s/n)")?
            .as_deref()
            .and_then(yes_no)
            .unwrap_or(false);

        let key = if to_catalog {
            match engine.add_attribute(&question, None) {
                Ok(key) => key,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            }
        } else {
            let key = slugify(&question);
            if key.is_empty() || entity.has(&key) || engine.session().catalog().contains(&key) {
                println!("Esa clave ya existe.");
                continue;
            }
            key
        };
        entity.attributes.insert(key.clone(), AttrValue::Bool(flag));
        entity
            .confirm
            .push(ConfirmRule::new(key, flag).with_question(question));
    }

    let facts = entity.attributes.len();
    engine.add_entity_with_rules(entity)?;
    println!("Guardado con {facts} atributos. ¡Gracias!");
    Ok(())
}

fn yes_no(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "s" | "si" | "sí" | "y" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
