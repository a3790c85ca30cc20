use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::{env, fs, process};
use wysiwyg_sync_config::EditorConfig;
use wysiwyg_sync_engine::paste::{TEXT_HTML, TEXT_PLAIN};
use wysiwyg_sync_engine::{ClipboardData, EditingSession, EditorEvent, PasteEvent};

const USAGE: &str = "<markup-file> [--config <path>] [--paste <file>] [--type <text>] [--no-keywords]";

#[derive(Debug, Default, PartialEq)]
struct Options {
    input: PathBuf,
    config: Option<PathBuf>,
    paste: Option<PathBuf>,
    typed: Option<String>,
    no_keywords: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut input = None;
    let mut options = Options::default();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => options.config = Some(PathBuf::from(value_for(arg, args.next())?)),
            "--paste" => options.paste = Some(PathBuf::from(value_for(arg, args.next())?)),
            "--type" => options.typed = Some(value_for(arg, args.next())?.to_string()),
            "--no-keywords" => options.no_keywords = true,
            flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
            path if input.is_none() => input = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{extra}'"),
        }
    }
    options.input = input.context("no markup file given")?;
    Ok(options)
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> Result<&'a str> {
    value
        .map(String::as_str)
        .with_context(|| format!("{flag} needs a value"))
}

fn load_config(explicit: Option<&Path>) -> Result<EditorConfig> {
    match explicit {
        Some(path) => {
            let path = EditorConfig::expand_path(path);
            EditorConfig::load_from_path(&path)?
                .with_context(|| format!("config file '{}' does not exist", path.display()))
        }
        None => {
            log::info!("Config path: {}", EditorConfig::config_path().display());
            Ok(EditorConfig::load()?.unwrap_or_default())
        }
    }
}

/// Clipboard contents for a pasted file. `.html` files are offered as
/// markup, everything else as plain text.
fn clipboard_for(path: &Path) -> Result<ClipboardData> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let is_html = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    let data = ClipboardData::new().with_format(TEXT_PLAIN, &content);
    Ok(if is_html {
        data.with_format(TEXT_HTML, &content)
    } else {
        data
    })
}

fn run(options: &Options) -> Result<String> {
    let mut config = load_config(options.config.as_deref())?;
    if options.no_keywords {
        config.keywords_enabled = false;
    }
    let flush_after = config.value_changed_delay_ms;

    let markup = fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read '{}'", options.input.display()))?;
    let mut session = EditingSession::with_value(config, &markup);
    log::info!(
        "Loaded '{}' with {} keyword(s)",
        options.input.display(),
        session.keyword_table().len()
    );
    session.move_caret_to_end();

    if let Some(path) = &options.paste {
        let outcome = session.paste(PasteEvent::Clipboard(clipboard_for(path)?))?;
        log::info!("Pasted '{}': {outcome:?}", path.display());
    }
    if let Some(text) = &options.typed {
        session.type_text(text);
    }
    session.advance(flush_after)?;

    for event in session.take_events() {
        match event {
            EditorEvent::ValueChanged { raw_value } => {
                log::debug!("value changed to {} bytes", raw_value.len())
            }
            EditorEvent::CommandFailed { message } => log::warn!("{message}"),
            other => log::trace!("{other:?}"),
        }
    }

    let value = session.value();
    session.destroy();
    Ok(value)
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("wysiwyg-sync", String::as_str);

    let options = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: {program} {USAGE}");
            process::exit(1);
        }
    };

    match run(&options) {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
