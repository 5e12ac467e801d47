use clap::Parser;
use searchy::core::config::Config;
use searchy::core::error::Result;
use searchy::ui::menu::{ListingMenu, Menu, ResultPresenter, TerminalMenu};
use searchy::ui::prompt::{
    KeywordCompleter, LineReader, PlainLines, PromptStyle, TerminalPrompt,
};
use searchy::{load_index, Cli, Session};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.to_config()?;
    let index = load_index(&config)?;
    let mut session = Session::new(index, presenter(&config)?, config.limit);

    match &config.query {
        Some(query) => session.run_query(query)?,
        None => {
            let mut reader = line_reader();
            session.run_interactive(reader.as_mut(), &mut io::stdout())?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("searchy={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// The full-screen menu needs a terminal; otherwise results are listed
fn presenter(config: &Config) -> Result<ResultPresenter<Box<dyn Menu>, io::Stdout>> {
    let menu: Box<dyn Menu> = if io::stdout().is_terminal() {
        Box::new(TerminalMenu::new(&config.preview)?)
    } else {
        Box::new(ListingMenu::new(io::stdout()))
    };
    Ok(ResultPresenter::new(menu, io::stdout()))
}

fn line_reader() -> Box<dyn LineReader> {
    if io::stdin().is_terminal() {
        Box::new(TerminalPrompt::new(
            PromptStyle::default(),
            KeywordCompleter::default(),
        ))
    } else {
        Box::new(PlainLines::new(io::stdin().lock()))
    }
}
