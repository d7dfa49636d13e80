use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use ask_tui::app::App;
use ask_tui::client::AskClient;
use ask_tui::config::Config;
use ask_tui::controller::ConversationController;
use ask_tui::render::{AnswerRenderer, MarkdownRenderer};
use ask_tui::tui::{self, EventHandler, Tui};
use ask_tui::{handler, logging, ui};

#[derive(Parser)]
#[command(name = "ask")]
#[command(version, about = "Chat with a question-answering service from the terminal")]
struct Cli {
    /// Base URL of the answering service
    #[arg(long, value_name = "URL", env = "ASK_API_URL")]
    api_url: Option<String>,

    /// Where to write the log file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write the resolved configuration to the config file and exit
    #[arg(long)]
    init_config: bool,

    /// Ask a single question, print the answer and exit
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Ignoring config file: {}", err);
            Config::new()
        }
    };

    let log_path = config.resolve_log_file(cli.log_file.as_deref())?;
    let _log_guard = logging::init(&log_path)?;

    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    info!(api_url = %api_url, "starting");

    if cli.init_config {
        let saved = Config {
            api_url: Some(api_url),
            log_file: config.log_file.clone(),
        };
        let path = saved.save().context("failed to write config file")?;
        println!("Wrote {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let client = AskClient::new(&api_url);

    if let Some(question) = cli.ask {
        return ask_once(client, &question).await;
    }

    let mut app = App::new(client, api_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;
    result?;

    info!(messages = app.controller.state().history().len(), "session ended");
    Ok(ExitCode::SUCCESS)
}

async fn run(terminal: &mut Tui, app: &mut App<AskClient>) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await;
    }

    Ok(())
}

async fn ask_once(client: AskClient, question: &str) -> Result<ExitCode> {
    let mut controller = ConversationController::new(client);
    if !controller.submit(Some(question)) {
        eprintln!("Nothing to ask: the question is empty.");
        return Ok(ExitCode::FAILURE);
    }
    controller.wait_settled().await;

    let Some(answer) = controller.state().history().last() else {
        return Ok(ExitCode::FAILURE);
    };

    if answer.is_error {
        warn!("one-shot question failed");
        eprintln!("{}", answer.content);
        eprintln!("Service URL can be set with --api-url or ASK_API_URL.");
        return Ok(ExitCode::FAILURE);
    }

    for line in MarkdownRenderer.render(&answer.content) {
        println!("{}", line);
    }
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            println!("  Page {}", source.page);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_api_url_reads_environment() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "api_url")
            .unwrap();
        assert_eq!(arg.get_env(), Some(std::ffi::OsStr::new("ASK_API_URL")));
    }

    #[test]
    fn test_flag_parses_without_environment() {
        let cli = Cli::try_parse_from(["ask", "--api-url", "http://flag:1", "--ask", "q"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://flag:1"));
        assert_eq!(cli.ask.as_deref(), Some("q"));
    }
}
