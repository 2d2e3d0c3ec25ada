use std::sync::Arc;

use chat_client::{
    config::load_config, transport::ReqwestTransport, ChatService, ChatSession, Message,
    MessageKind, MessageSource, SendOutcome,
};
use common_types::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const HELP: &str = "\
Type a question to ask the research agent, or:
  /local <text>     ask the local endpoint
  /remote <text>    ask the remote endpoint
  /research <text>  ask the research agent
  /retry            replay the last failed request
  /clear            clear the conversation
  /quit             exit";

/// A parsed line of input
enum Command<'a> {
    Send(MessageSource, &'a str),
    Retry,
    Clear,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    match head {
        "/local" => Command::Send(MessageSource::Local, rest),
        "/remote" => Command::Send(MessageSource::Remote, rest),
        "/research" => Command::Send(MessageSource::Bedrock, rest),
        "/retry" => Command::Retry,
        "/clear" => Command::Clear,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        // Enter defaults to the research agent
        _ => Command::Send(MessageSource::Bedrock, line),
    }
}

fn print_message(message: &Message) {
    let who = match (message.kind, message.source) {
        (MessageKind::User, _) => "you".to_string(),
        (MessageKind::Assistant, Some(source)) => format!("assistant ({source})"),
        (MessageKind::Assistant, None) => "assistant".to_string(),
        (MessageKind::Error, _) => "error".to_string(),
    };
    println!(
        "[{}] {who}:\n{}\n",
        message.timestamp.format("%H:%M:%S"),
        message.content
    );
}

fn print_new_messages(session: &ChatSession, seen: &mut usize) {
    let messages = session.state().messages();
    for message in messages.iter().skip(*seen) {
        print_message(message);
    }
    *seen = messages.len();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Invalid configuration fails before the session becomes interactive
    let env_config = AppConfig::from_env()?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let config = load_config(transport.as_ref(), env_config).await;
    info!(app_url = %config.app_url, "Starting research chat");

    let mut session = ChatSession::new(ChatService::new(config, transport));
    let mut seen = 0;

    println!("Financial Research Assistant\n{HELP}\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match parse_command(&line) {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Clear => {
                session.clear();
                seen = 0;
                println!("Chat history cleared");
                continue;
            }
            Command::Retry => session.retry().await,
            Command::Send(endpoint, text) => {
                session.set_input(text);
                session.send_current(endpoint).await
            }
        };

        print_new_messages(&session, &mut seen);

        match outcome {
            SendOutcome::Failed(info) if session.retryable_request().is_some() => {
                println!("! {} (type /retry to try again)", info.user_friendly_message);
            }
            SendOutcome::Failed(info) => println!("! {}", info.user_friendly_message),
            SendOutcome::Ignored | SendOutcome::Replied => {}
        }
    }

    Ok(())
}
