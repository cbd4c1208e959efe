//! A simple program that chats with an OpenAI-compatible service in the
//! terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use chatroom::TranscriptView;
use chatroom_core::{ChatRoomBuilder, Output, Transcript};
use chatroom_model::Role;
use chatroom_openai_service::{OpenAIChatService, OpenAIConfigBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum RoomEvent {
    Idle,
    TranscriptChanged(Transcript),
    Error(String),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };
    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config = config.with_model(model);
    }
    if let Ok(prompt) = env::var("CHATROOM_SYSTEM_PROMPT") {
        config = config.with_system_prompt(prompt);
    }
    let config = config.build();
    debug!("using {config:?}");
    let service = OpenAIChatService::new(config);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let room = ChatRoomBuilder::with_chat_service(service)
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(RoomEvent::Idle).ok();
            }
        })
        .build();
    room.bind_output(
        Output::new()
            .on_transcript_changed({
                let event_tx = event_tx.clone();
                move |transcript| {
                    event_tx
                        .send(RoomEvent::TranscriptChanged(transcript.clone()))
                        .ok();
                }
            })
            .on_error(move |description| {
                event_tx.send(RoomEvent::Error(description.to_owned())).ok();
            }),
    );

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut view = TranscriptView::new();

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        room.submit(line.trim_end_matches(['\r', '\n']));

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Waiting for reply...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            progress_bar = None;

            match event {
                RoomEvent::TranscriptChanged(transcript) => {
                    let changes = view.reconcile(&transcript);
                    if !changes.removed.is_empty() {
                        println!(
                            "{}",
                            format!(
                                "({} earlier messages were replaced)",
                                changes.removed.len()
                            )
                            .dimmed()
                        );
                    }
                    // User messages are already on screen as typed.
                    for msg in changes.added {
                        if msg.role() == Role::Assistant {
                            println!(
                                "{}🤖 {}",
                                BAR_CHAR.bright_cyan(),
                                msg.content().bright_white()
                            );
                        }
                    }
                }
                RoomEvent::Error(description) => {
                    println!(
                        "{}⚠️  {}",
                        BAR_CHAR.bright_red(),
                        description.red()
                    );
                }
                RoomEvent::Idle => {
                    break;
                }
            }
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
