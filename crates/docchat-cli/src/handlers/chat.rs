use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use docchat_sync::{ChatSession, Notice, NoticeLevel, SyncError};
use docchat_types::{Message, Role};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::state::CliState;

/// Send one message to a thread and print the streamed answer
pub async fn ask(state: &CliState, thread_id: &str, message: &str) -> anyhow::Result<()> {
    let chat = open(state, thread_id).await?;
    let notices = spawn_notice_printer(state.context.notifier().subscribe());

    let result = send_and_render(&chat, message).await;
    notices.abort();
    result
}

/// Interactive chat on one thread until `/quit` or end of input
pub async fn repl(state: &CliState, thread_id: &str) -> anyhow::Result<()> {
    let chat = open(state, thread_id).await?;
    for message in chat.messages() {
        print_message(&message);
    }

    let notices = spawn_notice_printer(state.context.notifier().subscribe());
    let poller = state.context.poll_thread(&chat);

    println!("Type a message, /refresh to reload, /quit to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/refresh" => {
                if chat.refresh().await? {
                    for message in chat.messages() {
                        print_message(&message);
                    }
                }
            }
            _ => {
                // Send the line as typed; the server does its own trimming
                if let Err(e) = send_and_render(&chat, &line).await {
                    if is_session_end(&e) {
                        eprintln!("Session expired. Run `docchat login` again.");
                        break;
                    }
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    poller.stop();
    notices.abort();
    Ok(())
}

async fn open(state: &CliState, thread_id: &str) -> anyhow::Result<ChatSession> {
    let chat = state.context.chat_session();
    chat.open_thread(thread_id)
        .await?
        .with_context(|| format!("thread {} not found", thread_id))?;
    Ok(chat)
}

async fn send_and_render(chat: &ChatSession, message: &str) -> anyhow::Result<()> {
    let printed = Arc::new(AtomicUsize::new(0));
    let renderer = spawn_renderer(chat.clone(), Arc::clone(&printed));

    print!("AI: ");
    let _ = std::io::stdout().flush();
    let outcome = chat.send(message).await;
    renderer.abort();

    // Anything streamed after the renderer's last wake-up
    if let Some(answer) = chat.messages().iter().rev().find(|m| m.is_ai()) {
        let done = printed.load(Ordering::Relaxed);
        if let Some(rest) = answer.content.get(done..) {
            print!("{}", rest);
        }
        println!();
        print_citations(answer);
    } else {
        println!();
    }

    let summary = outcome?;
    tracing::debug!(
        "Turn finished: {} events, {} chars, done={}",
        summary.events,
        summary.content_chars,
        summary.saw_done
    );
    Ok(())
}

/// Print streamed deltas of the in-flight answer as they arrive
fn spawn_renderer(chat: ChatSession, printed: Arc<AtomicUsize>) -> JoinHandle<()> {
    let mut updates = chat.watch();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let delta = {
                let sync = chat.sync().lock();
                let Some(session) = sync.session() else {
                    continue;
                };
                let done = printed.load(Ordering::Relaxed);
                match session.content.get(done..) {
                    Some(rest) if !rest.is_empty() => rest.to_string(),
                    _ => continue,
                }
            };

            print!("{}", delta);
            let _ = std::io::stdout().flush();
            printed.fetch_add(delta.len(), Ordering::Relaxed);
        }
    })
}

fn spawn_notice_printer(mut notices: broadcast::Receiver<Notice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => print_notice(&notice),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Error => eprintln!("\n[error] {}", notice.text),
        NoticeLevel::Success => eprintln!("[ok] {}", notice.text),
        NoticeLevel::Info => eprintln!("[info] {}", notice.text),
    }
}

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "You",
        Role::Ai => "AI",
    };
    println!("{}: {}", who, message.content);
    print_citations(message);
}

fn print_citations(message: &Message) {
    for citation in message.citations() {
        println!("    [{}] {} p.{}", citation.id, citation.title, citation.page);
    }
}

fn is_session_end(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<SyncError>()
        .is_some_and(SyncError::is_unauthorized)
}
