use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use docchat_types::{CreateThreadData, UpdateThreadData};

use crate::state::CliState;

const UPLOAD_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn list_folders(state: &CliState) -> anyhow::Result<()> {
    let folders = state.context.api().folders().await?;
    state.print(&folders, |folder| format!("{}  {}", folder.id, folder.name))
}

pub async fn create_folder(state: &CliState, name: &str) -> anyhow::Result<()> {
    let folder = state.context.api().create_folder(name).await?;
    println!("{}", folder.id);
    Ok(())
}

pub async fn rename_folder(state: &CliState, folder_id: &str, name: &str) -> anyhow::Result<()> {
    state.context.api().update_folder(folder_id, name).await?;
    Ok(())
}

pub async fn delete_folder(state: &CliState, folder_id: &str) -> anyhow::Result<()> {
    state.context.api().delete_folder(folder_id).await?;
    Ok(())
}

/// Threads of one folder, or the recent threads across all folders
pub async fn list_threads(state: &CliState, folder_id: Option<&str>) -> anyhow::Result<()> {
    match folder_id {
        Some(folder_id) => {
            let threads = state.context.api().folder_threads(folder_id).await?;
            state.print(&threads, |thread| format!("{}  {}", thread.id, thread.name))
        }
        None => {
            let threads = state.context.api().recent_threads().await?;
            state.print(&threads, |thread| {
                format!(
                    "{}  {}  ({})",
                    thread.id,
                    thread.name,
                    thread.folder_name.as_deref().unwrap_or("-")
                )
            })
        }
    }
}

pub async fn create_thread(state: &CliState, folder_id: &str, name: &str) -> anyhow::Result<()> {
    let data = CreateThreadData {
        folder_id: folder_id.to_string(),
        thread_name: name.to_string(),
    };
    let thread = state.context.api().create_thread(&data).await?;
    println!("{}", thread.id);
    Ok(())
}

pub async fn rename_thread(state: &CliState, thread_id: &str, name: &str) -> anyhow::Result<()> {
    let data = UpdateThreadData {
        thread_id: thread_id.to_string(),
        new_name: name.to_string(),
    };
    state.context.api().update_thread(&data).await?;
    Ok(())
}

pub async fn delete_thread(state: &CliState, thread_id: &str) -> anyhow::Result<()> {
    state.context.api().delete_thread(thread_id).await?;
    Ok(())
}

pub async fn list_files(state: &CliState, folder_id: &str) -> anyhow::Result<()> {
    let files = state.context.api().folder_files(folder_id).await?;
    state.print(&files, |file| format!("{}  {}  {}", file.id, file.filename, file.status))
}

/// Upload a local document, optionally waiting until ingestion finishes
pub async fn upload(state: &CliState, folder_id: &str, path: &Path, wait: bool) -> anyhow::Result<()> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("no file name in {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let uploaded = state
        .context
        .api()
        .upload_file(folder_id, filename, bytes)
        .await?;
    println!("{}  {}", uploaded.file_id, uploaded.status);

    if wait {
        loop {
            tokio::time::sleep(UPLOAD_POLL_INTERVAL).await;
            let status = state.context.client().file_status(&uploaded.file_id).await?;
            if !status.is_pending() {
                println!("{}  {}", status.file_id, status.status);
                break;
            }
            tracing::debug!("{} still processing", status.filename);
        }
    }
    Ok(())
}

pub async fn delete_file(state: &CliState, file_id: &str) -> anyhow::Result<()> {
    state.context.api().delete_file(file_id).await?;
    Ok(())
}

pub async fn list_collaborators(state: &CliState, folder_id: &str) -> anyhow::Result<()> {
    let collaborators = state.context.api().folder_collaborators(folder_id).await?;
    state.print(&collaborators, |c| {
        let owner = if c.is_owner { "  (owner)" } else { "" };
        format!("{}  {}{}", c.email, c.name.as_deref().unwrap_or("-"), owner)
    })
}

pub async fn share(state: &CliState, folder_id: &str, email: &str) -> anyhow::Result<()> {
    state.context.api().add_collaborator(folder_id, email).await?;
    Ok(())
}

pub async fn unshare(state: &CliState, folder_id: &str, email: &str) -> anyhow::Result<()> {
    state.context.api().remove_collaborator(folder_id, email).await?;
    Ok(())
}
