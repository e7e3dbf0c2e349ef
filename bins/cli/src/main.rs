//! Cordstore CLI
//!
//! Main entry point: stores, fetches and deletes files through the task queue.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use bytes::Bytes;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cordstore_catalog::FileCatalog;
use cordstore_channel::RestChannelClient;
use cordstore_core::StorageService;
use cordstore_core::catalog::ObjectCatalog;
use cordstore_core::queue::{StorageWorker, storage_task_queue, verify_channel};
use cordstore_core::storage::StorageError;
use cordstore_shared::{AppConfig, ErrorKind, ObjectId};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match error_kind(&e) {
            Some(kind) => {
                eprintln!("error[{kind}]: {e:#}");
                ExitCode::from(kind.exit_code())
            }
            None => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Classify a failure that came out of the storage engine.
fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<StorageError>().map(StorageError::kind)
}

async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cordstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let token = CancellationToken::new();
    let channel = Arc::new(RestChannelClient::new(&config.channel, token.clone())?);
    let catalog = Arc::new(FileCatalog::open(&config.catalog.path).await?);

    match cli.command {
        Command::Check => {
            let identity = verify_channel(channel.as_ref()).await?;
            println!("connected as {identity}");
            return Ok(());
        }
        Command::Ls => return list(catalog.as_ref()).await,
        _ => {}
    }

    verify_channel(channel.as_ref()).await?;

    let (queue, receiver) = storage_task_queue();
    let worker = StorageWorker::new(
        channel,
        Arc::clone(&catalog),
        config.channel.channel_id,
        config.storage.clone(),
    );
    let worker_token = token.clone();
    let worker_task = tokio::spawn(async move { worker.run(receiver, worker_token).await });
    info!(channel_id = %config.channel.channel_id, "Storage worker spawned");

    let service = StorageService::new(queue);
    let result = tokio::select! {
        result = execute(cli.command, &service, catalog.as_ref()) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            Err(anyhow!("interrupted"))
        }
    };

    token.cancel();
    worker_task.await.context("storage worker crashed")?;
    result
}

async fn execute(
    command: Command,
    service: &StorageService,
    catalog: &FileCatalog,
) -> anyhow::Result<()> {
    match command {
        Command::Put { file, name, path } => {
            let name = match name {
                Some(name) => name,
                None => file_name_of(&file)?,
            };
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let size = content.len();

            let (object_id, message_ids) =
                service.upload_file(&path, &name, Bytes::from(content)).await?;
            println!(
                "{object_id}  {name}  {size} bytes in {} messages",
                message_ids.len()
            );
        }
        Command::Get { object, out } => {
            let object_id = resolve(catalog, &object).await?;
            let stored = service.get_file(object_id).await?;
            let out = match out {
                Some(out) => out,
                None => PathBuf::from(file_name_of(Path::new(&stored.name))?),
            };
            tokio::fs::write(&out, &stored.content)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("{}  {} bytes", out.display(), stored.content.len());
        }
        Command::Rm { object } => {
            let object_id = resolve(catalog, &object).await?;
            let summary = service.delete_file(object_id).await?;
            println!(
                "{object_id}  deleted {} messages ({} already gone)",
                summary.deleted, summary.already_absent
            );
        }
        command @ (Command::Ls | Command::Check) => {
            bail!("{command:?} does not go through the storage queue")
        }
    }
    Ok(())
}

async fn list(catalog: &FileCatalog) -> anyhow::Result<()> {
    let objects = catalog.list_objects().await?;
    if objects.is_empty() {
        println!("no objects in {}", catalog.path().display());
        return Ok(());
    }
    for record in objects {
        println!(
            "{}  {:>12}  {:>4} msgs  {}  {}{}",
            record.object_id,
            record.size,
            record.message_ids.len(),
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.name,
            if record.corrupted { "  [corrupted]" } else { "" },
        );
    }
    Ok(())
}

/// Accept either an object id or a stored name.
async fn resolve(catalog: &FileCatalog, object: &str) -> anyhow::Result<ObjectId> {
    if let Ok(object_id) = object.parse::<ObjectId>() {
        return Ok(object_id);
    }
    catalog
        .find_by_name(object)
        .await?
        .map(|record| record.object_id)
        .ok_or_else(|| anyhow!("no object named '{object}'"))
}

fn file_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("cannot derive a name from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_of_storage_failure() {
        let err = anyhow::Error::from(StorageError::not_found("object not found"))
            .context("failed to fetch");
        assert_eq!(error_kind(&err), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_error_kind_of_other_failure() {
        assert_eq!(error_kind(&anyhow!("no object named 'x'")), None);
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of(Path::new("/tmp/disk.img")).unwrap(), "disk.img");
        assert!(file_name_of(Path::new("/")).is_err());
    }
}
