// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `serve` command: wire every component and run the worker pool
//! until a shutdown signal arrives.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ostra_config::OstraConfig;
use ostra_core::OstraError;
use ostra_engine::{ConversationEngine, Worker};
use ostra_identity::IdentityResolver;
use ostra_llm::LlmGateway;
use ostra_storage::SqliteStorage;
use ostra_telegram::TelegramApi;
use ostra_tools::ToolExecutor;

pub async fn run(config: OstraConfig) -> Result<(), OstraError> {
    let storage = SqliteStorage::open(&config.storage).await?;
    let telegram = TelegramApi::new(&config.telegram)?;
    let gateway = Arc::new(LlmGateway::from_config(&config.llm)?);

    let executor = ToolExecutor::new(
        Arc::new(storage.clone()),
        Arc::new(storage.clone()),
        Arc::new(telegram.clone()),
    );
    let engine = Arc::new(
        ConversationEngine::new(gateway, executor)
            .with_generation(config.llm.max_tokens, config.llm.temperature),
    );
    let resolver = Arc::new(IdentityResolver::new(Arc::new(storage.clone())));

    let cancel = CancellationToken::new();
    let mut handles = Vec::with_capacity(config.agent.workers);
    for i in 0..config.agent.workers {
        let worker = Worker::new(
            storage.database().clone(),
            config.queue.clone(),
            format!("{}-{i}", config.agent.name),
            resolver.clone(),
            engine.clone(),
            Arc::new(telegram.clone()),
        );
        let token = cancel.clone();
        handles.push(tokio::spawn(async move { worker.run(token).await }));
    }
    info!(workers = config.agent.workers, "ostra serving");

    tokio::signal::ctrl_c().await.map_err(|e| {
        OstraError::Internal(format!("failed to listen for shutdown signal: {e}"))
    })?;
    info!("shutdown signal received");
    cancel.cancel();

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "worker exited with error"),
            Err(e) => error!(error = %e, "worker task panicked"),
        }
    }

    storage.close().await?;
    info!("ostra stopped");
    Ok(())
}
