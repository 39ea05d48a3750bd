use super::{App, AppCommand, AppEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Queued command with its reply channel
struct Envelope {
    command: AppCommand,
    reply: oneshot::Sender<AppEvent>,
}

/// Handle to an [`App`] running on its own task
///
/// Commands are handled one at a time, in the order they were sent.
pub struct AppHandle {
    app: Arc<App>,
    tx: mpsc::UnboundedSender<Envelope>,
    handle: Option<JoinHandle<()>>,
}

impl AppHandle {
    pub(super) fn spawn(app: App) -> Self {
        let app = Arc::new(app);
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let worker = Arc::clone(&app);
        let handle = tokio::spawn(async move {
            while let Some(Envelope { command, reply }) = rx.recv().await {
                let event = worker.dispatch(command).await;
                if reply.send(event).is_err() {
                    log::debug!("Command sender went away before the reply");
                }
            }
            log::debug!("App worker stopped");
        });

        Self { app, tx, handle: Some(handle) }
    }

    /// Shared state, for reads that need no command
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Queue a command and wait for its result
    pub async fn send(&self, command: AppCommand) -> anyhow::Result<AppEvent> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .map_err(|_| anyhow::anyhow!("App worker is not running"))?;
        rx.await.map_err(|e| anyhow::anyhow!("Command dropped before completion: {}", e))
    }

    /// Finish queued commands, then stop the worker
    pub async fn shutdown(mut self) {
        drop(self.tx);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorConfig;
    use crate::forms::FormSettings;
    use crate::session::{MemoryClientStore, Theme};
    use crate::testing::{MemoryBackend, ScriptedTransport};

    async fn handle() -> AppHandle {
        let app = App::new(
            Arc::new(ScriptedTransport::new(MemoryBackend::new())),
            Arc::new(MemoryClientStore::new()),
            CoordinatorConfig::default(),
            FormSettings::default(),
        )
        .await
        .unwrap();
        app.spawn()
    }

    #[tokio::test]
    async fn test_commands_are_answered_in_order() {
        let handle = handle().await;

        let first = handle.send(AppCommand::SetTheme(Theme::Dark)).await.unwrap();
        let second = handle.send(AppCommand::SignOut).await.unwrap();

        assert!(matches!(first, AppEvent::PreferencesChanged(p) if p.theme == Theme::Dark));
        assert_eq!(second, AppEvent::SignedOut);
        assert_eq!(handle.app().preferences().theme, Theme::Dark);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_queued_commands_finish_before_shutdown() {
        let handle = handle().await;
        let id = handle.app().notifications().info("queued");

        let pending = {
            let tx = handle.tx.clone();
            let (reply, rx) = oneshot::channel();
            tx.send(Envelope { command: AppCommand::Dismiss(id), reply }).unwrap();
            rx
        };
        handle.shutdown().await;

        assert_eq!(pending.await.unwrap(), AppEvent::Dismissed { id, found: true });
    }
}
