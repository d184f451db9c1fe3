//! Refresco periódico del tablero
//!
//! Cada cuenta puede tener una tarea que recarga su tablero cada N segundos.
//! La tarea vive lo mismo que su `BoardPoller`: `stop()` o soltar el handle
//! la termina.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::board::{ClientBoard, TruckerBoard};
use crate::clients::LoadBoardBackend;
use crate::models::Session;
use crate::utils::errors::{AppError, AppResult};

/// Tablero compartido que refresca el poller
#[derive(Clone)]
pub enum SharedBoard {
    Trucker(Arc<RwLock<TruckerBoard>>),
    Client(Arc<RwLock<ClientBoard>>),
}

pub async fn refresh_trucker_board(
    backend: &dyn LoadBoardBackend,
    session: &Session,
    board: &RwLock<TruckerBoard>,
) -> AppResult<()> {
    let (pending, bids) = tokio::try_join!(
        backend.pending_requests(session),
        backend.trucker_bids(session, None)
    )?;

    let mut board = board.write().await;
    board.replace_pending(pending);
    board.replace_bids(bids);
    Ok(())
}

pub async fn refresh_client_board(
    backend: &dyn LoadBoardBackend,
    session: &Session,
    board: &RwLock<ClientBoard>,
) -> AppResult<()> {
    let bids = backend.client_bids(session, None).await?;
    board.write().await.replace(bids);
    Ok(())
}

pub async fn refresh(backend: &dyn LoadBoardBackend, session: &Session, board: &SharedBoard) -> AppResult<()> {
    match board {
        SharedBoard::Trucker(board) => refresh_trucker_board(backend, session, board).await,
        SharedBoard::Client(board) => refresh_client_board(backend, session, board).await,
    }
}

/// Handle de la tarea de refresco
pub struct BoardPoller {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BoardPoller {
    /// Lanza la tarea; el primer refresco es inmediato
    pub fn spawn(backend: Arc<dyn LoadBoardBackend>, session: Session, board: SharedBoard, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!("🔄 Poller iniciado para {} cada {:?}", session.account_id, period);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        match refresh(backend.as_ref(), &session, &board).await {
                            Ok(()) => tracing::debug!("🔄 Tablero de {} actualizado", session.account_id),
                            Err(AppError::Unauthenticated(msg)) => {
                                tracing::warn!("🔒 Poller de {} detenido: {}", session.account_id, msg);
                                break;
                            }
                            Err(e) => tracing::warn!("⚠️ Refresco fallido para {}: {}", session.account_id, e),
                        }
                    }
                }
            }
            tracing::info!("⏹️ Poller de {} detenido", session.account_id);
        });

        Self {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Detiene la tarea y espera a que termine
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for BoardPoller {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
