//! Política de reintentos con backoff exponencial
//!
//! Usada por los pasos secundarios de una transición (sincronización del
//! camión y del estado espejo de la solicitud).

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::utils::errors::{AppError, AppResult};

/// Configuración de reintentos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Sin reintentos, un único intento
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Espera antes del intento `attempt` (1-based, el primero no espera)
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 2).min(8);
        let base = self.base_delay * factor;
        let jitter_ms = rand::thread_rng().gen_range(0..=self.base_delay.as_millis() as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }

    /// Ejecuta `op` hasta que tenga éxito o se agoten los intentos.
    ///
    /// Devuelve el último error junto con el número de intentos realizados.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, (AppError, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            tokio::time::sleep(self.delay_before(attempt)).await;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => return Err((e, attempt)),
                Err(e) => {
                    tracing::warn!("🔁 {} falló (intento {}/{}): {}", label, attempt, self.attempts, e);
                    attempt += 1;
                }
            }
        }
    }
}
