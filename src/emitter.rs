use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::signal::SignalSource;
use crate::types::{SignalError, SignalSample};

pub const DEFAULT_EMIT_PERIOD: Duration = Duration::from_millis(1000);

/// Periodic producer of signal samples.
///
/// The emitter owns at most one timer. It does not run on its own: the
/// session awaits [`SignalEmitter::tick`] inside its event loop, so dropping
/// the timer in [`SignalEmitter::stop`] cancels any pending tick before
/// `stop` returns.
pub struct SignalEmitter {
    period: Duration,
    source: Box<dyn SignalSource>,
    ticker: Option<Interval>,
}

impl SignalEmitter {
    pub fn new(period: Duration, source: impl SignalSource + 'static) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            source: Box::new(source),
            ticker: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Starts ticking one period from now. Returns `false`, leaving the
    /// current timer untouched, if already running.
    pub fn start(&mut self) -> bool {
        if self.ticker.is_some() {
            return false;
        }
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        true
    }

    /// Returns `false` if the emitter was not running.
    pub fn stop(&mut self) -> bool {
        self.ticker.take().is_some()
    }

    /// Replaces any running timer with a new one whose first tick is one
    /// full period away.
    pub fn restart(&mut self) {
        self.stop();
        self.start();
    }

    /// Waits for the next tick and produces that tick's sample.
    ///
    /// Never completes while stopped. Cancel safe.
    pub async fn tick(&mut self) -> Result<SignalSample, SignalError> {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
        self.source.next_sample()
    }
}
