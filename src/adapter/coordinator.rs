// src/adapter/coordinator.rs
// Poll loop driving the sheet order pipeline

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::application::dto::CycleReport;
use crate::application::usecase::SheetOrderPipeline;

/// Totals across every cycle a coordinator ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub cycles: usize,
    pub failed_cycles: usize,
    pub placed: usize,
    pub invalid: usize,
    pub failed_rows: usize,
}

impl PollSummary {
    fn absorb(&mut self, report: &CycleReport) {
        self.placed += report.placed;
        self.invalid += report.invalid;
        self.failed_rows += report.failed;
    }
}

pub struct PollingCoordinator {
    pipeline: SheetOrderPipeline,
    poll_interval: Duration,
    running: bool,
}

impl PollingCoordinator {
    pub fn new(pipeline: SheetOrderPipeline, poll_interval: Duration) -> Self {
        Self {
            pipeline,
            poll_interval,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Poll until `shutdown` resolves.
    ///
    /// `shutdown` is polled once before the first cycle so signal listeners
    /// are registered from the start. It is acted on only between cycles, so
    /// a row whose order was sent always gets its write-back attempt.
    pub async fn run_until<F>(&mut self, shutdown: F) -> PollSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = PollSummary::default();
        self.running = true;
        log::info!(
            "Polling coordinator started, interval {}s",
            self.poll_interval.as_secs_f64()
        );

        let requested = tokio::select! {
            biased;
            _ = &mut shutdown => true,
            _ = std::future::ready(()) => false,
        };
        if requested {
            log::info!("Shutdown requested before the first cycle");
        } else {
            self.poll_cycles(shutdown.as_mut(), &mut summary).await;
        }

        self.running = false;
        log::info!(
            "Polling coordinator stopped after {} cycle(s), {} order(s) placed",
            summary.cycles,
            summary.placed
        );
        summary
    }

    async fn poll_cycles<F>(&mut self, mut shutdown: Pin<&mut F>, summary: &mut PollSummary)
    where
        F: Future<Output = ()>,
    {
        loop {
            summary.cycles += 1;
            match self.pipeline.run_cycle().await {
                Ok(report) => summary.absorb(&report),
                Err(e) => {
                    summary.failed_cycles += 1;
                    log::error!("Cycle {} failed: {}", summary.cycles, e);
                }
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
