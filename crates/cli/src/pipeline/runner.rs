//! Drives an orchestrator until a stop condition fires.

use std::fmt;
use std::time::{Duration, Instant};

use contracts::{ConnectionState, MessageGateway, PersistenceGateway};
use ingestion::IngestionOrchestrator;
use tracing::{error, info, warn};

use super::PipelineStats;
use crate::error::Result;

/// How often gateway state is checked while running
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl+C or SIGTERM
    Signal,
    /// Configured timeout elapsed
    Timeout,
    /// Gateway has nothing more to deliver
    Finished,
    /// Gateway connection failed
    GatewayFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal => f.write_str("shutdown signal"),
            Self::Timeout => f.write_str("timeout"),
            Self::Finished => f.write_str("end of input"),
            Self::GatewayFailed(code) => write!(f, "gateway failure ({code})"),
        }
    }
}

/// Start the orchestrator, wait for a stop condition, then shut it down
///
/// `is_finished` lets finite gateways (replay) end the run on their own.
pub async fn drive<G, P, F>(
    mut orchestrator: IngestionOrchestrator<G, P>,
    timeout: Option<Duration>,
    is_finished: F,
) -> Result<PipelineStats>
where
    G: MessageGateway,
    P: PersistenceGateway + Send + 'static,
    F: Fn(&G) -> bool,
{
    let started = Instant::now();
    orchestrator.start().await?;
    info!(timeout_secs = ?timeout.map(|t| t.as_secs()), "Pipeline running");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let deadline = async {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(STATE_POLL_INTERVAL);

    let stop_reason = loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping pipeline...");
                break StopReason::Signal;
            }
            _ = &mut deadline => {
                info!("Timeout reached, stopping pipeline");
                break StopReason::Timeout;
            }
            _ = ticker.tick() => {
                if let ConnectionState::Failed { code } = orchestrator.gateway().state() {
                    error!(code = %code, "Gateway failed, stopping pipeline");
                    break StopReason::GatewayFailed(code);
                }
                if is_finished(orchestrator.gateway()) {
                    info!("Input exhausted, stopping pipeline");
                    break StopReason::Finished;
                }
            }
        }
    };

    orchestrator.stop().await;
    let stats = PipelineStats {
        store: orchestrator
            .store()
            .map(|store| store.name().to_string())
            .unwrap_or_default(),
        duration: started.elapsed(),
        snapshot: orchestrator.metrics().snapshot(),
        summary: orchestrator.summary(),
        stop_reason,
    };
    orchestrator.shutdown().await;

    Ok(stats)
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::IngestionConfig;
    use classifier::RoadClassifier;
    use hub_gateway::LogHubGateway;
    use ingestion::{sample_payload, MockMessageGateway};

    #[tokio::test]
    async fn test_stops_when_finished() {
        let gateway = MockMessageGateway::new("t");
        let injector = gateway.injector();
        let orchestrator = IngestionOrchestrator::new(
            gateway,
            LogHubGateway::default(),
            RoadClassifier::new(50.0),
            IngestionConfig::default(),
        );

        let stats = drive(orchestrator, None, move |_| {
            for (i, z) in [0.0, 100.0, 0.0].into_iter().enumerate() {
                injector.deliver(sample_payload(z, i as u64));
            }
            true
        })
        .await
        .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Finished);
        assert_eq!(stats.snapshot.bumps, 1);
        assert_eq!(stats.snapshot.records_saved, 1);
        assert_eq!(stats.summary.unwrap().bumps, 1);
    }

    #[tokio::test]
    async fn test_stops_on_timeout() {
        let orchestrator = IngestionOrchestrator::new(
            MockMessageGateway::new("t"),
            LogHubGateway::default(),
            RoadClassifier::default(),
            IngestionConfig::default(),
        );

        let stats = drive(orchestrator, Some(Duration::from_millis(50)), |_| false)
            .await
            .unwrap();
        assert_eq!(stats.stop_reason, StopReason::Timeout);
    }

    #[tokio::test]
    async fn test_refused_gateway_is_an_error() {
        let orchestrator = IngestionOrchestrator::new(
            MockMessageGateway::refusing("t"),
            LogHubGateway::default(),
            RoadClassifier::default(),
            IngestionConfig::default(),
        );

        assert!(drive(orchestrator, None, |_| true).await.is_err());
    }
}
