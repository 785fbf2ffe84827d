use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Realtime-layer metrics, registered on a per-state registry so tests can run in parallel.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub alert_sockets: IntGauge,
    pub chat_sockets: IntGauge,
    pub chat_messages_accepted: IntCounter,
    pub chat_messages_rate_limited: IntCounter,
    pub chat_messages_rejected: IntCounter,
    pub alerts_generated: IntCounter,
    pub alert_frames_delivered: IntCounter,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    let gauge = IntGauge::with_opts(Opts::new(name, help).namespace("dhandraft"))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help).namespace("dhandraft"))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            alert_sockets: gauge(&registry, "alert_sockets", "Open alert WebSocket connections")?,
            chat_sockets: gauge(&registry, "chat_sockets", "Open chat WebSocket connections")?,
            chat_messages_accepted: counter(
                &registry,
                "chat_messages_accepted_total",
                "Chat messages persisted and broadcast",
            )?,
            chat_messages_rate_limited: counter(
                &registry,
                "chat_messages_rate_limited_total",
                "Chat messages rejected by the per-user rate limit",
            )?,
            chat_messages_rejected: counter(
                &registry,
                "chat_messages_rejected_total",
                "Chat frames that failed to parse",
            )?,
            alerts_generated: counter(
                &registry,
                "alerts_generated_total",
                "Alerts created from high-impact news",
            )?,
            alert_frames_delivered: counter(
                &registry,
                "alert_frames_delivered_total",
                "new_alert frames queued to alert sockets",
            )?,
            registry,
        })
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %err, "failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.chat_sockets.inc();
        metrics.chat_messages_accepted.inc_by(3);
        let text = metrics.render();
        assert!(text.contains("dhandraft_chat_sockets 1"));
        assert!(text.contains("dhandraft_chat_messages_accepted_total 3"));
        assert!(text.contains("dhandraft_alert_sockets 0"));
    }
}
