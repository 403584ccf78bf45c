use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{ broadcast, broadcast::error::RecvError, watch };
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use crate::models::api::QuotaStatus;
use super::transport::ChatTransport;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Asks the quota indicator to re-poll right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRefresh;

/// Mirrors the server's quota for this client. Failed polls keep the last value.
pub struct QuotaIndicator {
    transport: Arc<dyn ChatTransport>,
    latest: watch::Sender<Option<QuotaStatus>>,
}

impl QuotaIndicator {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        let (latest, _) = watch::channel(None);
        Self { transport, latest }
    }

    /// `None` until the first successful poll.
    pub fn current(&self) -> Option<QuotaStatus> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<QuotaStatus>> {
        self.latest.subscribe()
    }

    pub async fn refresh(&self) {
        match self.transport.fetch_quota().await {
            Ok(status) => {
                self.latest.send_replace(Some(status));
            }
            Err(e) => debug!("Quota poll failed, keeping last value: {}", e),
        }
    }

    /// Polls now, then every `period` and on each refresh signal, until the
    /// signal channel closes.
    pub fn spawn(
        self: Arc<Self>,
        period: Duration,
        mut signals: broadcast::Receiver<QuotaRefresh>
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    signal = signals.recv() => match signal {
                        Ok(QuotaRefresh) | Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                }
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::TransportError;
    use crate::models::chat::Message;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedQuota {
        answers: Mutex<VecDeque<Result<QuotaStatus, TransportError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedQuota {
        fn new(answers: Vec<Result<QuotaStatus, TransportError>>) -> Self {
            Self { answers: Mutex::new(answers.into()), calls: Mutex::new(0) }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedQuota {
        async fn send_message(
            &self,
            _history: &[Message],
            _session_id: &str
        ) -> Result<String, TransportError> {
            Err(TransportError::Unreachable)
        }

        async fn load_history(&self, _session_id: &str) -> Vec<Message> {
            Vec::new()
        }

        async fn fetch_quota(&self) -> Result<QuotaStatus, TransportError> {
            *self.calls.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop_front().unwrap_or(Err(TransportError::Unreachable))
        }
    }

    fn status(remaining: u32) -> QuotaStatus {
        QuotaStatus { remaining, limit: 20 }
    }

    #[tokio::test]
    async fn failed_poll_keeps_last_known_value() {
        let transport = Arc::new(ScriptedQuota::new(vec![Ok(status(19)), Err(TransportError::Unreachable)]));
        let indicator = QuotaIndicator::new(transport);

        indicator.refresh().await;
        indicator.refresh().await;

        assert_eq!(indicator.current(), Some(status(19)));
    }

    #[tokio::test]
    async fn nothing_is_shown_before_first_success() {
        let indicator = QuotaIndicator::new(Arc::new(ScriptedQuota::default()));

        indicator.refresh().await;

        assert_eq!(indicator.current(), None);
    }

    #[tokio::test]
    async fn polls_at_start_and_on_signal() {
        let transport = Arc::new(ScriptedQuota::new(vec![Ok(status(20)), Ok(status(19))]));
        let indicator = Arc::new(QuotaIndicator::new(transport.clone()));
        let mut seen = indicator.subscribe();
        let (signals, rx) = broadcast::channel(4);

        let handle = indicator.clone().spawn(Duration::from_secs(3600), rx);
        seen.changed().await.unwrap();
        assert_eq!(*seen.borrow_and_update(), Some(status(20)));

        signals.send(QuotaRefresh).unwrap();
        seen.changed().await.unwrap();
        assert_eq!(*seen.borrow_and_update(), Some(status(19)));
        assert_eq!(transport.calls(), 2);

        drop(signals);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn signal_while_server_is_down_keeps_value() {
        let transport = Arc::new(ScriptedQuota::new(vec![Ok(status(5))]));
        let indicator = Arc::new(QuotaIndicator::new(transport.clone()));
        let mut seen = indicator.subscribe();
        let (signals, rx) = broadcast::channel(4);

        let handle = indicator.clone().spawn(Duration::from_secs(3600), rx);
        seen.changed().await.unwrap();

        signals.send(QuotaRefresh).unwrap();
        drop(signals);
        handle.await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(indicator.current(), Some(status(5)));
    }
}
