use tokio::sync::watch;

/// Sending half of the process-wide stop flag. Cloned into every signal listener.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

/// Observes the stop flag. A listener created after the flag flipped still sees it.
#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self, reason: &str) {
        if self.sender.send_replace(true) {
            return;
        }
        tracing::info!(target: "lifecycle", reason, "shutdown requested");
    }
}

impl ShutdownListener {
    pub async fn notified(&mut self) {
        // An Err here means every sender is gone, which can never flip the flag.
        if self.receiver.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Flips `shutdown` on Ctrl-C, or SIGTERM on unix.
pub fn install_signal_handlers(shutdown: &Shutdown) {
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_ctrl_c.trigger("Ctrl-C"),
            Err(err) => {
                tracing::warn!(target: "lifecycle", error = %err, "failed to listen for Ctrl-C")
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let on_term = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sig) => {
                    if sig.recv().await.is_some() {
                        on_term.trigger("SIGTERM");
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "lifecycle", error = %err, "failed to listen for SIGTERM")
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn trigger_wakes_waiting_listener() {
        let (shutdown, mut listener) = Shutdown::new();
        assert!(!listener.is_triggered());

        let waiter = tokio::spawn(async move {
            listener.notified().await;
            listener.is_triggered()
        });
        shutdown.trigger("test");

        let seen = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(seen);
    }

    #[tokio::test]
    async fn late_subscriber_sees_earlier_trigger() {
        let (shutdown, _listener) = Shutdown::new();
        shutdown.trigger("test");
        shutdown.trigger("again");

        let mut late = shutdown.subscribe();
        assert!(late.is_triggered());
        timeout(Duration::from_millis(100), late.notified())
            .await
            .unwrap();
    }
}
