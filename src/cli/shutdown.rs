use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancelation` on Ctrl-C. Returns early when the token gets cancelled elsewhere, for
/// example because the session was quit normally.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::detect_shutdown;

    #[tokio::test]
    async fn returns_once_cancelled_elsewhere() {
        let token = CancellationToken::new();
        token.cancel();

        detect_shutdown(token.clone()).await;

        assert!(token.is_cancelled());
    }
}
