use crate::cli::ChatArgs;
use crate::client::{
    BootstrapSource,
    ConversationController,
    FileStorage,
    HttpTransport,
    QuotaIndicator,
    SendOutcome,
};
use crate::models::api::QuotaStatus;
use crate::models::chat::{ Message, Role };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::watch;
use log::info;

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "Anda",
        Role::Assistant => "FinAssistant",
    };
    println!("{}: {}", who, message.content);
}

const QUOTA_SETTLE: Duration = Duration::from_secs(2);

/// Waits for the poll a send triggers, then reads the latest value. A failed
/// poll never publishes, so the wait is bounded.
async fn settled_quota(
    seen: &mut watch::Receiver<Option<QuotaStatus>>,
    wait: Duration
) -> Option<QuotaStatus> {
    let _ = tokio::time::timeout(wait, seen.changed()).await;
    *seen.borrow_and_update()
}

/// Line-based front-end over the conversation controller. `/quit` exits.
pub async fn run_console(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let transport = Arc::new(HttpTransport::new(args.server_url.clone()));
    let storage = Arc::new(FileStorage::open(&args.local_storage_path));
    let controller = ConversationController::new(transport.clone(), storage);
    info!("Session id: {}", controller.session_id());

    let quota = Arc::new(QuotaIndicator::new(transport));
    let poller = quota
        .clone()
        .spawn(Duration::from_secs(args.quota_poll_secs.max(1)), controller.subscribe_quota_refresh());

    let source = controller.bootstrap().await;
    if source != BootstrapSource::Default {
        info!("History restored from {:?}", source);
    }
    for message in controller.messages() {
        print_message(&message);
    }

    let mut seen = quota.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        seen.mark_unchanged();
        match controller.send(&line).await {
            SendOutcome::Ignored => {
                continue;
            }
            SendOutcome::Replied(text) => print_message(&Message::assistant(text)),
            SendOutcome::Failed(error) => eprintln!("! {}", error),
        }
        if let Some(status) = settled_quota(&mut seen, QUOTA_SETTLE).await {
            println!("(Sisa kuota: {}/{})", status.remaining, status.limit);
        }
    }

    poller.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn quota_shown_after_send_is_the_fresh_poll() {
        let (latest, mut seen) = watch::channel(Some(QuotaStatus { remaining: 5, limit: 20 }));
        seen.mark_unchanged();

        let poll = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            latest.send_replace(Some(QuotaStatus { remaining: 4, limit: 20 }));
            latest
        });

        let shown = settled_quota(&mut seen, Duration::from_secs(5)).await;
        assert_eq!(shown, Some(QuotaStatus { remaining: 4, limit: 20 }));
        drop(poll.await.unwrap());
    }

    #[tokio::test]
    async fn failed_poll_falls_back_to_last_value() {
        let (_latest, mut seen) = watch::channel(Some(QuotaStatus { remaining: 5, limit: 20 }));
        seen.mark_unchanged();

        let shown = settled_quota(&mut seen, Duration::from_millis(20)).await;

        assert_eq!(shown, Some(QuotaStatus { remaining: 5, limit: 20 }));
    }
}
