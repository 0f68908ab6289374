//! Send orchestration
//!
//! One dispatch = one gateway session, one sequential pass over the target
//! chats, one release. Per-chat failures never abort the pass; only failing
//! to acquire the session at all makes the whole dispatch fail. Merging the
//! successfully sent ids back into the saved target list is a separate step
//! ([`reconcile`]) owned by the send-now caller, not the dispatcher.

use tracing::{error, info};

use crate::candidates::{display_name, ChatCandidate};
use crate::gateway::Gateway;
use crate::store::AccountConfig;

/// Display name used when a sent chat is missing from the candidate list.
pub const UNKNOWN_CHAT_NAME: &str = "Unknown chat";

/// Tri-part outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// False only when session acquisition failed, not when individual
    /// sends did.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Chat ids sent successfully, in attempt order.
    pub sent_ids: Vec<i64>,
}

/// Send `text` to each chat in `chat_ids`, in order, over one session.
pub async fn dispatch(
    gateway: &dyn Gateway,
    account_id: &str,
    chat_ids: &[i64],
    text: &str,
) -> DispatchOutcome {
    let session = match gateway.open(account_id).await {
        Ok(session) => session,
        Err(e) => {
            error!("({}) failed to open gateway session: {}", account_id, e);
            return DispatchOutcome {
                success: false,
                message: format!("Telegram session failed: {}", e),
                sent_ids: Vec::new(),
            };
        }
    };

    let mut sent_ids = Vec::new();
    for &chat_id in chat_ids {
        match session.send_message(chat_id, text).await {
            Ok(()) => {
                info!("({}) sent to {}", account_id, chat_id);
                sent_ids.push(chat_id);
            }
            Err(e) => {
                error!("({}) send to {} failed: {}", account_id, chat_id, e);
            }
        }
    }

    // One release after all attempts, success or not.
    session.close().await;

    let message = format!("Sent to {} of {} chats", sent_ids.len(), chat_ids.len());
    DispatchOutcome {
        success: true,
        message,
        sent_ids,
    }
}

/// Merge successfully sent ids into the saved target list.
///
/// Insert-only: a sent chat not yet saved is added with its display name from
/// the most recent candidate list (placeholder if unknown); entries already
/// saved are never removed or renamed by a successful send. Successful
/// delivery is taken as evidence the recipient is worth remembering.
pub fn reconcile(account: &mut AccountConfig, sent_ids: &[i64], candidates: &[ChatCandidate]) {
    for &chat_id in sent_ids {
        if account.target_chats.contains_key(&chat_id) {
            continue;
        }
        let name =
            display_name(candidates, chat_id).unwrap_or_else(|| UNKNOWN_CHAT_NAME.to_string());
        account.target_chats.insert(chat_id, name);
    }
}
