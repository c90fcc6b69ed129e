//! Human approval of tool calls.
//!
//! The session awaits an [`ApprovalGate`] before running any tool. The wait
//! is a plain future, so the runtime keeps serving other tasks while a human
//! decides, and there is no timeout.
//!
//! - [`TerminalGate`] asks on the terminal, reading stdin on the blocking pool.
//! - [`ChannelGate`] hands each request to another task as a
//!   [`PendingApproval`] that can be resolved exactly once.
//!   [`serve_approvals`] answers those requests with any other gate.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::message::ToolCallRequest;

/// Outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

/// Suspends a turn until a human accepts or denies a tool call.
#[async_trait::async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Resolves exactly once per call.
    async fn request_approval(&self, call: &ToolCallRequest) -> Decision;
}

/// Prompts on stderr and reads the answer from stdin.
pub struct TerminalGate;

impl TerminalGate {
    /// Prompt the user for permission. Anything but yes is a denial.
    fn prompt_user(tool_name: &str, args: &str) -> io::Result<Decision> {
        let display = if args.chars().count() > 200 {
            format!("{}...", args.chars().take(200).collect::<String>())
        } else {
            args.to_string()
        };

        eprint!(
            "\nTool '{}' wants to execute:\n{}\n\nAllow? [y]es / [n]o: ",
            tool_name, display
        );
        io::stderr().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        match response.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(Decision::Approved),
            _ => Ok(Decision::Denied),
        }
    }
}

#[async_trait::async_trait]
impl ApprovalGate for TerminalGate {
    async fn request_approval(&self, call: &ToolCallRequest) -> Decision {
        let name = call.function_name.clone();
        let args = call.arguments_text.clone();
        match tokio::task::spawn_blocking(move || Self::prompt_user(&name, &args)).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to read approval answer, denying");
                Decision::Denied
            }
            Err(err) => {
                warn!(error = %err, "approval prompt task failed, denying");
                Decision::Denied
            }
        }
    }
}

/// A tool call waiting for a decision from another task.
///
/// Dropping it unresolved counts as a denial.
#[derive(Debug)]
pub struct PendingApproval {
    call: ToolCallRequest,
    responder: Mutex<Option<oneshot::Sender<Decision>>>,
}

impl PendingApproval {
    pub fn call(&self) -> &ToolCallRequest {
        &self.call
    }

    /// Delivers the decision. Only the first call has any effect; later ones
    /// return `false`.
    pub fn resolve(&self, decision: Decision) -> bool {
        let sender = match self.responder.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(decision).is_ok(),
            None => false,
        }
    }
}

/// Forwards approval requests over a channel.
pub struct ChannelGate {
    requests: mpsc::UnboundedSender<Arc<PendingApproval>>,
}

impl ChannelGate {
    /// Creates the gate and the receiver on which requests arrive.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Arc<PendingApproval>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { requests: tx }, rx)
    }
}

#[async_trait::async_trait]
impl ApprovalGate for ChannelGate {
    async fn request_approval(&self, call: &ToolCallRequest) -> Decision {
        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(PendingApproval {
            call: call.clone(),
            responder: Mutex::new(Some(tx)),
        });
        if self.requests.send(pending).is_err() {
            warn!(tool = %call.function_name, "no one is listening for approvals, denying");
            return Decision::Denied;
        }
        rx.await.unwrap_or(Decision::Denied)
    }
}

/// Answers each request from a [`ChannelGate`] with `gate`, in arrival order,
/// until every sender is gone.
pub async fn serve_approvals(
    requests: &mut mpsc::UnboundedReceiver<Arc<PendingApproval>>,
    gate: &dyn ApprovalGate,
) {
    while let Some(pending) = requests.recv().await {
        let decision = gate.request_approval(pending.call()).await;
        if !pending.resolve(decision) {
            debug!(tool = %pending.call().function_name, "approval no longer awaited");
        }
    }
}
