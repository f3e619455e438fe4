use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::Args;
use tracing::info;

use leadline_compose::{
    ComposeConfig, DraftStore, FileCandidate, LogDelivery, ReplyFlow, StagedAttachment,
    StagingReport, format_size,
};
use leadline_core::{CoreError, RequestId, RequestStore, SendAs};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ReplyArgs {
    /// Request to reply to.
    pub request_id: String,
    /// Override the prefilled recipient.
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub cc: Option<String>,
    #[arg(long)]
    pub bcc: Option<String>,
    /// Reply body. Without it a restored draft or the signature is kept.
    #[arg(long)]
    pub body: Option<String>,
    /// "company" or "personal".
    #[arg(long)]
    pub send_as: Option<SendAs>,
    /// Files to attach.
    #[arg(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,
    /// Send the reply. Without it the reply is saved as a draft.
    #[arg(long)]
    pub send: bool,
}

pub async fn run(
    store: &RequestStore,
    drafts: DraftStore,
    compose: ComposeConfig,
    args: &ReplyArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id = RequestId::new(args.request_id.as_str());
    let request = store.get(&id).ok_or(CoreError::NotFound(id))?;

    let mut flow = ReplyFlow::new(compose, drafts, Arc::new(LogDelivery));
    let outcome = flow.start(request).await?;
    if outcome.restored {
        info!(key = %outcome.key, "continuing saved draft");
    }

    if let Some(to) = &args.to {
        flow.set_to(to.as_str())?;
    }
    if let Some(cc) = &args.cc {
        flow.set_cc(cc.as_str())?;
    }
    if let Some(bcc) = &args.bcc {
        flow.set_bcc(bcc.as_str())?;
    }
    if let Some(body) = &args.body {
        flow.set_body(body.as_str())?;
    }
    if let Some(send_as) = args.send_as {
        flow.set_send_as(send_as)?;
    }

    let mut candidates = Vec::with_capacity(args.attachments.len());
    for path in &args.attachments {
        candidates.push(read_candidate(path).await?);
    }
    let report = flow.add_files(candidates)?;
    let staged = flow.attachments().to_vec();

    if args.send {
        let receipt = match flow.send().await {
            Ok(receipt) => receipt,
            Err(e) => {
                flow.cancel().await?;
                return Err(e.into());
            }
        };
        match format {
            OutputFormat::Json => {
                let body = serde_json::json!({
                    "request_id": request.id,
                    "restored": outcome.restored,
                    "status": receipt.status,
                    "message_id": receipt.message_id,
                    "attachments": staged_json(&staged),
                    "rejected": rejected_json(&report),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Text => {
                print_staged(&staged);
                print_rejections(&report);
                println!(
                    "Reply to {} {} ({} attachments)",
                    request.id,
                    receipt.status,
                    staged.len()
                );
            }
        }
    } else {
        let draft = flow.save_draft().await?;
        flow.cancel().await?;
        match format {
            OutputFormat::Json => {
                let body = serde_json::json!({
                    "request_id": request.id,
                    "restored": outcome.restored,
                    "draft": draft,
                    "attachments": staged_json(&staged),
                    "rejected": rejected_json(&report),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Text => {
                print_staged(&staged);
                print_rejections(&report);
                if outcome.restored {
                    println!("Continued saved draft for {}", request.id);
                }
                println!(
                    "Draft for {} saved at {} (attachments are not kept in drafts)",
                    request.id,
                    draft.saved_at.to_rfc3339()
                );
            }
        }
    }
    Ok(())
}

async fn read_candidate(path: &Path) -> anyhow::Result<FileCandidate> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading attachment {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(FileCandidate::new(
        name,
        content_type.essence_str(),
        Bytes::from(data),
    ))
}

fn print_staged(staged: &[StagedAttachment]) {
    for attachment in staged {
        println!(
            "Attached {} [{}] {}",
            attachment.name,
            attachment.kind().as_str(),
            format_size(attachment.size)
        );
    }
}

fn staged_json(staged: &[StagedAttachment]) -> serde_json::Value {
    staged
        .iter()
        .map(|a| {
            serde_json::json!({
                "name": a.name,
                "size": a.size,
                "kind": a.kind().as_str(),
                "content_type": a.content_type,
            })
        })
        .collect()
}

fn print_rejections(report: &StagingReport) {
    for rejection in &report.rejected {
        eprintln!(
            "Skipped {} ({}): {}",
            rejection.name,
            format_size(rejection.size),
            rejection.reason
        );
    }
}

fn rejected_json(report: &StagingReport) -> serde_json::Value {
    report
        .rejected
        .iter()
        .map(|r| {
            serde_json::json!({
                "name": r.name,
                "size": r.size,
                "reason": r.reason.to_string(),
            })
        })
        .collect()
}
