use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use leadline_compose::{Draft, DraftFields, DraftStore};
use leadline_core::{DraftKey, SendAs};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[command(subcommand)]
    pub command: DraftCommand,
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// List saved drafts, oldest first.
    List,
    /// Show the draft saved under a key.
    Show {
        /// Draft key (usually the request id).
        key: String,
    },
    /// Create or update a draft. Unset fields keep their saved values.
    Save {
        /// Draft key (usually the request id).
        key: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        cc: Option<String>,
        #[arg(long)]
        bcc: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// "company" or "personal".
        #[arg(long)]
        send_as: Option<SendAs>,
    },
    /// Delete the draft saved under a key.
    Clear {
        /// Draft key (usually the request id).
        key: String,
    },
    /// Delete drafts that have not been saved for a while.
    Purge {
        /// Age in days after which a draft is stale.
        #[arg(long)]
        older_than_days: u32,
    },
}

pub async fn run(
    drafts: &DraftStore,
    args: &DraftArgs,
    now: DateTime<Utc>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        DraftCommand::List => {
            let entries = drafts.list().await?;
            match format {
                OutputFormat::Json => {
                    let body: Vec<_> = entries
                        .iter()
                        .map(|(key, draft)| serde_json::json!({ "key": key, "draft": draft }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                OutputFormat::Text => {
                    println!("{} drafts:", entries.len());
                    for (key, draft) in &entries {
                        println!(
                            "  {key} | to {to} | saved {saved}",
                            to = draft.fields.to,
                            saved = draft.saved_at.to_rfc3339(),
                        );
                    }
                }
            }
        }
        DraftCommand::Show { key } => {
            let key = DraftKey::new(key.as_str());
            let draft = drafts.load(&key).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&draft)?);
                }
                OutputFormat::Text => match draft {
                    Some(draft) => print_draft(&key, &draft),
                    None => println!("No draft saved under {key}"),
                },
            }
        }
        DraftCommand::Save {
            key,
            to,
            cc,
            bcc,
            body,
            send_as,
        } => {
            let key = DraftKey::new(key.as_str());
            let mut fields = drafts
                .load(&key)
                .await?
                .map(|d| d.fields)
                .unwrap_or_default();
            apply(&mut fields.to, to.as_ref());
            apply(&mut fields.cc, cc.as_ref());
            apply(&mut fields.bcc, bcc.as_ref());
            apply(&mut fields.body, body.as_ref());
            if let Some(send_as) = send_as {
                fields.send_as = *send_as;
            }
            let draft = drafts.save(&key, &fields).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&draft)?);
                }
                OutputFormat::Text => {
                    println!("Draft {key} saved at {}", draft.saved_at.to_rfc3339());
                }
            }
        }
        DraftCommand::Clear { key } => {
            let key = DraftKey::new(key.as_str());
            let existed = drafts.clear(&key).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "key": key, "cleared": existed }));
                }
                OutputFormat::Text if existed => println!("Draft {key} cleared"),
                OutputFormat::Text => println!("No draft saved under {key}"),
            }
        }
        DraftCommand::Purge { older_than_days } => {
            let cutoff = now - chrono::Duration::days(i64::from(*older_than_days));
            let removed = drafts.purge_older_than(cutoff).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "removed": removed }));
                }
                OutputFormat::Text => {
                    println!(
                        "Purged {} drafts saved before {}",
                        removed.len(),
                        cutoff.to_rfc3339()
                    );
                    for key in &removed {
                        println!("  {key}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn apply(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

fn print_draft(key: &DraftKey, draft: &Draft) {
    let DraftFields {
        to,
        cc,
        bcc,
        body,
        send_as,
    } = &draft.fields;
    println!("Draft {key} (saved {})", draft.saved_at.to_rfc3339());
    println!("  To:      {to}");
    println!("  Cc:      {cc}");
    println!("  Bcc:     {bcc}");
    println!("  Send as: {}", send_as.label());
    println!();
    println!("{body}");
}
