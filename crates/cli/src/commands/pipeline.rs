use std::collections::BTreeMap;

use clap::Args;

use leadline_core::{RequestStore, group_by_stage};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Case-insensitive match on subject or sender name.
    #[arg(long, default_value = "")]
    pub search: String,
}

pub fn run(store: &RequestStore, args: &PipelineArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let columns = group_by_stage(store.pipeline(&args.search));
    match format {
        OutputFormat::Json => {
            let by_id: BTreeMap<_, _> = columns
                .iter()
                .map(|(stage, requests)| (stage.as_str(), requests))
                .collect();
            println!("{}", serde_json::to_string_pretty(&by_id)?);
        }
        OutputFormat::Text => {
            for (stage, requests) in &columns {
                println!("{} ({})", stage.label(), requests.len());
                for request in requests {
                    println!(
                        "  {id} | {name} | {subject}",
                        id = request.id,
                        name = request.sender_name,
                        subject = request.subject,
                    );
                }
            }
        }
    }
    Ok(())
}
