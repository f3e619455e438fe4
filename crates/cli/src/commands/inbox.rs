use clap::Args;

use leadline_core::RequestStore;

use super::request_line;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct InboxArgs {
    /// Case-insensitive match on subject, sender name or sender email.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Show at most this many requests.
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(store: &RequestStore, args: &InboxArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut requests = store.search(&args.search);
    if let Some(limit) = args.limit {
        requests.truncate(limit);
    }
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&requests)?);
        }
        OutputFormat::Text => {
            println!("{} requests:", requests.len());
            for request in requests {
                println!("  {}", request_line(request));
            }
        }
    }
    Ok(())
}
