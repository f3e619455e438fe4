use clap::Args;

use leadline_core::{RequestId, RequestStore, Stage};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct StageArgs {
    /// Request identifier.
    pub request_id: String,
    /// Target stage id (e.g. "contacted", "won").
    pub stage: Stage,
}

pub fn run(
    store: &mut RequestStore,
    args: &StageArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id = RequestId::new(args.request_id.as_str());
    let previous = store.get(&id).map(|r| r.stage);
    let request = store.change_stage(&id, args.stage)?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(request)?);
        }
        OutputFormat::Text => {
            let previous = previous.map_or("?", Stage::label);
            println!(
                "Request {id}: {previous} -> {next}",
                id = request.id,
                next = request.stage.label(),
            );
        }
    }
    Ok(())
}
