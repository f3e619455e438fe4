pub mod draft;
pub mod inbox;
pub mod pipeline;
pub mod reply;
pub mod stage;
pub mod stats;

use leadline_core::Request;

/// One-line summary of a request for text output.
pub(crate) fn request_line(request: &Request) -> String {
    format!(
        "{id} | {stage} | {received} | {name} <{email}> | {subject}",
        id = request.id,
        stage = request.stage.label(),
        received = request.received_at.format("%Y-%m-%d %H:%M"),
        name = request.sender_name,
        email = request.sender_email,
        subject = request.subject,
    )
}
