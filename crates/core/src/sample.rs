//! Deterministic sample data source.
//!
//! Produces a realistic-looking request snapshot for demos and tests. The same
//! `count` and `now` always yield the same requests.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::request::{
    Category, Direction, EmailHistoryItem, Note, Priority, Request, RequestAttachment, Task,
    TaskStatus,
};
use crate::stage::Stage;
use crate::types::RequestId;

const NAMES: [&str; 10] = [
    "Mohammed Al-Hassan",
    "Ahmed Al-Rashid",
    "Mahmoud Ibrahim",
    "Karim Nasser",
    "Omar Al-Farsi",
    "Youssef Al-Qasim",
    "Khalid Al-Zahrani",
    "Hassan Al-Majid",
    "Faisal Al-Otaibi",
    "Tariq Al-Harbi",
];

const COMPANIES: [&str; 10] = [
    "TechCorp Industries",
    "Global Solutions Inc",
    "Innovate Labs",
    "Summit Enterprises",
    "Nexus Digital",
    "Prime Consulting",
    "Atlas Manufacturing",
    "Vertex Systems",
    "Horizon Group",
    "Stellar Tech",
];

const SUBJECTS: [&str; 10] = [
    "Partnership Inquiry for Q1 2025",
    "Request for Proposal - Enterprise Solution",
    "Product Demo Request",
    "Pricing Information Needed",
    "Integration Capabilities Question",
    "Custom Development Inquiry",
    "Support Package Options",
    "Bulk Order Discount Request",
    "Technical Consultation Request",
    "Strategic Partnership Opportunity",
];

const PRIORITIES: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

/// Mailbox inbound requests are addressed to.
pub const INBOX_ADDRESS: &str = "info@company.com";

/// Generate `count` sample requests received within the 30 days before `now`.
#[must_use]
pub fn sample_requests(count: usize, now: DateTime<Utc>) -> Vec<Request> {
    (0..count).map(|i| sample_request(i, now)).collect()
}

fn sample_request(i: usize, now: DateTime<Utc>) -> Request {
    let mut rng = StdRng::seed_from_u64(i as u64);
    let name = NAMES[i % NAMES.len()];
    let company = COMPANIES[i % COMPANIES.len()];
    let subject = SUBJECTS[i % SUBJECTS.len()];
    let email = sender_email(name, company);
    let received_at = now - Duration::days(rng.gen_range(0..30));
    let stages: Vec<Stage> = Stage::all().collect();
    let stage = stages.choose(&mut rng).copied().unwrap_or(Stage::New);
    let body = format!(
        "Hi,\n\nI'm reaching out from {company} regarding a potential collaboration \
         opportunity.\n\nWould you be available for a call this week to discuss \
         further?\n\nBest regards,\n{name}\n{company}"
    );
    let id = RequestId::new(format!("req-{i:04}"));

    let mut request = Request::new(id.clone(), name, email.clone(), subject, received_at, stage)
        .with_body(body.clone())
        .with_category(Category::Customer)
        .with_priority(PRIORITIES.choose(&mut rng).copied().unwrap_or(Priority::Medium));

    if rng.gen_bool(0.7) {
        request.assigned_to = Some(NAMES[rng.gen_range(0..5)].to_owned());
    }
    if rng.gen_bool(0.3) {
        request.attachments.push(RequestAttachment {
            id: format!("{id}-att-1"),
            name: "requirements.pdf".to_owned(),
            size: 245_000,
            content_type: "application/pdf".to_owned(),
            url: "#".to_owned(),
        });
    }
    if rng.gen_bool(0.5) {
        request.notes.push(Note {
            id: format!("{id}-note-1"),
            content: "Initial contact made. They seem very interested in our enterprise plan."
                .to_owned(),
            author: NAMES[rng.gen_range(0..5)].to_owned(),
            created_at: received_at + Duration::days(1),
        });
    }
    if rng.gen_bool(0.4) {
        request.tasks.push(Task {
            id: format!("{id}-task-1"),
            title: "Follow up with proposal".to_owned(),
            assigned_to: NAMES[rng.gen_range(0..5)].to_owned(),
            due_date: now + Duration::days(3),
            status: TaskStatus::Pending,
        });
    }
    request.email_history.push(EmailHistoryItem {
        id: format!("{id}-mail-1"),
        direction: Direction::Inbound,
        from: email,
        to: INBOX_ADDRESS.to_owned(),
        subject: subject.to_owned(),
        body,
        sent_at: received_at,
        sent_by: name.to_owned(),
        sent_as: None,
    });

    request
}

/// `Mohammed Al-Hassan` at `TechCorp Industries` becomes
/// `mohammed.alhassan@techcorpindustries.com`.
fn sender_email(name: &str, company: &str) -> String {
    let local = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
        .replace('-', "");
    let domain: String = company
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    format!("{local}@{domain}.com")
}
