//! Plain-text rendering of command results.

use std::fmt::Write as _;

use eminent::auth::{SessionState, UserProfile};
use eminent::debug::{ApiProbe, TokenReport};
use eminent::format::{MISSING, abbreviate_hash, format_instant, format_value};
use eminent::{DocumentSummary, StoredDocument, VerificationReport};
use serde_json::Value;
use time::UtcOffset;

pub fn stored(doc: &StoredDocument, offset: UtcOffset) -> String {
    let mut out = String::from("Document stored\n");
    let _ = writeln!(out, "  Document ID: {}", or_missing(doc.id.as_deref()));
    let _ = writeln!(out, "  Hash:        {}", or_missing(doc.hash.as_deref()));
    let _ = writeln!(out, "  Salt:        {}", or_missing(doc.salt.as_deref()));
    let _ = writeln!(out, "  Stored at:   {}", format_value(doc.timestamp.as_ref(), offset));
    out.push_str("Save your Document ID and Salt. You'll need them to verify this document later.");
    out
}

pub fn verification(report: &VerificationReport, offset: UtcOffset) -> String {
    let mut out = String::from(if report.matched {
        "No tampering detected - Document is authentic\n"
    } else {
        "Tampering detected - Document content does not match the stored hash\n"
    });
    let _ = writeln!(out, "  Computed hash: {}", or_missing(report.computed_hash.as_deref()));
    let _ = writeln!(out, "  Stored hash:   {}", or_missing(report.stored_hash.as_deref()));
    let _ = writeln!(out, "  Verified at:   {}", format_value(report.verified_at.as_ref(), offset));
    let _ = writeln!(out, "  Stored at:     {}", format_value(report.stored_at.as_ref(), offset));
    let _ = write!(out, "  Created at:    {}", format_value(report.original_created_at.as_ref(), offset));
    out
}

pub fn recent(docs: &[DocumentSummary], offset: UtcOffset) -> String {
    if docs.is_empty() {
        return "No recent documents".to_owned();
    }
    docs.iter()
        .map(|doc| {
            format!(
                "{}  {}  {}",
                doc.id,
                abbreviate_hash(&doc.hash),
                format_value(doc.created_at.as_ref(), offset)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn whoami(profile: Option<&UserProfile>) -> String {
    let Some(profile) = profile else {
        return "Logged in (no profile stored)".to_owned();
    };
    match profile.email.as_deref().filter(|e| !e.is_empty()) {
        Some(email) => format!("Logged in as {} <{email}>", profile.display_name()),
        None => format!("Logged in as {}", profile.display_name()),
    }
}

pub fn logout(was: SessionState) -> String {
    match was {
        SessionState::Authenticated => "Logged out".to_owned(),
        SessionState::Anonymous => "Not logged in; local session data cleared".to_owned(),
    }
}

pub fn token(report: &TokenReport, offset: UtcOffset) -> String {
    match report {
        TokenReport::Missing => "No token found".to_owned(),
        TokenReport::Undecodable { token, reason } => format!("Current token: {token}\n{reason}"),
        TokenReport::Decoded { token, inspection } => {
            let when = |at: Option<time::OffsetDateTime>| at.map_or_else(|| MISSING.to_owned(), |t| format_instant(t, offset));
            let mut out = format!("Current token: {token}\n");
            if let Ok(payload) = serde_json::to_string(&inspection.claims) {
                let _ = writeln!(out, "Token payload: {payload}");
            }
            let _ = writeln!(out, "Expires at: {}", when(inspection.expires_at));
            let _ = writeln!(out, "Issued at: {}", when(inspection.issued_at));
            out.push_str(if inspection.expired { "Token is EXPIRED" } else { "Token is still valid" });
            out
        }
    }
}

pub fn user(value: Option<&Value>) -> String {
    match value {
        None => "No user found".to_owned(),
        Some(v) => format!("Current user: {}", serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())),
    }
}

pub fn probe(result: &ApiProbe) -> String {
    match result {
        ApiProbe::Working { token, .. } => {
            format!("API is working!\nNew token: {}", or_missing(token.as_deref()))
        }
        ApiProbe::Rejected { message } => format!("API error: {message}"),
        ApiProbe::Unreachable { reason } => format!("Cannot connect to API: {reason}"),
    }
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
