use super::*;

use eminent::claims::{Claims, TokenInspection};
use serde_json::json;
use time::macros::datetime;

const UTC: UtcOffset = UtcOffset::UTC;

#[test]
fn stored_lists_fields_with_placeholders() {
    let doc = StoredDocument {
        id: Some("d1".into()),
        hash: Some("ab12".into()),
        salt: None,
        timestamp: Some(json!("2025-10-17T15:30:00Z")),
    };
    let out = stored(&doc, UTC);
    assert!(out.contains("Document ID: d1"));
    assert!(out.contains("Salt:        —"));
    assert!(out.contains("Stored at:   Oct 17, 2025 at 3:30 PM"));
}

#[test]
fn verification_headline_follows_match() {
    let report = VerificationReport::from_reply(
        json!({ "match": true, "auditTrail": { "submittedHash": "aaa" } }),
        datetime!(2025-10-18 09:00 UTC),
    );
    let out = verification(&report, UTC);
    assert!(out.starts_with("No tampering detected"));
    assert!(out.contains("Computed hash: aaa"));
    assert!(out.contains("Stored hash:   —"));
    assert!(out.contains("Verified at:   Oct 18, 2025 at 9:00 AM"));

    let report = VerificationReport::from_reply(json!({ "match": false }), datetime!(2025-10-18 09:00 UTC));
    assert!(verification(&report, UTC).starts_with("Tampering detected"));
}

#[test]
fn recent_rows_and_empty_state() {
    assert_eq!(recent(&[], UTC), "No recent documents");

    let docs = [DocumentSummary {
        id: "d1".into(),
        hash: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".into(),
        created_at: Some(json!("2025-10-17T15:30:00Z")),
    }];
    assert_eq!(recent(&docs, UTC), "d1  e3b0c44298fc1c14…7852b855  Oct 17, 2025 at 3:30 PM");
}

#[test]
fn whoami_variants() {
    assert_eq!(whoami(None), "Logged in (no profile stored)");
    let profile = UserProfile { name: Some("Ada".into()), email: Some("ada@b.com".into()), ..UserProfile::default() };
    assert_eq!(whoami(Some(&profile)), "Logged in as Ada <ada@b.com>");
    assert_eq!(whoami(Some(&UserProfile::default())), "Logged in as User");
}

#[test]
fn logout_reports_prior_state() {
    assert_eq!(logout(SessionState::Authenticated), "Logged out");
    assert!(logout(SessionState::Anonymous).starts_with("Not logged in"));
}

#[test]
fn token_report_states() {
    assert_eq!(token(&TokenReport::Missing, UTC), "No token found");

    let inspection = TokenInspection {
        claims: Claims { exp: Some(1_700_086_400), iat: None, extra: serde_json::Map::new() },
        issued_at: None,
        expires_at: Some(datetime!(2023-11-15 22:13:20 UTC)),
        expired: true,
    };
    let out = token(&TokenReport::Decoded { token: "a.b.c".into(), inspection }, UTC);
    assert!(out.contains(r#"Token payload: {"exp":1700086400}"#));
    assert!(out.contains("Expires at: Nov 15, 2023 at 10:13 PM"));
    assert!(out.contains("Issued at: —"));
    assert!(out.ends_with("Token is EXPIRED"));
}

#[test]
fn probe_messages() {
    let working = ApiProbe::Working { token: Some("t".into()), reply: json!({}) };
    assert_eq!(probe(&working), "API is working!\nNew token: t");
    assert_eq!(probe(&ApiProbe::Rejected { message: "nope".into() }), "API error: nope");
    assert!(probe(&ApiProbe::Unreachable { reason: "down".into() }).starts_with("Cannot connect to API"));
}

#[test]
fn user_output() {
    assert_eq!(user(None), "No user found");
    assert!(user(Some(&json!({ "name": "A" }))).contains("\"name\": \"A\""));
}
