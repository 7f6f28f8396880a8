// ABOUTME: Integration tests for the notification dispatcher
// ABOUTME: All-settle bulk fan-out with independent per-recipient outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{init_test_logging, RecordingMailTransport};
use smartagrinet::notifications::{EmailTemplate, MailTransport, Notifier};

fn notifier(mail: &Arc<RecordingMailTransport>) -> Notifier {
    Notifier::new(
        Arc::clone(mail) as Arc<dyn MailTransport>,
        "http://localhost:3000",
    )
}

#[tokio::test]
async fn bulk_send_attempts_every_recipient_despite_one_failure() {
    init_test_logging();
    let mail = Arc::new(RecordingMailTransport::new());
    mail.fail_for("second@example.com");

    let recipients = vec![
        "first@example.com".to_owned(),
        "second@example.com".to_owned(),
        "third@example.com".to_owned(),
    ];
    let template = EmailTemplate::Custom {
        subject: "Harvest window".to_owned(),
        content: "<p>Rains arrive this weekend.</p>".to_owned(),
        language: "en".to_owned(),
    };

    let outcomes = notifier(&mail).send_bulk(&recipients, &template).await;

    // One outcome per recipient, in order, judged independently.
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].recipient, "first@example.com");
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[1].recipient, "second@example.com");
    assert!(outcomes[1].result.is_err());
    assert_eq!(outcomes[2].recipient, "third@example.com");
    assert!(outcomes[2].result.is_ok());

    // The failing recipient did not block delivery to the others.
    assert!(mail.sent_to("first@example.com"));
    assert!(mail.sent_to("third@example.com"));
    assert!(!mail.sent_to("second@example.com"));
    assert_eq!(mail.sent_count(), 2);
}

#[tokio::test]
async fn single_send_renders_the_template() {
    init_test_logging();
    let mail = Arc::new(RecordingMailTransport::new());

    let template = EmailTemplate::Welcome {
        first_name: "Amina".to_owned(),
        language: "sw".to_owned(),
    };
    notifier(&mail)
        .send("amina@example.com", &template)
        .await
        .unwrap();

    let sent = mail.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amina@example.com");
    assert!(sent[0].subject.contains("Welcome"));
    assert!(sent[0].html.contains("Hello Amina!"));
    assert!(sent[0].html.contains("lang=\"sw\""));
}

#[tokio::test]
async fn bulk_send_with_all_failures_still_reports_each() {
    init_test_logging();
    let mail = Arc::new(RecordingMailTransport::new());
    mail.fail_for("a@example.com");
    mail.fail_for("b@example.com");

    let recipients = vec!["a@example.com".to_owned(), "b@example.com".to_owned()];
    let template = EmailTemplate::Custom {
        subject: "Notice".to_owned(),
        content: "<p>Scheduled maintenance.</p>".to_owned(),
        language: "en".to_owned(),
    };

    let outcomes = notifier(&mail).send_bulk(&recipients, &template).await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|outcome| outcome.result.is_err()));
    assert_eq!(mail.sent_count(), 0);
}
