//! Concurrent token issuing
//!
//! A builder holds no mutable state; these tests share one across tasks.

use rtctoken::token::{FixedClock, FixedSalt};
use rtctoken::{Role, TokenBuilder};
use std::collections::HashSet;
use std::sync::Arc;

const APP_ID: &str = "970CA35de60c44645bbae8a215061b33";
const CERT: &str = "5CFd2fd1755d40ecb72977518be15d3b";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_builder_concurrent_builds() {
    let builder = Arc::new(TokenBuilder::new(APP_ID, CERT).unwrap());

    let mut handles = vec![];
    for i in 0..100u32 {
        let builder = builder.clone();
        handles.push(tokio::spawn(async move {
            builder
                .channel_join_token("room", i, Role::Publisher, 600, 600)
                .unwrap()
        }));
    }

    let mut tokens = HashSet::new();
    for handle in handles {
        let token = handle.await.unwrap();
        assert!(token.as_str().starts_with("007"));
        tokens.insert(token);
    }

    // One distinct token per uid
    assert_eq!(tokens.len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pinned_builds_agree_across_tasks() {
    let builder = Arc::new(
        TokenBuilder::with_sources(APP_ID, CERT, FixedClock(1_700_000_000), FixedSalt(42))
            .unwrap(),
    );
    let expected = builder.messaging_login_token("bob", 60).unwrap();

    let mut handles = vec![];
    for _ in 0..50 {
        let builder = builder.clone();
        handles.push(tokio::spawn(async move {
            builder.messaging_login_token("bob", 60).unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), expected);
    }
}
