//! # Example: resume_and_listen
//!
//! Demonstrates the startup path of [`AutoRegistration`]:
//! a delivery interrupted in a previous run is resumed from the store, then
//! new tokens announced on a [`TokenEmitter`] are delivered as they arrive.
//!
//! The endpoint is an in-process fake that rejects the first two requests
//! with `503`, so the resumed delivery goes through two backoff rounds.
//!
//! ## Flow
//! ```text
//! MemoryStore { url, pendingDevicePushToken: "token-from-last-run" }
//!   │
//!   ├─► start()
//!   │     ├─► publish(PendingResumed)
//!   │     └─► deliver("token-from-last-run")
//!   │           ├─► POST → 503 ─► AttemptFailed ─► BackoffScheduled{100ms}
//!   │           ├─► POST → 503 ─► AttemptFailed ─► BackoffScheduled{200ms}
//!   │           ├─► POST → 200
//!   │           └─► clear pending ─► DeliverySucceeded{attempts=3}
//!   │
//!   └─► listen(&emitter)
//!         └─► emit("fresh-token") ─► deliver ─► POST → 200 ─► DeliverySucceeded
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example resume_and_listen
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{Map, json};
use tokenvisor::{
    AutoRegistration, BackoffPolicy, DevicePushToken, Event, EventKind, HttpClient, HttpError,
    HttpResponse, MemoryStore, Registration, RegistrationConfig, RegistrationStore,
    StaticEnvironment, Subscribe, TokenEmitter,
};

/// Endpoint that answers `503` to its first `failures` requests.
struct FlakyEndpoint {
    failures: u32,
    seen: AtomicU32,
}

#[async_trait]
impl HttpClient for FlakyEndpoint {
    async fn post(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        body: String,
    ) -> Result<HttpResponse, HttpError> {
        let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[endpoint] POST {url} #{n} {body}");
        if n <= self.failures {
            return Ok(HttpResponse::new(503, "try again later"));
        }
        Ok(HttpResponse::new(200, ""))
    }
}

/// Prints every delivery event.
struct Printer;

#[async_trait]
impl Subscribe for Printer {
    async fn on_event(&self, e: &Event) {
        let token = e.token.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::AttemptFailed => {
                println!("[event] {:?} token={token} status={:?}", e.kind, e.status);
            }
            EventKind::BackoffScheduled => {
                println!("[event] {:?} token={token} delay_ms={:?}", e.kind, e.delay_ms);
            }
            EventKind::DeliverySucceeded => {
                println!("[event] {:?} token={token} attempts={:?}", e.kind, e.attempt);
            }
            kind => println!("[event] {kind:?} token={token}"),
        }
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A store left behind by a run that died mid-delivery.
    let mut body = Map::new();
    body.insert("userId".into(), json!("42"));
    let mut persisted = Registration::new("https://push.example.com/tokens", body);
    persisted.pending_token = Some(DevicePushToken::ios("token-from-last-run"));
    let store = Arc::new(MemoryStore::with_value(persisted.to_json()?));

    // 2. Short backoff so the demo finishes quickly.
    let mut cfg = RegistrationConfig::default();
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(100),
        ..BackoffPolicy::default()
    };

    let registration = AutoRegistration::builder(
        store.clone(),
        Arc::new(FlakyEndpoint {
            failures: 2,
            seen: AtomicU32::new(0),
        }),
        Arc::new(StaticEnvironment::production()),
    )
    .with_config(cfg)
    .with_subscribers(vec![Arc::new(Printer) as Arc<dyn Subscribe>])
    .build();

    // 3. Resume the interrupted delivery.
    if let Some(resumed) = registration.start().await? {
        println!("[main] resumed delivery finished: {:?}", resumed.await??);
    }

    // 4. Deliver tokens announced from now on.
    let mut events = registration.subscribe();
    let emitter = TokenEmitter::default();
    let _listener = registration.listen(&emitter);
    emitter.emit(DevicePushToken::ios("fresh-token"));

    loop {
        let ev = events.recv().await?;
        if ev.kind == EventKind::DeliverySucceeded && ev.token.as_deref() == Some("fresh-token") {
            break;
        }
    }

    let stored = store.get_registration().await?.unwrap_or_default();
    println!("[main] store now holds {stored}");
    Ok(())
}
