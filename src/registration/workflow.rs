//! # One token delivery.
//!
//! [`deliver`] runs under an [`Interruptible`](crate::Interruptible); every
//! store access and network round goes through the call's [`Suspend`], so a
//! newer delivery (or an abort) stops this one at its next step.
//!
//! ```text
//! read registration ──► none? ─────────────────────────────► NotRegistered
//!        │
//!        ▼
//! persist pending token ──► resolve development flag ──► build body
//!                                                            │
//!        ┌───────────────────────────────────────────────────┘
//!        ▼
//!   ┌─► POST ── 2xx ──────────────► clear pending token ──► Registered { attempts }
//!   │     │
//!   │     ├─ non-2xx / transport ─► AttemptFailed ─► BackoffScheduled ─┐
//!   │     │                                                            │
//!   │     └─ invalid request ─────► Err(NonRetryable)                  │
//!   └──────────────────────── sleep(delay) ◄───────────────────────────┘
//! ```
//!
//! The pending token is written before the first POST. If the process dies or
//! the delivery is superseded mid-flight, the persisted registration still
//! names the token for [`resume`](crate::AutoRegistration::resume_persisted_registration).

use std::sync::Arc;

use crate::error::RegistrationError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::retry::{Retries, RetrySignal};
use crate::supervisor::Suspend;

use super::environment::Environment;
use super::http::HttpClient;
use super::model::{DevicePushToken, Registration};
use super::store::RegistrationStore;

const JSON_HEADERS: &[(&str, &str)] = &[("content-type", "application/json")];

/// How a finished delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No registration was persisted; nothing was sent.
    NotRegistered,
    /// The endpoint accepted the token after `attempts` rounds.
    Registered { attempts: u32 },
}

/// Collaborators shared by every delivery of one [`AutoRegistration`](crate::AutoRegistration).
pub(crate) struct DeliveryContext {
    pub(crate) store: Arc<dyn RegistrationStore>,
    pub(crate) http: Arc<dyn HttpClient>,
    pub(crate) environment: Arc<dyn Environment>,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) bus: Bus,
}

/// Delivers `token` to the persisted registration endpoint, retrying until accepted.
pub(crate) async fn deliver(
    ctx: Arc<DeliveryContext>,
    token: DevicePushToken,
    suspend: Suspend,
) -> Result<Delivery, RegistrationError> {
    let label: Arc<str> = token.data.as_str().into();
    ctx.bus
        .publish(Event::new(EventKind::DeliveryStarting).with_token(Arc::clone(&label)));

    let persisted = suspend.point(ctx.store.get_registration()).await??;
    let Some(raw) = persisted.filter(|raw| !raw.is_empty()) else {
        ctx.bus
            .publish(Event::new(EventKind::NotRegistered).with_token(label));
        return Ok(Delivery::NotRegistered);
    };
    let mut registration = Registration::parse(&raw)?;

    registration.pending_token = Some(token.clone());
    let pending = registration.to_json()?;
    suspend.point(ctx.store.set_registration(Some(pending))).await??;
    ctx.bus
        .publish(Event::new(EventKind::PendingPersisted).with_token(Arc::clone(&label)));

    let development = match ctx.environment.is_development().await {
        Ok(development) => development,
        Err(e) => {
            ctx.bus.publish(
                Event::new(EventKind::EnvironmentUnavailable)
                    .with_token(Arc::clone(&label))
                    .with_reason(format!("{e:#}")),
            );
            false
        }
    };
    let body = serde_json::to_string(&registration.request_body(&token, development)).map_err(
        |e| RegistrationError::NonRetryable {
            error: e.to_string(),
        },
    )?;

    let mut retries = Retries::new(ctx.backoff, {
        let ctx = Arc::clone(&ctx);
        let url: Arc<str> = registration.endpoint.as_str().into();
        let label = Arc::clone(&label);
        let mut round = 0u32;
        move |signal: RetrySignal| {
            round += 1;
            post_once(
                Arc::clone(&ctx),
                Arc::clone(&url),
                body.clone(),
                Arc::clone(&label),
                round,
                signal,
            )
        }
    });

    loop {
        match suspend.interruptible(retries.next()).await? {
            Some(Ok(round)) if round.is_done() => break,
            Some(Ok(_)) => {
                ctx.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_token(Arc::clone(&label))
                        .with_attempt(retries.rounds())
                        .with_delay(retries.pending_delay()),
                );
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }
    let attempts = retries.rounds();

    registration.pending_token = None;
    let cleared = registration.to_json()?;
    suspend.point(ctx.store.set_registration(Some(cleared))).await??;
    ctx.bus.publish(
        Event::new(EventKind::DeliverySucceeded)
            .with_token(label)
            .with_attempt(attempts),
    );

    Ok(Delivery::Registered { attempts })
}

/// One POST. Retryable failures are reported and flagged on `signal`.
async fn post_once(
    ctx: Arc<DeliveryContext>,
    url: Arc<str>,
    body: String,
    label: Arc<str>,
    attempt: u32,
    signal: RetrySignal,
) -> Result<(), RegistrationError> {
    let failure = match ctx.http.post(&url, JSON_HEADERS, body).await {
        Ok(response) if response.is_success() => return Ok(()),
        Ok(response) => RegistrationError::ServerRejected {
            status: response.status,
            body: response.body,
        },
        Err(e) => RegistrationError::from(e),
    };
    if !failure.is_retryable() {
        return Err(failure);
    }

    let mut ev = Event::new(EventKind::AttemptFailed)
        .with_token(label)
        .with_attempt(attempt)
        .with_reason(failure.as_message());
    if let RegistrationError::ServerRejected { status, .. } = &failure {
        ev = ev.with_status(*status);
    }
    ctx.bus.publish(ev);
    signal.retry();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::broadcast;
    use tokio::time::{self, Instant};

    use crate::error::HttpError;
    use crate::registration::environment::StaticEnvironment;
    use crate::registration::testing::{
        BrokenEnvironment, RecordingStore, ScriptedHttp, URL, body_of, registration,
    };
    use crate::supervisor::Interruptible;

    type Updater = Interruptible<DevicePushToken, Delivery, RegistrationError>;

    struct Harness {
        store: Arc<RecordingStore>,
        http: Arc<ScriptedHttp>,
        updater: Updater,
        events: broadcast::Receiver<Event>,
    }

    fn harness(store: RecordingStore, http: ScriptedHttp) -> Harness {
        harness_with(store, http, Arc::new(StaticEnvironment::production()))
    }

    fn harness_with(
        store: RecordingStore,
        http: ScriptedHttp,
        environment: Arc<dyn Environment>,
    ) -> Harness {
        let store = Arc::new(store);
        let http = Arc::new(http);
        let bus = Bus::new(256);
        let events = bus.subscribe();
        let ctx = Arc::new(DeliveryContext {
            store: store.clone(),
            http: http.clone(),
            environment,
            backoff: BackoffPolicy::default(),
            bus,
        });
        let updater: Updater =
            Interruptible::new(move |token, suspend| deliver(Arc::clone(&ctx), token, suspend));
        Harness {
            store,
            http,
            updater,
            events,
        }
    }

    fn kinds(events: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect()
    }

    fn token() -> DevicePushToken {
        DevicePushToken::ios("i-am-token")
    }

    #[tokio::test]
    async fn test_submits_custom_body_to_registration_url() {
        let h = harness(RecordingStore::with_registration(&registration()), ScriptedHttp::new());

        let outcome = h.updater.call(token()).await.unwrap();
        assert_eq!(outcome, Some(Delivery::Registered { attempts: 1 }));

        let sent = h.http.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, URL);
        assert_eq!(
            sent[0].body,
            r#"{"customArgument":"@tester","development":false,"deviceToken":"i-am-token","type":"apns"}"#
        );
        assert_eq!(
            sent[0].headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[tokio::test]
    async fn test_success_clears_pending_token() {
        let h = harness(RecordingStore::with_registration(&registration()), ScriptedHttp::new());
        h.updater.call(token()).await.unwrap();

        assert_eq!(
            h.store.pending_history(),
            vec![Some("i-am-token".to_string()), None]
        );
        let last = h.store.last_registration().unwrap();
        assert_eq!(last.endpoint, URL);
        assert!(last.pending_token.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_retried_with_identical_requests() {
        let http = ScriptedHttp::new()
            .then_status(500, "Server error")
            .then_status(500, "Server error")
            .then_status(200, "");
        let mut h = harness(RecordingStore::with_registration(&registration()), http);

        let start = Instant::now();
        let outcome = h.updater.call(token()).await.unwrap();
        assert_eq!(outcome, Some(Delivery::Registered { attempts: 3 }));
        // 500ms then 1000ms of backoff.
        assert!(start.elapsed() >= Duration::from_millis(1500));

        let sent = h.http.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|r| r.body == sent[0].body));
        assert!(h.store.last_registration().unwrap().pending_token.is_none());

        let kinds = kinds(&mut h.events);
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::AttemptFailed).count(),
            2
        );
        assert_eq!(kinds.last(), Some(&EventKind::DeliverySucceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_retried_without_surfacing() {
        let http = ScriptedHttp::new().then(Err(HttpError::Transport("connection reset".into())));
        let mut h = harness(RecordingStore::with_registration(&registration()), http);

        let outcome = h.updater.call(token()).await;
        assert!(matches!(outcome, Ok(Some(Delivery::Registered { attempts: 2 }))));
        assert_eq!(h.http.sent().len(), 2);

        let failed: Vec<Event> = std::iter::from_fn(|| h.events.try_recv().ok())
            .filter(|e| e.kind == EventKind::AttemptFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].status, None);
        assert_eq!(failed[0].attempt, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_event_reports_next_delay() {
        let http = ScriptedHttp::new()
            .then_status(503, "busy")
            .then_status(503, "busy");
        let mut h = harness(RecordingStore::with_registration(&registration()), http);
        h.updater.call(token()).await.unwrap();

        let delays: Vec<(Option<u32>, Option<u32>)> = std::iter::from_fn(|| h.events.try_recv().ok())
            .filter(|e| e.kind == EventKind::BackoffScheduled)
            .map(|e| (e.attempt, e.delay_ms))
            .collect();
        assert_eq!(delays, vec![(Some(1), Some(500)), (Some(2), Some(1000))]);
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_retried() {
        let http = ScriptedHttp::new().then(Err(HttpError::Request("relative URL".into())));
        let h = harness(RecordingStore::with_registration(&registration()), http);

        let err = h.updater.call(token()).await.unwrap_err();
        assert_eq!(err.as_label(), "non_retryable");
        assert_eq!(h.http.sent().len(), 1);
        // The obligation survives for a later resume.
        assert_eq!(h.store.pending_history(), vec![Some("i-am-token".to_string())]);
    }

    #[tokio::test]
    async fn test_nothing_persisted_sends_nothing() {
        let h = harness(RecordingStore::default(), ScriptedHttp::new());

        let outcome = h.updater.call(token()).await.unwrap();
        assert_eq!(outcome, Some(Delivery::NotRegistered));
        assert!(h.http.sent().is_empty());
        assert!(h.store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_persisted_value_sends_nothing() {
        let h = harness(RecordingStore::with_raw(""), ScriptedHttp::new());
        assert_eq!(
            h.updater.call(token()).await.unwrap(),
            Some(Delivery::NotRegistered)
        );
        assert!(h.http.sent().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_persisted_value_fails_without_side_effects() {
        let h = harness(RecordingStore::with_raw("{i-am-invalid-json"), ScriptedHttp::new());

        let err = h.updater.call(token()).await.unwrap_err();
        assert!(matches!(err, RegistrationError::MalformedPersistedState { .. }));
        assert!(h.http.sent().is_empty());
        assert!(h.store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_environment_failure_falls_back_to_production() {
        let mut h = harness_with(
            RecordingStore::with_registration(&registration()),
            ScriptedHttp::new(),
            Arc::new(BrokenEnvironment),
        );
        h.updater.call(token()).await.unwrap();

        assert_eq!(body_of(&h.http.sent()[0])["development"], serde_json::json!(false));
        assert!(kinds(&mut h.events).contains(&EventKind::EnvironmentUnavailable));
    }

    #[tokio::test]
    async fn test_development_flag_is_sent() {
        let h = harness_with(
            RecordingStore::with_registration(&registration()),
            ScriptedHttp::new(),
            Arc::new(StaticEnvironment::development()),
        );
        h.updater.call(DevicePushToken::android("fcm-token")).await.unwrap();

        let body = body_of(&h.http.sent()[0]);
        assert_eq!(body["development"], serde_json::json!(true));
        assert_eq!(body["type"], serde_json::json!("fcm"));
    }

    #[tokio::test]
    async fn test_abort_during_request_keeps_pending_token() {
        let h = harness(RecordingStore::with_registration(&registration()), ScriptedHttp::new());
        let updater = h.updater.clone();
        h.http.on_post(move || updater.abort());

        let outcome = h.updater.call(token()).await.unwrap();
        assert_eq!(outcome, None);
        assert_eq!(h.store.pending_history(), vec![Some("i-am-token".to_string())]);
        let last = h.store.last_registration().unwrap();
        assert_eq!(last.pending_token, Some(token()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_token_supersedes_retrying_delivery() {
        let http = ScriptedHttp::new().then_status(500, "Server error");
        let h = harness(RecordingStore::with_registration(&registration()), http);

        let first = tokio::spawn(h.updater.call(DevicePushToken::ios("token-a")));
        // Let A persist, fail once and enter its 500ms backoff.
        time::sleep(Duration::from_millis(100)).await;
        let second = h.updater.call(DevicePushToken::ios("token-b")).await.unwrap();

        assert_eq!(first.await.unwrap().unwrap(), None);
        assert_eq!(second, Some(Delivery::Registered { attempts: 1 }));

        assert_eq!(
            h.store.pending_history(),
            vec![
                Some("token-a".to_string()),
                Some("token-b".to_string()),
                None
            ]
        );
        let sent: Vec<String> = h
            .http
            .sent()
            .iter()
            .map(|r| body_of(r)["deviceToken"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(sent, vec!["token-a", "token-b"]);

        // A stays abandoned well past its backoff.
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.http.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_of_supersessions_leaves_only_latest_writes() {
        let http = ScriptedHttp::new()
            .then_status(500, "Server error")
            .then_status(500, "Server error")
            .then_status(500, "Server error");
        let h = harness(RecordingStore::with_registration(&registration()), http);

        // Each call fails once and sits in its 500ms backoff when the next arrives.
        let mut abandoned = Vec::new();
        for data in ["token-a", "token-b", "token-c"] {
            abandoned.push(tokio::spawn(h.updater.call(DevicePushToken::ios(data))));
            time::sleep(Duration::from_millis(100)).await;
        }
        let last = h.updater.call(DevicePushToken::ios("token-d")).await.unwrap();
        assert_eq!(last, Some(Delivery::Registered { attempts: 1 }));
        for handle in abandoned {
            assert_eq!(handle.await.unwrap().unwrap(), None);
        }

        // Well past every abandoned backoff.
        time::sleep(Duration::from_secs(10)).await;

        let history = h.store.pending_history();
        assert_eq!(
            history,
            vec![
                Some("token-a".to_string()),
                Some("token-b".to_string()),
                Some("token-c".to_string()),
                Some("token-d".to_string()),
                None
            ]
        );
        let from_latest = history
            .iter()
            .position(|p| p.as_deref() == Some("token-d"))
            .unwrap();
        assert_eq!(&history[from_latest..], &[Some("token-d".to_string()), None]);

        let sent: Vec<String> = h
            .http
            .sent()
            .iter()
            .map(|r| body_of(r)["deviceToken"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(sent, vec!["token-a", "token-b", "token-c", "token-d"]);
    }

    #[tokio::test]
    async fn test_back_to_back_calls_deliver_only_the_latest() {
        let h = harness(RecordingStore::with_registration(&registration()), ScriptedHttp::new());

        let a = h.updater.call(DevicePushToken::ios("token-a"));
        let b = h.updater.call(DevicePushToken::ios("token-b"));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap(), None);
        assert_eq!(b.unwrap(), Some(Delivery::Registered { attempts: 1 }));
        assert_eq!(h.http.sent().len(), 1);
        assert_eq!(
            h.store.last_registration().unwrap().pending_token,
            None
        );
        assert!(
            h.store
                .pending_history()
                .iter()
                .all(|p| p.as_deref() != Some("token-a"))
        );
    }
}
