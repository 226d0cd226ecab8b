//! Integration tests for the server composition root.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{CoinhouseId, PersonaId};
use domain::Repositories;
use domain::ledger::{Deposit, GetBalance, Gold, OpenAccount};
use metrics_exporter_prometheus::PrometheusHandle;
use server::World;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, World) {
    let world = World::build(Repositories::in_memory()).unwrap();
    let app = server::create_app(&world, get_metrics_handle());
    (app, world)
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _world) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["in_flight_events"], 0);
}

#[tokio::test]
async fn test_metrics_after_deposit() {
    let (app, world) = setup();
    let open = OpenAccount::new(PersonaId::new(), CoinhouseId::new());
    let account = open.account_id();

    world.dispatcher.dispatch(open).await.unwrap();
    world
        .dispatcher
        .dispatch(Deposit::new(account, 25))
        .await
        .unwrap();
    world.dispatcher.drain().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("dispatch_commands_total"));
    assert!(body.contains("ledger_gold_moved_total"));
}

#[tokio::test]
async fn test_world_routes_every_service() {
    let (_app, world) = setup();

    assert!(world.dispatcher.handles_command::<OpenAccount>());
    assert!(world.dispatcher.handles_command::<domain::harvesting::HarvestResource>());
    assert!(world.dispatcher.handles_command::<domain::trait_budget::SpendTraitPoints>());
    assert!(world.dispatcher.handles_query::<GetBalance>());
}

#[tokio::test]
async fn test_shutdown_drains_and_flushes() {
    let (_app, world) = setup();
    let open = OpenAccount::new(PersonaId::new(), CoinhouseId::new());
    let account = open.account_id();

    world.dispatcher.dispatch(open).await.unwrap();
    world
        .dispatcher
        .dispatch(Deposit::new(account, 40))
        .await
        .unwrap();

    world.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(world.dispatcher.in_flight_publications(), 0);
    let balance = world.dispatcher.query(GetBalance::new(account)).await.unwrap();
    assert_eq!(balance, Some(Gold::new(40)));
}
