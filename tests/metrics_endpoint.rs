mod support;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use poolwatch::models::{LiquidStakingState, Pair};
use poolwatch::server;
use poolwatch::store::SnapshotStore;
use support::dec;
use tokio::net::TcpListener;

async fn spawn_server(store: Arc<SnapshotStore>) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(server::serve(listener, store));
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn scrape_before_any_refresh_returns_empty_body() -> Result<()> {
    let store = Arc::new(SnapshotStore::new());
    let base = spawn_server(store).await?;

    let response = reqwest::get(format!("{base}/metrics")).await?;
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("text/plain"),
        "unexpected content type: {content_type}"
    );
    assert_eq!(response.text().await?, "");

    Ok(())
}

#[tokio::test]
async fn scrape_reflects_the_published_snapshot() -> Result<()> {
    let store = Arc::new(SnapshotStore::new());
    store
        .replace_pairs(HashMap::from([(
            1,
            Pair {
                id: 1,
                base_denom: "uatom".to_string(),
                quote_denom: "uusdc".to_string(),
                num_orders: 42,
                last_price: Some(dec("2.75")),
                current_batch_id: 9,
            },
        )]))
        .await;
    store
        .replace_liquid_staking(LiquidStakingState {
            mint_rate: dec("1.05"),
            derivative_supply: dec("2.5"),
        })
        .await;

    let base = spawn_server(store).await?;
    let body = reqwest::get(format!("{base}/metrics")).await?.text().await?;

    assert!(body.contains("# TYPE poolwatch_pair_orders gauge\n"));
    assert!(body.contains("poolwatch_pair_orders{pair_id=\"1\"} 42\n"));
    assert!(body.contains("poolwatch_pair_last_price{pair_id=\"1\"} 2.75\n"));
    assert!(body.contains("poolwatch_mint_rate 1.05\n"));
    // Domains that never refreshed emit nothing, not a zero placeholder.
    assert!(!body.contains("poolwatch_pool_"));
    assert!(!body.contains("poolwatch_balance_"));

    Ok(())
}

#[tokio::test]
async fn healthz_answers_ok() -> Result<()> {
    let store = Arc::new(SnapshotStore::new());
    let base = spawn_server(store).await?;

    let response = reqwest::get(format!("{base}/healthz")).await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "ok");

    Ok(())
}
