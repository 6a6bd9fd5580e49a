use std::{
    collections::{BTreeSet, HashMap},
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, TimeDelta, TimeZone as _, Utc};
use lotto_draw::scheduled_date;
use lotto_resolver::{
    BootstrapLoader, DrawResolver, ManualClock, ResolverState, TtlCache,
    config::{CacheConfig, UpstreamConfig},
    server::build_router,
};
use serde_json::{Value, json};

fn numbers_for(draw_no: u32) -> [u32; 6] {
    let base = draw_no % 39 + 1;
    [base, base + 1, base + 2, base + 3, base + 4, base + 5]
}

fn date_for(draw_no: u32) -> String {
    scheduled_date(draw_no)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Default)]
struct Upstream {
    bulk: BTreeSet<u32>,
    mirror: BTreeSet<u32>,
    page: BTreeSet<u32>,
    bulk_down: AtomicBool,
    bulk_hits: AtomicUsize,
    mirror_hits: AtomicUsize,
}

async fn bulk(State(upstream): State<Arc<Upstream>>) -> Response {
    upstream.bulk_hits.fetch_add(1, Ordering::SeqCst);
    if upstream.bulk_down.load(Ordering::SeqCst) {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    let rows: Vec<Value> = upstream
        .bulk
        .iter()
        .map(|&n| {
            let [n1, n2, n3, n4, n5, n6] = numbers_for(n);
            json!({
                "ltEpsd": n,
                "tm1WnNo": n1, "tm2WnNo": n2, "tm3WnNo": n3,
                "tm4WnNo": n4, "tm5WnNo": n5, "tm6WnNo": n6,
                "bnsWnNo": 45,
                "ltRflYmd": date_for(n).replace('-', ""),
                "rnk1WnAmt": 1_000_000,
            })
        })
        .collect();
    Json(json!({ "result": { "pstLtEpsdInfo": rows } })).into_response()
}

async fn mirror(
    State(upstream): State<Arc<Upstream>>,
    Query(query): Query<HashMap<String, u32>>,
) -> Json<Value> {
    upstream.mirror_hits.fetch_add(1, Ordering::SeqCst);
    let draw_no = query.get("drwNo").copied().unwrap_or_default();
    if !upstream.mirror.contains(&draw_no) {
        return Json(json!({ "returnValue": "fail" }));
    }
    let [n1, n2, n3, n4, n5, n6] = numbers_for(draw_no);
    Json(json!({
        "returnValue": "success",
        "drwNo": draw_no,
        "drwNoDate": date_for(draw_no),
        "drwtNo1": n1, "drwtNo2": n2, "drwtNo3": n3,
        "drwtNo4": n4, "drwtNo5": n5, "drwtNo6": n6,
        "bnusNo": 45,
        "firstWinamnt": 2_000_000,
    }))
}

async fn page(
    State(upstream): State<Arc<Upstream>>,
    Query(query): Query<HashMap<String, u32>>,
) -> Html<String> {
    let draw_no = query.get("drwNo").copied().unwrap_or_default();
    if !upstream.page.contains(&draw_no) {
        return Html("<html><body><p>no result</p></body></html>".to_owned());
    }
    let balls: String = numbers_for(draw_no)
        .iter()
        .map(|n| format!(r#"<span class="ball_645">{n}</span>"#))
        .collect();
    Html(format!(
        r#"<div class="win_result"><p class="desc">({} 추첨)</p>
           <div class="num win"><p>{balls}</p></div>
           <div class="num bonus"><p><span class="ball_645">45</span></p></div></div>"#,
        date_for(draw_no)
    ))
}

async fn spawn(app: Router) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {e}");
        }
    });
    Ok(addr)
}

struct Harness {
    base: String,
    upstream: Arc<Upstream>,
    clock: Arc<ManualClock>,
    client: reqwest::Client,
}

impl Harness {
    async fn start(upstream: Upstream, seed: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let upstream = Arc::new(upstream);
        let fake = Router::new()
            .route("/bulk", get(bulk))
            .route("/mirror", get(mirror))
            .route("/page", get(page))
            .with_state(Arc::clone(&upstream));
        let upstream_addr = spawn(fake).await?;

        let config = UpstreamConfig {
            bulk_url: format!("http://{upstream_addr}/bulk"),
            mirror_urls: vec![format!("http://{upstream_addr}/mirror?drwNo={{drawNo}}")],
            page_url: format!("http://{upstream_addr}/page?drwNo={{drawNo}}"),
            timeout_ms: 2_000,
            qps: 0,
        };
        let cache = CacheConfig::default();
        let clock = Arc::new(ManualClock::new(draw_night()));

        let resolver = DrawResolver::from_config(&config, &cache, clock.clone())?;
        let seed_path = seed
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| std::env::temp_dir().join("lotto-resolver-absent-seed.json"));
        let bootstrap = BootstrapLoader::new(
            seed_path,
            TtlCache::new(cache.bootstrap_ttl(), clock.clone()),
        );
        let state = ResolverState::new(resolver, bootstrap, clock.clone());
        let addr = spawn(build_router(state)).await?;

        Ok(Self {
            base: format!("http://{addr}"),
            upstream,
            clock,
            client: reqwest::Client::new(),
        })
    }

    async fn get(&self, path: &str) -> anyhow::Result<(StatusCode, Value)> {
        let response = self.client.get(format!("{}{path}", self.base)).send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())?;
        Ok((status, response.json().await?))
    }
}

fn draw_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 3, 21, 0, 0)
        .single()
        .unwrap_or_default()
}

fn draw_nos(body: &Value) -> Vec<u64> {
    body["draws"]
        .as_array()
        .map(|draws| draws.iter().filter_map(|d| d["drawNo"].as_u64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_server_time() -> anyhow::Result<()> {
    let harness = Harness::start(Upstream::default(), None).await?;
    let (status, body) = harness.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["now"], draw_night().to_rfc3339());
    Ok(())
}

#[tokio::test]
async fn latest_comes_from_bulk_listing() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk: (1..=1105).collect(),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (status, body) = harness.get("/api/lotto/latest").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "latestDrawNo": 1105 }));
    assert_eq!(harness.upstream.mirror_hits.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn latest_probes_fallbacks_when_bulk_is_down() -> anyhow::Result<()> {
    let upstream = Upstream {
        mirror: (1..=1104).collect(),
        bulk_down: AtomicBool::new(true),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (status, body) = harness.get("/api/lotto/latest").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latestDrawNo"], 1104);
    Ok(())
}

#[tokio::test]
async fn unresolvable_latest_is_service_unavailable() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk_down: AtomicBool::new(true),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (status, body) = harness.get("/api/lotto/latest").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn invalid_ranges_are_rejected() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk: (1..=1105).collect(),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    for query in [
        "start=0&end=10",
        "start=10&end=5",
        "start=1&end=302",
        "start=abc&end=3",
        "end=3",
    ] {
        let (status, body) = harness.get(&format!("/api/lotto/draws?{query}")).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
        assert!(body["message"].is_string(), "query {query}");
    }

    let (status, body) = harness.get("/api/lotto/draws?start=1&end=301").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draw_nos(&body).len(), 301);
    assert_eq!(body["missing"], json!([]));
    Ok(())
}

#[tokio::test]
async fn narrow_ranges_fall_back_to_mirror_and_page() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk: (1100..=1105).collect(),
        mirror: BTreeSet::from([1106]),
        page: BTreeSet::from([1107]),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (status, body) = harness.get("/api/lotto/draws?start=1106&end=1108").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draw_nos(&body), [1106, 1107]);
    assert_eq!(body["missing"], json!([1108]));
    assert_eq!(body["draws"][0]["firstPrizeAmount"], 2_000_000);
    assert_eq!(body["draws"][1]["firstPrizeAmount"], 0);
    assert_eq!(body["draws"][1]["drawDate"], date_for(1107));

    let mirror_hits = harness.upstream.mirror_hits.load(Ordering::SeqCst);
    let (_, body) = harness.get("/api/lotto/draws?start=1100&end=1110").await?;
    assert_eq!(draw_nos(&body), [1100, 1101, 1102, 1103, 1104, 1105, 1106, 1107]);
    assert_eq!(body["missing"], json!([1108, 1109, 1110]));
    assert_eq!(
        harness.upstream.mirror_hits.load(Ordering::SeqCst),
        mirror_hits,
        "wide ranges must not reach the mirrors"
    );
    Ok(())
}

#[tokio::test]
async fn stale_bulk_listing_serves_when_refresh_fails() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk: (1100..=1105).collect(),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (_, body) = harness.get("/api/lotto/draws?start=1100&end=1101").await?;
    assert_eq!(draw_nos(&body), [1100, 1101]);
    assert_eq!(harness.upstream.bulk_hits.load(Ordering::SeqCst), 1);

    let (_, body) = harness.get("/api/lotto/draws?start=1102&end=1103").await?;
    assert_eq!(draw_nos(&body), [1102, 1103]);
    assert_eq!(
        harness.upstream.bulk_hits.load(Ordering::SeqCst),
        1,
        "fresh listing is reused"
    );

    harness.upstream.bulk_down.store(true, Ordering::SeqCst);
    harness.clock.advance(TimeDelta::seconds(31));

    let (status, body) = harness.get("/api/lotto/draws?start=1104&end=1105").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draw_nos(&body), [1104, 1105]);
    assert_eq!(harness.upstream.bulk_hits.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn failed_bulk_refresh_is_not_repeated_within_its_ttl() -> anyhow::Result<()> {
    let upstream = Upstream {
        bulk_down: AtomicBool::new(true),
        ..Upstream::default()
    };
    let harness = Harness::start(upstream, None).await?;

    let (status, body) = harness.get("/api/lotto/draws?start=1&end=50").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["missing"].as_array().map(Vec::len), Some(50));
    assert_eq!(harness.upstream.bulk_hits.load(Ordering::SeqCst), 1);

    let (status, _) = harness.get("/api/lotto/latest").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        harness.upstream.bulk_hits.load(Ordering::SeqCst),
        2,
        "only the forced refresh reaches the bulk host"
    );

    harness.clock.advance(TimeDelta::seconds(31));
    harness.get("/api/lotto/draws?start=1&end=10").await?;
    assert_eq!(harness.upstream.bulk_hits.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn bootstrap_serves_seed_or_not_found() -> anyhow::Result<()> {
    let harness = Harness::start(Upstream::default(), None).await?;
    let (status, body) = harness.get("/api/lotto/bootstrap").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let dir = tempfile::tempdir()?;
    let seed = dir.path().join("seed.json");
    std::fs::write(
        &seed,
        r#"{"draws":[
            {"drawNo":2,"drawDate":"2002-12-14","numbers":[9,13,21,25,32,42],"bonus":2,"firstPrizeAmount":2002006800},
            {"drawNo":1,"drawDate":"2002-12-07","numbers":[10,23,29,33,37,40],"bonus":16,"firstPrizeAmount":0},
            {"drawNo":3,"drawDate":"2002-12-21","numbers":[11,16,19,21,27],"bonus":31,"firstPrizeAmount":0}
        ]}"#,
    )?;
    let harness = Harness::start(Upstream::default(), Some(&seed)).await?;
    let (status, body) = harness.get("/api/lotto/bootstrap").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draw_nos(&body), [1, 2]);
    Ok(())
}

#[tokio::test]
async fn openapi_document_lists_endpoints() -> anyhow::Result<()> {
    let harness = Harness::start(Upstream::default(), None).await?;
    let (status, body) = harness.get("/api/docs/openapi.json").await?;
    assert_eq!(status, StatusCode::OK);
    for path in ["/health", "/api/lotto/latest", "/api/lotto/bootstrap", "/api/lotto/draws"] {
        assert!(body["paths"][path].is_object(), "missing {path}");
    }
    Ok(())
}
