#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use dataproduct_api::pipeline::{
    AuditStore, ContractValidator, HttpForwarder, IngestRequest, Pipeline, PipelineError,
};

pub const CONTRACT_TEMPLATE: &str = "\
dataContractSpecification: 0.9.3
id: plant-report
info:
  title: Plant Report
  version: 1.0.0
servers:
  production:
    type: local
    path: uploads/report.json
    format: json
models:
  plant_report:
    type: table
";

/// The Zona Franca request: one line, L1, fed by every source
pub fn ingest_body() -> Value {
    json!({
        "sap": { "details": { "employee_costs": "25000€", "sap_plant": "Zona Franca" } },
        "gmao": { "details": {
            "gmao_location": "Zona Franca",
            "gmao_worklines": [
                { "workline_id": "L1", "electric_usage": "1200 kW", "downtime_total": "90" }
            ]
        } },
        "clear": { "details": {
            "line_id": "L1",
            "input_material": "50 Toneladas",
            "output_products": [
                { "product_type": "Material A", "product_amount": "30" },
                { "product_type": "Material B", "product_amount": "20" }
            ]
        } },
        "bim": { "details": {
            "plant_location": "Zona Franca",
            "bim_worklines": [ { "ID_Linea": "L1", "line_name": "Tratamiento industriales y otros" } ]
        } }
    })
}

pub fn ingest_request() -> IngestRequest {
    serde_json::from_value(ingest_body()).expect("fixture deserializes")
}

/// Validator fake: accepts everything, or rejects with a fixed diagnostic
pub struct FakeValidator {
    pub rejection: Option<String>,
    pub seen: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self { rejection: None, seen: Mutex::new(Vec::new()) })
    }

    pub fn rejecting(diagnostic: &str) -> Arc<Self> {
        Arc::new(Self { rejection: Some(diagnostic.to_string()), seen: Mutex::new(Vec::new()) })
    }

    /// Contents of every bound contract this validator was handed
    pub fn contracts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractValidator for FakeValidator {
    fn name(&self) -> &'static str {
        "FakeValidator"
    }

    async fn validate(&self, contract_path: &Path) -> Result<(), PipelineError> {
        let content = std::fs::read_to_string(contract_path).map_err(|e| PipelineError::Validation(e.to_string()))?;
        self.seen.lock().unwrap().push(content);
        match &self.rejection {
            Some(diagnostic) => Err(PipelineError::Validation(diagnostic.clone())),
            None => Ok(()),
        }
    }
}

/// Pipeline writing into `dir` and forwarding over HTTP to `target_url`
pub fn test_pipeline(dir: &Path, validator: Arc<FakeValidator>, target_url: &str) -> Pipeline {
    let contract = dir.join("datacontract.yaml");
    std::fs::write(&contract, CONTRACT_TEMPLATE).expect("write contract template");

    Pipeline::new(
        AuditStore::new(dir.join("uploads"), true),
        contract,
        validator,
        Arc::new(HttpForwarder::new(Duration::from_secs(2)).expect("http client")),
        target_url,
    )
}

#[derive(Clone)]
struct DownstreamState {
    status: StatusCode,
    body: String,
    delay: Duration,
    received: Arc<Mutex<Vec<Value>>>,
}

/// Downstream API stand-in on a free local port
pub struct FakeDownstream {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FakeDownstream {
    pub async fn ok(body: Value) -> Result<Self> {
        Self::start(StatusCode::OK, body.to_string(), Duration::ZERO).await
    }

    pub async fn start(status: StatusCode, body: String, delay: Duration) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let received = Arc::new(Mutex::new(Vec::new()));

        let state = DownstreamState { status, body, delay, received: received.clone() };
        let app = Router::new().route("/reports", post(receive)).with_state(state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { url: format!("http://{}/reports", addr), received })
    }

    /// Bodies posted so far, oldest first
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

async fn receive(State(state): State<DownstreamState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.received.lock().unwrap().push(body);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, state.body.clone())
}

/// URL on a port nothing listens on
pub fn unreachable_url() -> String {
    let port = portpicker::pick_unused_port().expect("free port");
    format!("http://127.0.0.1:{}/reports", port)
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dataproduct-api"));
        cmd.env("DATAPRODUCT_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // The database may be absent in CI; a 503 still means the server is up
                if resp.status() == reqwest::StatusCode::OK
                    || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Drive a router in-process; an empty response body reads as null
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&Value>,
) -> Result<(StatusCode, Value)> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(axum::body::Body::from(serde_json::to_vec(body)?))?,
        None => builder.body(axum::body::Body::empty())?,
    };

    let response = tower::ServiceExt::oneshot(app, request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, json))
}

/// CRUD tests need Postgres; they are skipped when DATABASE_URL is not set
pub fn database_configured() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").is_ok()
}
