#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin_password";
pub const CITIZEN_USER: &str = "asha";
pub const CITIZEN_PASSWORD: &str = "asha_password";

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    api: Option<String>,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&home).expect("create isolated home");
        Self {
            _tmp: tmp,
            home,
            api: None,
        }
    }

    /// Isolated home pointed at a freshly started mock backend.
    pub fn with_backend() -> Self {
        let mut env = Self::new();
        env.api = Some(spawn_backend_thread());
        env
    }

    pub fn session_file(&self) -> PathBuf {
        self.home.join(".config/satark/session.json")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("satark");
        cmd.env("HOME", &self.home)
            .env_remove("SATARK_PASSWORD")
            .env_remove("RUST_LOG");
        match &self.api {
            Some(url) => cmd.env("SATARK_API_URL", url),
            None => cmd.env_remove("SATARK_API_URL"),
        };
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn login_admin(&self) -> Value {
        self.run_json(&["login", ADMIN_USER, "--password", ADMIN_PASSWORD])
    }

    pub fn login_citizen(&self) -> Value {
        self.run_json(&["login", CITIZEN_USER, "--password", CITIZEN_PASSWORD])
    }
}

struct Account {
    id: i64,
    username: String,
    password: String,
    role: String,
}

struct Backend {
    accounts: Vec<Account>,
    applications: Vec<Value>,
}

type Shared = Arc<Mutex<Backend>>;
type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn fail(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn seeded() -> Backend {
    Backend {
        accounts: vec![
            Account {
                id: 1,
                username: ADMIN_USER.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                role: "admin".to_string(),
            },
            Account {
                id: 2,
                username: CITIZEN_USER.to_string(),
                password: CITIZEN_PASSWORD.to_string(),
                role: "citizen".to_string(),
            },
        ],
        applications: vec![
            json!({
                "id": 1, "user_id": "17", "pan_number": "QWERT5678K",
                "target_bank_account": "50100234", "status": "Red: Blocked",
                "fraud_score": 0.95, "flag_reason": "Anomalous Proxy Network Detected",
                "yearly_incomes": {"2023-2024": 0.0}, "calculated_pan_income": 0.0
            }),
            json!({
                "id": 2, "user_id": "23", "pan_number": "LMNOP4321Z",
                "target_bank_account": "60200411", "status": "Yellow: Manual Audit",
                "fraud_score": 0.55, "flag_reason": "Income Mismatch",
                "yearly_incomes": {"2023-2024": 450000.0}, "calculated_pan_income": 450000.0
            }),
            json!({
                "id": 3, "user_id": "31", "pan_number": "ZXCVB9876M",
                "target_bank_account": "70300999", "status": "Under Review",
                "fraud_score": 0.12, "flag_reason": null,
                "yearly_incomes": {}, "calculated_pan_income": null
            }),
        ],
    }
}

fn bearer(state: &Backend, headers: &HeaderMap) -> Result<(i64, String), (StatusCode, Json<Value>)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    state
        .accounts
        .iter()
        .find(|a| format!("token-{}", a.username) == token)
        .map(|a| (a.id, a.role.clone()))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
}

fn admin_only(state: &Backend, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    match bearer(state, headers)? {
        (_, role) if role == "admin" => Ok(()),
        _ => Err(fail(StatusCode::FORBIDDEN, "Admin access required")),
    }
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(s): State<Shared>, Form(form): Form<LoginForm>) -> Reply {
    let st = s.lock();
    let account = st
        .accounts
        .iter()
        .find(|a| a.username == form.username && a.password == form.password)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Incorrect username or password"))?;
    Ok(Json(json!({
        "access_token": format!("token-{}", account.username),
        "token_type": "bearer",
        "role": account.role,
    })))
}

#[derive(Deserialize)]
struct SignupBody {
    username: String,
    password: String,
    role: String,
}

async fn signup(State(s): State<Shared>, Json(body): Json<SignupBody>) -> Reply {
    let mut st = s.lock();
    if st.accounts.iter().any(|a| a.username == body.username) {
        return Err(fail(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    let id = st.accounts.len() as i64 + 1;
    st.accounts.push(Account {
        id,
        username: body.username,
        password: body.password,
        role: body.role,
    });
    Ok(Json(json!({ "message": "User created successfully" })))
}

async fn apply(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut st = s.lock();
    let (user_id, _) = bearer(&st, &headers)?;
    let pan = body["pan_number"].as_str().unwrap_or_default().to_string();
    let blocked = pan.starts_with("FAKE");
    let (status, score, reason) = if blocked {
        ("Red: Blocked", 0.97, Value::from("Synthetic Identity Pattern"))
    } else {
        ("Under Review", 0.08, Value::Null)
    };
    st.applications
        .retain(|a| a["user_id"].as_str() != Some(user_id.to_string().as_str()));
    let id = st
        .applications
        .iter()
        .filter_map(|a| a["id"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    st.applications.push(json!({
        "id": id, "user_id": user_id.to_string(), "pan_number": pan,
        "target_bank_account": body["target_bank_account"], "status": status,
        "fraud_score": score, "flag_reason": reason,
        "yearly_incomes": {}, "calculated_pan_income": null
    }));
    Ok(Json(json!({
        "message": "Application submitted successfully. Under verification.",
        "status": status,
    })))
}

async fn my_application(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    let st = s.lock();
    let (user_id, _) = bearer(&st, &headers)?;
    let own = st
        .applications
        .iter()
        .find(|a| a["user_id"].as_str() == Some(user_id.to_string().as_str()))
        .cloned();
    Ok(Json(match own {
        Some(record) => json!({ "data": record }),
        None => json!({ "data": null, "message": "No application found" }),
    }))
}

async fn applications(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let st = s.lock();
    admin_only(&st, &headers)?;
    let filter = params.get("user_id").map(String::as_str).unwrap_or_default();
    let rows: Vec<Value> = st
        .applications
        .iter()
        .filter(|a| filter.is_empty() || a["user_id"].as_str() == Some(filter))
        .cloned()
        .collect();
    Ok(Json(Value::Array(rows)))
}

async fn stats(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    let st = s.lock();
    admin_only(&st, &headers)?;
    let blocked = st
        .applications
        .iter()
        .filter(|a| a["status"] == "Red: Blocked")
        .count();
    let total = st.applications.len();
    Ok(Json(json!({
        "total_applications": total,
        "real_applications": total - blocked,
        "fake_applications": blocked,
        "funds_saved": blocked as f64 * 6000.0,
    })))
}

async fn threat_analytics(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    let st = s.lock();
    admin_only(&st, &headers)?;
    let mut counts: Vec<(String, u64)> = Vec::new();
    for reason in st.applications.iter().filter_map(|a| a["flag_reason"].as_str()) {
        match counts.iter_mut().find(|(c, _)| c == reason) {
            Some((_, n)) => *n += 1,
            None => counts.push((reason.to_string(), 1)),
        }
    }
    Ok(Json(Value::Array(
        counts
            .into_iter()
            .map(|(category, count)| json!({ "category": category, "count": count }))
            .collect(),
    )))
}

async fn action(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut st = s.lock();
    admin_only(&st, &headers)?;
    let status = match body["action"].as_str() {
        Some("approve") | Some("force_approve") => "Approved",
        Some("flag_rbi") => "Under Investigation",
        _ => return Err(fail(StatusCode::BAD_REQUEST, "Invalid action")),
    };
    let record = st
        .applications
        .iter_mut()
        .find(|a| a["id"].as_i64() == Some(id))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Application not found"))?;
    record["status"] = Value::from(status);
    Ok(Json(json!({
        "status": "success",
        "message": format!("Application {id} updated to {status}"),
    })))
}

async fn users(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    let st = s.lock();
    admin_only(&st, &headers)?;
    Ok(Json(Value::Array(
        st.accounts
            .iter()
            .map(|a| json!({ "id": a.id, "username": a.username, "role": a.role }))
            .collect(),
    )))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/signup", post(signup))
        .route("/api/apply", post(apply))
        .route("/api/my-application", get(my_application))
        .route("/api/applications", get(applications))
        .route("/api/applications/:id/action", post(action))
        .route("/api/stats", get(stats))
        .route("/api/threat-analytics", get(threat_analytics))
        .route("/api/users", get(users))
        .with_state(Arc::new(Mutex::new(seeded())))
}

/// Mock backend on the caller's runtime.
pub async fn spawn_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        axum::serve(listener, router()).await.expect("serve mock backend");
    });
    format!("http://{addr}")
}

/// Mock backend on its own thread, for tests that drive the binary.
pub fn spawn_backend_thread() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("mock backend runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind mock backend");
            let addr = listener.local_addr().expect("mock backend addr");
            tx.send(format!("http://{addr}")).expect("report backend addr");
            axum::serve(listener, router()).await.expect("serve mock backend");
        });
    });
    rx.recv().expect("mock backend address")
}
