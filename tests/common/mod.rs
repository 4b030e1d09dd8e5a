//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use hospfin::config::AppConfig;
use hospfin::http::{Collaborators, HttpServer};
use hospfin::lifecycle::Shutdown;
use hospfin::notify::LoggingPushSender;
use hospfin::security::rbac::{Identity, Role};
use hospfin::store::memory::MemorySessions;
use hospfin::store::{Account, AccountStatus, Glosa, GlosaStatus, MemoryDatabase};

/// A running server plus everything a test needs to drive it.
pub struct TestApp {
    pub addr: SocketAddr,
    pub organization_id: Uuid,
    pub admin_token: String,
    pub operator_token: String,
    pub viewer_token: String,
    pub db: Arc<MemoryDatabase>,
    pub shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Spawn the real server on an ephemeral port with one seeded
/// organization (admin, operator, viewer).
pub async fn spawn_app(config: AppConfig) -> TestApp {
    let db = Arc::new(MemoryDatabase::new());
    let sessions = Arc::new(MemorySessions::new());
    let organization_id = Uuid::new_v4();

    let mint = |role: Role, label: &str| {
        let user_id = Uuid::new_v4();
        let token = format!("test-{}-{}", label, Uuid::new_v4());
        sessions.register(
            &token,
            Identity {
                user_id,
                email: format!("{}@hospital.test", label),
            },
        );
        db.add_membership(user_id, organization_id, role);
        token
    };

    let admin_token = mint(Role::Admin, "admin");
    let operator_token = mint(Role::Operator, "operator");
    let viewer_token = mint(Role::Viewer, "viewer");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(
        config,
        Collaborators {
            db: db.clone(),
            sessions,
            push: Arc::new(LoggingPushSender),
        },
    );
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Give the acceptor a moment to come up.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestApp {
        addr,
        organization_id,
        admin_token,
        operator_token,
        viewer_token,
        db,
        shutdown,
    }
}

/// Insert an account directly into the backing store.
#[allow(dead_code)]
pub fn seed_account(
    db: &MemoryDatabase,
    organization_id: Uuid,
    cpf: Option<&str>,
    status: AccountStatus,
) -> Account {
    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        organization_id,
        patient_name: "Maria Souza".into(),
        patient_cpf: cpf.map(str::to_string),
        insurer: "Unimed".into(),
        amount_cents: 150_000,
        status,
        created_at: now,
        updated_at: now,
    };
    db.add_account(account.clone());
    account
}

/// Insert a glosa directly into the backing store.
#[allow(dead_code)]
pub fn seed_glosa(db: &MemoryDatabase, organization_id: Uuid, account_id: Uuid) -> Glosa {
    let glosa = Glosa {
        id: Uuid::new_v4(),
        organization_id,
        account_id,
        code: "1705".into(),
        reason: "Cobrança em duplicidade".into(),
        amount_cents: 12_000,
        status: GlosaStatus::Open,
        created_at: Utc::now(),
    };
    db.add_glosa(glosa.clone());
    glosa
}

/// Client that never picks up a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
