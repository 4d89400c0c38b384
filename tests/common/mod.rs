//! Shared fixtures: a scripted in-memory page and an axum mock of the API

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, head};
use axum::{Json, Router};
use flowcheck::driver::traits::BrowserPage;
use flowcheck::utils::config::{Config, Timeouts};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn sample_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/assets/sample.txt")
}

pub fn assets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/assets")
}

/// Config with credentials and tiny budgets
pub fn test_config(api_base_url: &str) -> Config {
    let values: HashMap<String, String> = [
        ("UI_BASE_URL", "https://app.test"),
        ("UI_USERNAME", "qa@example.com"),
        ("UI_PASSWORD", "hunter2"),
        ("API_BASE_URL", api_base_url),
        ("API_TOKEN", "test-token"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let mut config = Config::from_map(&values);
    config.timeouts = Timeouts::scaled_down(150);
    config
}

// ============================================================================
// Scripted page
// ============================================================================

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub visible: bool,
    pub enabled: bool,
    pub value: String,
    pub text: Option<String>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            value: String::new(),
            text: None,
        }
    }
}

type Hook = Arc<dyn Fn(&mut FakeState) + Send + Sync>;

pub struct FakeState {
    pub url: String,
    pub ready_state: String,
    pub elements: HashMap<String, FakeElement>,
    /// Selectors starting with one of these count as visible elements
    pub visible_prefixes: Vec<String>,
    pub actions: Vec<String>,
    /// What a response-gated click observes
    pub save_status: Option<u16>,
    /// Every element query fails, as after a browser crash
    pub closed: bool,
    hooks: HashMap<String, Vec<Hook>>,
}

impl FakeState {
    pub fn show(&mut self, selector: &str) {
        self.elements
            .insert(selector.to_string(), FakeElement::default());
    }

    pub fn remove(&mut self, selector: &str) {
        self.elements.remove(selector);
    }

    fn element(&self, selector: &str) -> Option<FakeElement> {
        if let Some(el) = self.elements.get(selector) {
            return Some(el.clone());
        }
        self.visible_prefixes
            .iter()
            .any(|p| selector.starts_with(p.as_str()))
            .then(FakeElement::default)
    }

    fn run_hooks(&mut self, selector: &str) {
        if let Some(hooks) = self.hooks.get(selector).cloned() {
            for hook in hooks {
                hook(self);
            }
        }
    }
}

/// In-memory page whose DOM is a map from selector string to element state
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.to_string(),
                ready_state: "complete".to_string(),
                elements: HashMap::new(),
                visible_prefixes: Vec::new(),
                actions: Vec::new(),
                save_status: Some(200),
                closed: false,
                hooks: HashMap::new(),
            }),
        }
    }

    pub fn with<F: FnOnce(&mut FakeState)>(&self, f: F) -> &Self {
        f(&mut *self.state.lock().unwrap());
        self
    }

    pub fn show(&self, selector: &str) -> &Self {
        self.with(|s| s.show(selector))
    }

    pub fn show_all(&self, selectors: &[&str]) -> &Self {
        for selector in selectors {
            self.show(selector);
        }
        self
    }

    pub fn hide(&self, selector: &str) -> &Self {
        self.with(|s| {
            s.elements.insert(
                selector.to_string(),
                FakeElement {
                    visible: false,
                    ..FakeElement::default()
                },
            );
        })
    }

    pub fn disable(&self, selector: &str) -> &Self {
        self.with(|s| {
            if let Some(el) = s.elements.get_mut(selector) {
                el.enabled = false;
            }
        })
    }

    pub fn set_value(&self, selector: &str, value: &str) -> &Self {
        self.with(|s| {
            if let Some(el) = s.elements.get_mut(selector) {
                el.value = value.to_string();
            }
        })
    }

    pub fn set_text(&self, selector: &str, text: &str) -> &Self {
        self.with(|s| {
            s.elements.entry(selector.to_string()).or_default().text = Some(text.to_string());
        })
    }

    pub fn show_prefix(&self, prefix: &str) -> &Self {
        self.with(|s| s.visible_prefixes.push(prefix.to_string()))
    }

    pub fn close(&self) -> &Self {
        self.with(|s| s.closed = true)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.lock().unwrap().closed {
            Err(anyhow!("Target page, context or browser has been closed"))
        } else {
            Ok(())
        }
    }

    pub fn save_status(&self, status: Option<u16>) -> &Self {
        self.with(|s| s.save_status = status)
    }

    /// Run `hook` every time `selector` is clicked
    pub fn on_click<F>(&self, selector: &str, hook: F) -> &Self
    where
        F: Fn(&mut FakeState) + Send + Sync + 'static,
    {
        self.with(|s| {
            s.hooks
                .entry(selector.to_string())
                .or_default()
                .push(Arc::new(hook));
        })
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(selector)
            .map(|el| el.value.clone())
    }

    fn visible_element(&self, selector: &str) -> Result<()> {
        match self.state.lock().unwrap().element(selector) {
            Some(el) if el.visible => Ok(()),
            Some(_) => Err(anyhow!("{} is hidden", selector)),
            None => Err(anyhow!("{} not found", selector)),
        }
    }

    fn record(&self, action: String) {
        self.state.lock().unwrap().actions.push(action);
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    fn engine_name(&self) -> &str {
        "fake"
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.actions.push(format!("goto {}", url));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn ready_state(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().ready_state.clone())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.state.lock().unwrap().element(selector).map_or(0, |_| 1))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .element(selector)
            .map_or(false, |el| el.visible))
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .element(selector)
            .map_or(false, |el| el.enabled))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.visible_element(selector)?;
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("click {}", selector));
        state.run_hooks(selector);
        Ok(())
    }

    async fn double_click(&self, selector: &str) -> Result<()> {
        self.visible_element(selector)?;
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("dblclick {}", selector));
        state.run_hooks(selector);
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.visible_element(selector)?;
        let mut state = self.state.lock().unwrap();
        state.elements.entry(selector.to_string()).or_default().value = text.to_string();
        state.actions.push(format!("fill {} = {}", selector, text));
        Ok(())
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .element(selector)
            .map(|el| el.value)
            .unwrap_or_default())
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .element(selector)
            .and_then(|el| el.text))
    }

    async fn drag_to(&self, source: &str, target: &str) -> Result<()> {
        self.visible_element(source)?;
        self.visible_element(target)?;
        self.record(format!("drag {} -> {}", source, target));
        Ok(())
    }

    async fn set_input_files(&self, selector: &str, file: &Path) -> Result<()> {
        self.visible_element(selector)?;
        if !file.exists() {
            return Err(anyhow!("no such file {}", file.display()));
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.record(format!("upload {} {}", selector, name));
        Ok(())
    }

    async fn click_awaiting_success(
        &self,
        selector: &str,
        _timeout_ms: u64,
    ) -> Result<Option<u16>> {
        self.visible_element(selector)?;
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("save {}", selector));
        let status = state.save_status;
        if status.is_some() {
            state.run_hooks(selector);
        }
        Ok(status)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG fake")?;
        self.record(format!("screenshot {}", path.display()));
        Ok(())
    }
}

// ============================================================================
// Page fixtures
// ============================================================================

pub const USERNAME: &str = "input[name=\"email\"]";
pub const PASSWORD: &str = "input[name=\"password\"]";
pub const PASSWORD_TYPE: &str = "input[type=\"password\"]";
pub const SUBMIT: &str = "button[type=\"submit\"]";
pub const LOGOUT: &str = "text=Logout";

pub const AUTOMATION_MENU: &str = "nav a:has-text(\"Automation\")";
pub const CREATE_DROPDOWN: &str = "button:has-text(\"Create\")";
pub const RIGHT_PANEL: &str = "[class*=\"right-panel\"]";
pub const SAVE: &str = "button:has-text(\"Save\")";
pub const SAVED_TOAST: &str = "text=/saved successfully/i";

pub const FORM_OPTION: &str = "a:has-text(\"Form\")";
pub const FORM_NAME: &str = "input[name=\"formName\"]";
pub const CANVAS: &str = "[class*=\"canvas\"]";
pub const PALETTE: &str = "[class*=\"left-menu\"]";
pub const TEXTBOX: &str = "text=Textbox";
pub const SELECT_FILE: &str = "text=Select File";
pub const LABEL: &str = "input[name=\"label\"]";
pub const PLACEHOLDER: &str = "input[name=\"placeholder\"]";
pub const TEXT_INPUT: &str = "input[type=\"text\"]";
pub const FILE_INPUT: &str = "input[type=\"file\"]";
pub const UPLOAD_BUTTON: &str = "button:has-text(\"Upload\")";

pub const TASK_BOT_OPTION: &str = "a:has-text(\"Task Bot\")";
pub const TASK_NAME: &str = "input[name=\"taskName\"]";
pub const ACTIONS_PANEL: &str = "[class*=\"actions-panel\"]";
pub const SEARCH: &str = "input[placeholder*=\"search\" i]";
pub const MESSAGE_BOX: &str = "text=Message Box";
pub const MESSAGE: &str = "textarea[name=\"message\"]";
pub const TITLE: &str = "input[name=\"title\"]";
pub const DESCRIPTION: &str = "textarea[name=\"description\"]";

/// Login form that navigates to the dashboard on submit
pub fn login_page() -> FakePage {
    let page = FakePage::new("https://app.test/login");
    page.show_all(&[USERNAME, PASSWORD, PASSWORD_TYPE, SUBMIT])
        .on_click(SUBMIT, |s| {
            s.url = "https://app.test/#/home/dashboard".to_string();
            s.remove(USERNAME);
            s.remove(PASSWORD);
            s.remove(PASSWORD_TYPE);
            s.show(LOGOUT);
            s.show(AUTOMATION_MENU);
        });
    page
}

/// Navigation, create menu and save scaffolding shared by both builders
fn builder_scaffolding(page: &FakePage) {
    page.on_click(AUTOMATION_MENU, |s| {
        s.url = "https://app.test/#/bots/repository?automation".to_string();
        s.show(CREATE_DROPDOWN);
    })
    .on_click(SAVE, |s| s.show(SAVED_TOAST));
}

/// Form builder reachable from the Create menu
pub fn install_form_builder(page: &FakePage) {
    builder_scaffolding(page);
    page.on_click(CREATE_DROPDOWN, |s| s.show(FORM_OPTION))
        .on_click(FORM_OPTION, |s| s.show(FORM_NAME))
        .show_all(&[
            CANVAS,
            PALETTE,
            TEXTBOX,
            SELECT_FILE,
            RIGHT_PANEL,
            LABEL,
            TEXT_INPUT,
            FILE_INPUT,
            SAVE,
        ]);
}

/// Task bot editor with a Message Box action, reachable from the Create menu
pub fn install_task_bot(page: &FakePage) {
    builder_scaffolding(page);
    page.on_click(CREATE_DROPDOWN, |s| s.show(TASK_BOT_OPTION))
        .on_click(TASK_BOT_OPTION, |s| {
            s.show(TASK_NAME);
            s.show(DESCRIPTION);
        })
        .show_all(&[ACTIONS_PANEL, SEARCH, MESSAGE_BOX, RIGHT_PANEL, MESSAGE, SAVE]);
}

fn dashboard() -> FakePage {
    let page = FakePage::new("https://app.test/#/home/dashboard");
    page.show(AUTOMATION_MENU);
    page
}

/// Logged-in page with a fully rendered form builder
pub fn form_builder_page() -> FakePage {
    let page = dashboard();
    install_form_builder(&page);
    page
}

/// Logged-in page with a task bot editor
pub fn task_bot_page() -> FakePage {
    let page = dashboard();
    install_task_bot(&page);
    page
}

/// Login form in front of both builders
pub fn full_app_page() -> FakePage {
    let page = login_page();
    install_form_builder(&page);
    install_task_bot(&page);
    page
}

/// Index of the first recorded action starting with `prefix`
pub fn position(actions: &[String], prefix: &str) -> usize {
    actions
        .iter()
        .position(|a| a.starts_with(prefix))
        .unwrap_or_else(|| panic!("no action starting with {:?} in {:#?}", prefix, actions))
}

// ============================================================================
// Mock API
// ============================================================================

#[derive(Clone)]
pub struct MockBehavior {
    /// Status returned by POST
    pub create_status: StatusCode,
    /// Replace the created object's id
    pub id_override: Option<String>,
    /// Echo a different name than requested
    pub name_override: Option<String>,
    /// Extra fields merged into the POST response
    pub extra: Value,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            create_status: StatusCode::CREATED,
            id_override: None,
            name_override: None,
            extra: json!({}),
        }
    }
}

#[derive(Clone)]
pub struct MockApi {
    pub behavior: MockBehavior,
    pub store: Arc<Mutex<HashMap<String, Value>>>,
    pub seen_auth: Arc<Mutex<Vec<Option<String>>>>,
    /// Authorization headers seen by the UI landing page
    pub ui_seen_auth: Arc<Mutex<Vec<Option<String>>>>,
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record_auth(api: &MockApi, headers: &HeaderMap) {
    api.seen_auth.lock().unwrap().push(authorization(headers));
}

async fn ui_landing(State(api): State<MockApi>, headers: HeaderMap) -> StatusCode {
    api.ui_seen_auth.lock().unwrap().push(authorization(&headers));
    StatusCode::OK
}

async fn list_instances(State(api): State<MockApi>, headers: HeaderMap) -> Json<Value> {
    record_auth(&api, &headers);
    let items: Vec<Value> = api.store.lock().unwrap().values().cloned().collect();
    Json(json!({ "list": items }))
}

async fn create_instance(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_auth(&api, &headers);
    let mut store = api.store.lock().unwrap();
    let id = api
        .behavior
        .id_override
        .clone()
        .unwrap_or_else(|| format!("li_{}", store.len() + 1));
    let name = api
        .behavior
        .name_override
        .clone()
        .unwrap_or_else(|| body["name"].as_str().unwrap_or_default().to_string());

    let mut created = json!({
        "id": id,
        "name": name,
        "description": body["description"],
        "config": body["config"],
        "status": "ACTIVE",
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z",
    });
    if let (Some(target), Some(extra)) = (created.as_object_mut(), api.behavior.extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    store.insert(id, created.clone());
    (api.behavior.create_status, Json(created))
}

async fn get_instance(
    State(api): State<MockApi>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_auth(&api, &headers);
    match api.store.lock().unwrap().get(&id) {
        Some(found) => (StatusCode::OK, Json(found.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))),
    }
}

/// Serve the mock on an ephemeral port; returns its API base URL
///
/// The same server answers HEAD on `/ui` as a stand-in UI host.
pub async fn spawn_mock_api(behavior: MockBehavior) -> (String, MockApi) {
    let api = MockApi {
        behavior,
        store: Arc::new(Mutex::new(HashMap::new())),
        seen_auth: Arc::new(Mutex::new(Vec::new())),
        ui_seen_auth: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/v1/learning-instances", get(list_instances).post(create_instance))
        .route("/api/v1/learning-instances/:id", get(get_instance))
        .route("/ui", head(ui_landing))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/v1", addr), api)
}
