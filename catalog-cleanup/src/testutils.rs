use crate::catalog::{CatalogApi, CatalogItem, Group, ItemUpdate};
use crate::errors::CatalogError;
use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use shared::retry::RetryError;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone, Debug, PartialEq)]
pub enum FakeCall {
    ListGroups { needle: String, page: u32 },
    ListItems { group_id: i64 },
    Update { item_id: i64, update: ItemUpdate },
    Create { name: String },
    Delete { group_id: i64 },
}

impl FakeCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            FakeCall::Update { .. } | FakeCall::Create { .. } | FakeCall::Delete { .. }
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeItem {
    pub group_id: i64,
    pub code: String,
}

#[derive(Default)]
struct FakeState {
    groups: BTreeMap<i64, String>,
    items: BTreeMap<i64, FakeItem>,
    next_id: i64,
    calls: Vec<FakeCall>,
    failing_updates: HashSet<(i64, ItemUpdateKind)>,
    fail_group_listing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemUpdateKind {
    AssignGroup,
    ClearCode,
}

impl From<ItemUpdate> for ItemUpdateKind {
    fn from(update: ItemUpdate) -> Self {
        match update {
            ItemUpdate::AssignGroup(_) => ItemUpdateKind::AssignGroup,
            ItemUpdate::ClearCode => ItemUpdateKind::ClearCode,
        }
    }
}

fn fake_error(path: &'static str, status: StatusCode, body: &str) -> CatalogError {
    CatalogError::Upstream {
        path,
        source: RetryError::Status {
            status,
            body: body.to_string(),
        },
    }
}

fn page_of<T: Clone>(rows: &[T], page: u32, size: u32) -> Vec<T> {
    let start = (page.saturating_sub(1) as usize) * size as usize;
    rows.iter().skip(start).take(size as usize).cloned().collect()
}

/// In-memory catalog that behaves like the real service and records every call.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        let catalog = Self::default();
        catalog.state.lock().unwrap().next_id = 100;
        catalog
    }

    pub fn add_group(&self, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.groups.insert(id, name.to_string());
        id
    }

    pub fn add_item(&self, item_id: i64, group_id: i64, code: &str) {
        self.state.lock().unwrap().items.insert(
            item_id,
            FakeItem {
                group_id,
                code: code.to_string(),
            },
        );
    }

    pub fn fail_update(&self, item_id: i64, kind: ItemUpdateKind) {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert((item_id, kind));
    }

    pub fn fail_group_listing(&self) {
        self.state.lock().unwrap().fail_group_listing = true;
    }

    pub fn item(&self, item_id: i64) -> Option<FakeItem> {
        self.state.lock().unwrap().items.get(&item_id).cloned()
    }

    pub fn group_named(&self, name: &str) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
    }

    pub fn has_group(&self, group_id: i64) -> bool {
        self.state.lock().unwrap().groups.contains_key(&group_id)
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<FakeCall> {
        self.calls().into_iter().filter(FakeCall::is_write).collect()
    }

    pub fn deletes(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Delete { group_id } => Some(group_id),
                _ => None,
            })
            .collect()
    }

    /// Page numbers requested by full group listings (empty needle).
    pub fn group_list_pages(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::ListGroups { needle, page } if needle.is_empty() => Some(page),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn groups_named_like(
        &self,
        needle: &str,
        page: u32,
        rows: u32,
    ) -> Result<Vec<Group>, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::ListGroups {
            needle: needle.to_string(),
            page,
        });
        if state.fail_group_listing {
            return Err(fake_error(
                "groups/list",
                StatusCode::BAD_REQUEST,
                r#"{"message": "bad filter"}"#,
            ));
        }

        let needle = needle.to_lowercase();
        let matching: Vec<Group> = state
            .groups
            .iter()
            .filter(|(_, name)| name.to_lowercase().contains(&needle))
            .map(|(id, name)| Group::new(*id, name.clone()))
            .collect();

        Ok(page_of(&matching, page, rows))
    }

    async fn items_in_group(
        &self,
        group_id: i64,
        page: u32,
        rows: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::ListItems { group_id });

        let matching: Vec<CatalogItem> = state
            .items
            .iter()
            .filter(|(_, item)| item.group_id == group_id)
            .map(|(id, _)| CatalogItem(serde_json::json!({ "id": id })))
            .collect();

        Ok(page_of(&matching, page, rows))
    }

    async fn update_item(&self, item_id: i64, update: ItemUpdate) -> Result<(), CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::Update { item_id, update });

        if state.failing_updates.contains(&(item_id, update.into())) {
            return Err(fake_error("items/update", StatusCode::BAD_REQUEST, "rejected"));
        }

        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| fake_error("items/update", StatusCode::NOT_FOUND, "no such item"))?;
        match update {
            ItemUpdate::AssignGroup(group_id) => item.group_id = group_id,
            ItemUpdate::ClearCode => item.code.clear(),
        }
        Ok(())
    }

    async fn create_group(&self, name: &str) -> Result<Group, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::Create {
            name: name.to_string(),
        });
        state.next_id += 1;
        let id = state.next_id;
        state.groups.insert(id, name.to_string());
        Ok(Group::new(id, name))
    }

    async fn delete_group(&self, group_id: i64) -> Result<(), CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FakeCall::Delete { group_id });
        state.groups.remove(&group_id);
        Ok(())
    }
}

/// A call received by [`MockCatalogServer`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub path: String,
    pub authorization: Option<String>,
    pub company_id: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
}

/// Local HTTP server standing in for the catalog service. Responses are scripted per path
/// and served in order; unscripted calls get an empty `200`.
pub struct MockCatalogServer {
    port: u16,
    state: Arc<MockState>,
}

impl MockCatalogServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(record).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockCatalogServer { port, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port)).unwrap()
    }

    pub fn push_response(&self, path: &str, status: u16, body: serde_json::Value) {
        self.push_raw_response(path, status, &body.to_string());
    }

    pub fn push_raw_response(&self, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    state.calls.lock().unwrap().push(RecordedCall {
        path: uri.path().to_string(),
        authorization: header("authorization"),
        company_id: header("x-company-id"),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let scripted = state
        .responses
        .lock()
        .unwrap()
        .get_mut(uri.path())
        .and_then(|queue| queue.pop_front());

    match scripted {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body).into_response(),
        None => StatusCode::OK.into_response(),
    }
}
