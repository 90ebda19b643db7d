use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// TAN the mock sends for every signing process.
pub const SIGN_TAN: &str = "123456";

/// Wrong TANs tolerated before the order is cancelled.
pub const MAX_TAN_ATTEMPTS: u32 = 3;

/// Product code whose signed documents come back bundled as JSON.
pub const BUNDLED_PRODUCT: i64 = 17;

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub username: String,
    pub password: String,
    pub version: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
            password: "secret".to_string(),
            version: "v1".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Created,
    Signing {
        #[serde(skip)]
        tan: String,
        #[serde(skip)]
        wrong_attempts: u32,
    },
    Completed,
    Cancelled,
}

impl OrderState {
    fn is_final(&self) -> bool {
        matches!(self, OrderState::Completed | OrderState::Cancelled)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    #[serde(rename = "orderId")]
    pub id: String,
    pub product: i64,
    #[serde(flatten)]
    pub state: OrderState,
    #[serde(skip)]
    pub history: Vec<&'static str>,
}

impl Order {
    fn transition(&mut self, state: OrderState, label: &'static str) {
        self.state = state;
        self.history.push(label);
    }
}

#[derive(Deserialize)]
pub struct TanInput {
    pub tan: String,
}

pub type Db = Arc<RwLock<HashMap<String, Order>>>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    orders: Db,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let prefix = format!("/{}", config.version.trim_matches('/'));
    let state = AppState {
        config: Arc::new(config),
        orders: Arc::new(RwLock::new(HashMap::new())),
    };
    let api = Router::new()
        .route("/putOrder", put(put_order))
        .route("/getStatus/{id}", get(get_status))
        .route("/getStatus/{id}/ExtendedList", get(get_status_extended))
        .route("/getIdentData/{id}", get(get_ident_data))
        .route("/getIdentData/{id}/{variant}", get(get_ident_data_variant))
        .route("/getESignPDF/{id}", get(get_esign_pdf))
        .route("/cancelOrder/{id}", post(cancel_order))
        .route("/requestSign/{id}", post(request_sign))
        .route("/confirmSign/{id}", post(confirm_sign))
        .route("/requestResendSignTan/{id}", post(request_resend_sign_tan))
        .route("/delIdentData/{id}", delete(del_ident_data))
        .route("/serverStatus", get(server_status))
        .route("/getBankList", get(get_bank_list))
        .with_state(state);
    Router::new().nest(&prefix, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", state.config.username, state.config.password))
    );
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => {
            debug!("rejecting request with missing or wrong credentials");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn put_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Result<Json<Value>, JsonRejection>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let Ok(Json(input)) = input else {
        return bad_request("body must be a JSON document");
    };
    let Some(product) = input.get("product").and_then(Value::as_i64) else {
        return bad_request("product is required");
    };
    let order = Order {
        id: Uuid::new_v4().to_string(),
        product,
        state: OrderState::Created,
        history: vec!["CREATED"],
    };
    info!(order_id = %order.id, product, "order accepted");
    state.orders.write().await.insert(order.id.clone(), order.clone());
    (StatusCode::ACCEPTED, Json(order)).into_response()
}

async fn get_status(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    match state.orders.read().await.get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_status_extended(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    match state.orders.read().await.get(&id) {
        Some(order) => {
            let mut body = serde_json::to_value(order).unwrap_or_default();
            body["history"] = json!(order.history);
            Json(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn ident_data(state: &AppState, id: &str, variant: &str) -> Response {
    match state.orders.read().await.get(id) {
        Some(order) => Json(json!({
            "orderId": order.id,
            "variant": variant,
            "firstName": "Erika",
            "lastName": "Mustermann",
        }))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_ident_data(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    ident_data(&state, &id, "Default").await
}

async fn get_ident_data_variant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, variant)): Path<(String, String)>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    if !matches!(
        variant.as_str(),
        "IncludeInitialData" | "IncludeIdentifyMethod" | "Signed" | "crypt"
    ) {
        return bad_request("unknown variant");
    }
    ident_data(&state, &id, &variant).await
}

async fn get_esign_pdf(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let orders = state.orders.read().await;
    let Some(order) = orders.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if order.product == BUNDLED_PRODUCT {
        return Json(json!({
            "orderId": order.id,
            "documents": ["contract.pdf", "terms.pdf"],
        }))
        .into_response();
    }
    ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.7 mock".to_vec()).into_response()
}

async fn cancel_order(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let mut orders = state.orders.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if order.state.is_final() {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    order.transition(OrderState::Cancelled, "CANCELLED");
    info!(order_id = %id, "order cancelled");
    StatusCode::ACCEPTED.into_response()
}

async fn request_sign(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let mut orders = state.orders.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if order.state.is_final() {
        return StatusCode::GONE.into_response();
    }
    order.transition(
        OrderState::Signing {
            tan: SIGN_TAN.to_string(),
            wrong_attempts: 0,
        },
        "SIGNING",
    );
    StatusCode::ACCEPTED.into_response()
}

async fn confirm_sign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    input: Result<Json<TanInput>, JsonRejection>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let Ok(Json(input)) = input else {
        return bad_request("tan is required");
    };
    let mut orders = state.orders.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let (expected, attempts) = match &order.state {
        OrderState::Signing { tan, wrong_attempts } => (tan.clone(), *wrong_attempts),
        OrderState::Created => return StatusCode::PRECONDITION_FAILED.into_response(),
        OrderState::Completed | OrderState::Cancelled => return StatusCode::GONE.into_response(),
    };
    if input.tan == expected {
        order.transition(OrderState::Completed, "COMPLETED");
        info!(order_id = %id, "order signed");
        return StatusCode::ACCEPTED.into_response();
    }
    let attempts = attempts + 1;
    if attempts >= MAX_TAN_ATTEMPTS {
        order.transition(OrderState::Cancelled, "CANCELLED");
        info!(order_id = %id, "order cancelled after too many wrong TANs");
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    order.state = OrderState::Signing {
        tan: expected,
        wrong_attempts: attempts,
    };
    StatusCode::CONFLICT.into_response()
}

async fn request_resend_sign_tan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let orders = state.orders.read().await;
    match orders.get(&id).map(|order| &order.state) {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(OrderState::Signing { .. }) => StatusCode::ACCEPTED.into_response(),
        Some(OrderState::Created) => StatusCode::PRECONDITION_FAILED.into_response(),
        Some(OrderState::Completed | OrderState::Cancelled) => StatusCode::GONE.into_response(),
    }
}

async fn del_ident_data(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    let mut orders = state.orders.write().await;
    match orders.get(&id).map(|order| order.state.is_final()) {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(false) => StatusCode::NOT_ACCEPTABLE.into_response(),
        Some(true) => {
            orders.remove(&id);
            info!(order_id = %id, "identification data deleted");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

async fn server_status() -> StatusCode {
    StatusCode::OK
}

async fn get_bank_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }
    Json(json!([
        { "bic": "DEUTDEFF", "name": "Deutsche Bank" },
        { "bic": "COBADEFF", "name": "Commerzbank" },
    ]))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(state: OrderState) -> Order {
        Order {
            id: "o1".to_string(),
            product: 12,
            state,
            history: Vec::new(),
        }
    }

    #[test]
    fn order_serializes_with_status_tag() {
        let json = serde_json::to_value(order(OrderState::Created)).unwrap();
        assert_eq!(json["orderId"], "o1");
        assert_eq!(json["status"], "CREATED");
        assert_eq!(json["product"], 12);
        assert!(json.get("history").is_none());
    }

    #[test]
    fn signing_state_hides_tan() {
        let json = serde_json::to_value(order(OrderState::Signing {
            tan: SIGN_TAN.to_string(),
            wrong_attempts: 1,
        }))
        .unwrap();
        assert_eq!(json["status"], "SIGNING");
        assert!(!json.to_string().contains(SIGN_TAN));
    }

    #[test]
    fn final_states() {
        assert!(OrderState::Completed.is_final());
        assert!(OrderState::Cancelled.is_final());
        assert!(!OrderState::Created.is_final());
    }

    #[test]
    fn transition_records_history() {
        let mut o = order(OrderState::Created);
        o.transition(OrderState::Cancelled, "CANCELLED");
        assert_eq!(o.state, OrderState::Cancelled);
        assert_eq!(o.history, vec!["CANCELLED"]);
    }

    #[test]
    fn default_config() {
        let config = MockConfig::default();
        assert_eq!(config.version, "v1");
        assert_eq!(config.username, "user");
    }
}
