//! Operation dispatcher for the identity service.
//!
//! # Design
//! `IdentityClient` holds a transport and an optional per-request timeout and
//! nothing else, so calls are independent and the client can be shared
//! across threads whenever its transport can. Every operation runs the same
//! pipeline: validate input, resolve the path variant, send, then check the
//! status against the operation's outcome table. Order lifecycle rules
//! (sign before confirm, TAN attempt limits) are enforced by the service and
//! only surface here as statuses.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::catalog;
use crate::error::ClientError;
use crate::http::{HttpResponse, Params};
use crate::operation::{Operation, DEFAULT_VARIANT};
use crate::transport::Transport;
use crate::types::{Artifact, SignmeUserCheck};

#[derive(Debug, Clone)]
pub struct IdentityClient<T> {
    transport: T,
    timeout: Option<Duration>,
}

impl<T: Transport> IdentityClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: None,
        }
    }

    /// Apply `timeout` to every request sent by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a new identification order. Returns the service's order
    /// document.
    pub fn put_order(&self, order: &Params) -> Result<Value, ClientError> {
        let response = self.call(&catalog::PUT_ORDER, None, None, order.clone())?;
        decode_json(&response)
    }

    /// Poll one order's status. Variants: `Default`, `ExtendedList`.
    pub fn get_status(&self, order_id: &str, variant: Option<&str>) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_STATUS, Some(order_id), variant, Params::new())?;
        decode_json(&response)
    }

    /// Variants: `Default`, `IncludeInitialData`, `IncludeIdentifyMethod`,
    /// `Signed`, `crypt`.
    pub fn get_ident_data(&self, order_id: &str, variant: Option<&str>) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_IDENT_DATA, Some(order_id), variant, Params::new())?;
        decode_json(&response)
    }

    pub fn get_ident_data_pdf(&self, order_id: &str, variant: Option<&str>) -> Result<Vec<u8>, ClientError> {
        let response = self.call(&catalog::GET_IDENT_DATA_PDF, Some(order_id), variant, Params::new())?;
        Ok(response.body)
    }

    /// A single signed document comes back as PDF bytes; several come back
    /// as one JSON document. `Content-Type` decides which.
    pub fn get_esign_pdf(&self, order_id: &str, variant: Option<&str>) -> Result<Artifact, ClientError> {
        let response = self.call(&catalog::GET_ESIGN_PDF, Some(order_id), variant, Params::new())?;
        if response.is_json() {
            return decode_json(&response).map(Artifact::Json);
        }
        Ok(Artifact::Bytes(response.body))
    }

    pub fn get_esign_hash(&self, order_id: &str) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_ESIGN_HASH, Some(order_id), None, Params::new())?;
        decode_json(&response)
    }

    pub fn get_esign_audit_log_pdf(&self, order_id: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.call(&catalog::GET_ESIGN_AUDIT_LOG_PDF, Some(order_id), None, Params::new())?;
        Ok(response.body)
    }

    /// Ask the service to push the video to `callback_url` once it is ready.
    pub fn get_video_file_binary_async(&self, order_id: &str, callback_url: &str) -> Result<bool, ClientError> {
        let params = object(json!({ "callbackUrl": callback_url }));
        self.accepted(&catalog::GET_VIDEO_FILE_BINARY_ASYNC, Some(order_id), params)
    }

    pub fn get_video_file_binary(&self, order_id: &str, variant: Option<&str>) -> Result<Vec<u8>, ClientError> {
        let response = self.call(&catalog::GET_VIDEO_FILE_BINARY, Some(order_id), variant, Params::new())?;
        Ok(response.body)
    }

    pub fn get_voice_files(&self, order_id: &str, variant: Option<&str>) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_VOICE_FILES, Some(order_id), variant, Params::new())?;
        decode_json(&response)
    }

    pub fn del_ident_data(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::DEL_IDENT_DATA, Some(order_id), Params::new())
    }

    /// Fetch status changes since the last call. A 304 ("no new status
    /// information") surfaces as `ClientError::Request` with status 304.
    pub fn get_all_status(
        &self,
        order_id: &str,
        filters: &Params,
        variant: Option<&str>,
    ) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_ALL_STATUS, Some(order_id), variant, filters.clone())?;
        decode_json(&response)
    }

    pub fn cancel_order(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::CANCEL_ORDER, Some(order_id), Params::new())
    }

    /// Start the signing process; the service sends a TAN to the customer.
    pub fn request_sign(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::REQUEST_SIGN, Some(order_id), Params::new())
    }

    /// Confirm signing with the six-character TAN.
    pub fn confirm_sign(&self, order_id: &str, tan: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::CONFIRM_SIGN, Some(order_id), object(json!({ "tan": tan })))
    }

    pub fn request_resend_sign_tan(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::REQUEST_RESEND_SIGN_TAN, Some(order_id), Params::new())
    }

    pub fn request_phone_verification(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::REQUEST_PHONE_VERIFICATION, Some(order_id), Params::new())
    }

    /// Prove control of the phone with the five-character TAN.
    pub fn prove_phone_control(&self, order_id: &str, tan: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::PROVE_PHONE_CONTROL, Some(order_id), object(json!({ "tan": tan })))
    }

    pub fn request_resend_phone_tan(&self, order_id: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::REQUEST_RESEND_PHONE_TAN, Some(order_id), Params::new())
    }

    /// Whether the service is reachable and up. A 500 is reported as
    /// `ClientError::Request`, not `false`.
    pub fn server_status(&self) -> Result<bool, ClientError> {
        self.accepted(&catalog::SERVER_STATUS, None, Params::new())
    }

    pub fn system_status(&self) -> Result<Value, ClientError> {
        let response = self.call(&catalog::SYSTEM_STATUS, None, None, Params::new())?;
        decode_json(&response)
    }

    pub fn get_bank_list(&self) -> Result<Value, ClientError> {
        let response = self.call(&catalog::GET_BANK_LIST, None, None, Params::new())?;
        decode_json(&response)
    }

    pub fn check_signme_user(&self, check: &SignmeUserCheck) -> Result<Value, ClientError> {
        let params = match serde_json::to_value(check) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ClientError::Serialization(format!("expected an object, got {other}")));
            }
            Err(e) => return Err(ClientError::Serialization(e.to_string())),
        };
        let response = self.call(&catalog::CHECK_SIGNME_USER, None, None, params)?;
        decode_json(&response)
    }

    /// Start a password reset; a TAN is sent to `mobile`.
    pub fn request_new_password(&self, mobile: &str) -> Result<bool, ClientError> {
        self.accepted(&catalog::REQUEST_NEW_PASSWORD, None, object(json!({ "mobile": mobile })))
    }

    /// Finish a password reset. The body carries the new password.
    pub fn confirm_new_password(&self, tan: &str) -> Result<Value, ClientError> {
        let params = object(json!({ "tan": tan }));
        let response = self.call(&catalog::CONFIRM_NEW_PASSWORD, None, None, params)?;
        decode_json(&response)
    }

    /// `Ok(true)` on the success status. Every other status is already an
    /// error, so `false` is never returned.
    fn accepted(
        &self,
        operation: &'static Operation,
        order_id: Option<&str>,
        params: Params,
    ) -> Result<bool, ClientError> {
        self.call(operation, order_id, None, params)?;
        Ok(true)
    }

    fn call(
        &self,
        operation: &'static Operation,
        order_id: Option<&str>,
        variant: Option<&str>,
        params: Params,
    ) -> Result<HttpResponse, ClientError> {
        let request = operation.build(order_id, variant.unwrap_or(DEFAULT_VARIANT), params, self.timeout)?;
        debug!(
            operation = operation.name,
            method = request.method.as_str(),
            path = %request.path,
            "dispatching"
        );
        let response = self.transport.request(&request)?;
        debug!(operation = operation.name, status = response.status, "response received");
        operation.check_status(&response)?;
        Ok(response)
    }
}

fn decode_json(response: &HttpResponse) -> Result<Value, ClientError> {
    response
        .json()
        .map_err(|e| ClientError::Deserialization(e.to_string()))
}

fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest};

    /// Replays one canned answer and records every request.
    struct Stub {
        answer: Result<HttpResponse, TransportError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Stub {
        fn status(status: u16) -> Self {
            Self::with(status, &[], b"")
        }

        fn with(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Self {
            Self {
                answer: Ok(HttpResponse {
                    status,
                    headers: headers
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    body: body.to_vec(),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: TransportError) -> Self {
            Self {
                answer: Err(error),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Stub {
        fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answer.clone()
        }
    }

    fn request_error(err: ClientError) -> (u16, String) {
        match err {
            ClientError::Request { status, message } => (status, message),
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[test]
    fn confirm_sign_accepted() {
        let stub = Stub::status(202);
        let client = IdentityClient::new(&stub);
        assert!(client.confirm_sign("order-1", "123456").unwrap());

        let req = stub.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "confirmSign/order-1");
        assert_eq!(req.params["tan"], "123456");
    }

    #[test]
    fn confirm_sign_wrong_tan() {
        let stub = Stub::status(409);
        let err = IdentityClient::new(&stub).confirm_sign("order-1", "123456").unwrap_err();
        assert_eq!(request_error(err), (409, "Wrong TAN given".to_string()));
    }

    #[test]
    fn confirm_sign_lifecycle_statuses_pass_through() {
        for (status, message) in [
            (410, "Order has already been processed"),
            (412, "Signing process has not been started, call requestSign first"),
            (429, "Too many tries with a wrong TAN, order cancelled"),
        ] {
            let stub = Stub::status(status);
            let err = IdentityClient::new(&stub).confirm_sign("order-1", "123456").unwrap_err();
            assert_eq!(request_error(err), (status, message.to_string()));
        }
    }

    #[test]
    fn confirm_sign_short_tan_never_reaches_transport() {
        let stub = Stub::status(202);
        let err = IdentityClient::new(&stub).confirm_sign("order-1", "12345").unwrap_err();
        match err {
            ClientError::Validation(v) => {
                assert_eq!(v.messages("tan"), &["The tan must be at least 6 characters.".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn unknown_variant_never_reaches_transport() {
        let stub = Stub::status(200);
        let err = IdentityClient::new(&stub)
            .get_ident_data("order-1", Some("Bogus"))
            .unwrap_err();
        match err {
            ClientError::UnknownVariant { variant, operation } => {
                assert_eq!(variant, "Bogus");
                assert_eq!(operation, "getIdentData");
            }
            other => panic!("expected unknown variant, got {other:?}"),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn unusable_order_ids_never_reach_transport() {
        let stub = Stub::status(202);
        let client = IdentityClient::new(&stub);
        for id in ["", "..", "../../admin", "a?x=1#", "a#b", "a/b"] {
            assert!(
                matches!(client.cancel_order(id), Err(ClientError::InvalidOrderId(ref got)) if got == id),
                "{id:?} accepted"
            );
        }
        assert!(matches!(
            client.get_status("", Some("ExtendedList")),
            Err(ClientError::InvalidOrderId(_))
        ));
        assert!(matches!(
            client.confirm_sign("../admin", "123456"),
            Err(ClientError::InvalidOrderId(_))
        ));
        assert_eq!(stub.calls(), 0);

        assert!(client.cancel_order("2f1c-9a").unwrap());
        assert_eq!(stub.last().path, "cancelOrder/2f1c-9a");
    }

    #[test]
    fn every_variant_operation_rejects_undeclared_variants() {
        let stub = Stub::status(200);
        let client = IdentityClient::new(&stub);
        let filters = Params::new();
        let results = [
            client.get_status("o", Some("crypt")).map(|_| ()),
            client.get_ident_data("o", Some("ExtendedList")).map(|_| ()),
            client.get_ident_data_pdf("o", Some("Signed")).map(|_| ()),
            client.get_esign_pdf("o", Some("Signed")).map(|_| ()),
            client.get_video_file_binary("o", Some("Signed")).map(|_| ()),
            client.get_voice_files("o", Some("Signed")).map(|_| ()),
            client.get_all_status("o", &filters, Some("crypt")).map(|_| ()),
        ];
        for result in results {
            assert!(matches!(result, Err(ClientError::UnknownVariant { .. })));
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn variant_selects_path_suffix() {
        let stub = Stub::with(200, &[], br#"{"status":"SUCCESS"}"#);
        let client = IdentityClient::new(&stub);
        client.get_status("order-1", Some("ExtendedList")).unwrap();
        assert_eq!(stub.last().path, "getStatus/order-1/ExtendedList");
        client.get_ident_data("order-1", None).unwrap();
        assert_eq!(stub.last().path, "getIdentData/order-1");
        assert_eq!(stub.last().method, HttpMethod::Get);
    }

    #[test]
    fn esign_pdf_json_branch() {
        let stub = Stub::with(200, &[("Content-Type", "application/json")], br#"{"a":1}"#);
        let artifact = IdentityClient::new(&stub).get_esign_pdf("order-1", None).unwrap();
        assert_eq!(artifact, Artifact::Json(json!({"a": 1})));
    }

    #[test]
    fn esign_pdf_bytes_branch() {
        let stub = Stub::with(200, &[("Content-Type", "application/pdf")], b"%PDF-1.7");
        let artifact = IdentityClient::new(&stub).get_esign_pdf("order-1", Some("crypt")).unwrap();
        assert_eq!(artifact, Artifact::Bytes(b"%PDF-1.7".to_vec()));
        assert_eq!(stub.last().path, "getESignPDF/order-1/crypt");
    }

    #[test]
    fn undocumented_status_uses_generic_message() {
        let stub = Stub::status(503);
        let err = IdentityClient::new(&stub).get_bank_list().unwrap_err();
        assert_eq!(request_error(err), (503, "Request failed".to_string()));
    }

    #[test]
    fn documented_non_success_uses_table_message() {
        let stub = Stub::status(304);
        let err = IdentityClient::new(&stub)
            .get_all_status("order-1", &Params::new(), None)
            .unwrap_err();
        assert_eq!(
            request_error(err),
            (304, "No new status information available since last call".to_string())
        );
    }

    #[test]
    fn server_status_down_is_an_error() {
        let stub = Stub::status(500);
        let err = IdentityClient::new(&stub).server_status().unwrap_err();
        assert_eq!(request_error(err), (500, "Service not available".to_string()));
        assert!(IdentityClient::new(&Stub::status(200)).server_status().unwrap());
    }

    #[test]
    fn transport_failure_is_distinct() {
        let stub = Stub::failing(TransportError::Timeout);
        let err = IdentityClient::new(&stub).get_esign_hash("order-1").unwrap_err();
        assert!(matches!(err, ClientError::Transport(TransportError::Timeout)));
    }

    #[test]
    fn malformed_json_on_success_is_deserialization_error() {
        let stub = Stub::with(200, &[], b"not json");
        let err = IdentityClient::new(&stub).system_status().unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(_)));
    }

    #[test]
    fn binary_artifacts_return_raw_body() {
        let stub = Stub::with(200, &[("content-type", "video/mp4")], b"\x00\x00\x00\x18ftyp");
        let client = IdentityClient::new(&stub);
        assert_eq!(client.get_video_file_binary("o", None).unwrap(), b"\x00\x00\x00\x18ftyp");
        assert_eq!(client.get_ident_data_pdf("o", Some("crypt")).unwrap(), b"\x00\x00\x00\x18ftyp");
        assert_eq!(client.get_esign_audit_log_pdf("o").unwrap(), b"\x00\x00\x00\x18ftyp");
        assert_eq!(stub.last().path, "getESignAuditLogPDF/o");
    }

    #[test]
    fn delete_uses_delete_method() {
        let stub = Stub::status(202);
        assert!(IdentityClient::new(&stub).del_ident_data("o").unwrap());
        assert_eq!(stub.last().method, HttpMethod::Delete);
        let err = IdentityClient::new(&Stub::status(406)).del_ident_data("o").unwrap_err();
        assert_eq!(request_error(err), (406, "Invalid order state".to_string()));
    }

    #[test]
    fn put_order_validates_all_fields() {
        let stub = Stub::status(202);
        let order = object(json!({"product": 13, "mobile": "01701234567", "signatureType": "XYZ"}));
        let err = IdentityClient::new(&stub).put_order(&order).unwrap_err();
        match err {
            ClientError::Validation(v) => {
                assert_eq!(v.fields().collect::<Vec<_>>(), vec!["mobile", "product", "signatureType"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn put_order_returns_order_document() {
        let stub = Stub::with(202, &[("content-type", "application/json")], br#"{"orderId":"abc"}"#);
        let order = object(json!({"product": 12, "add": 4096, "email": "jane@example.com"}));
        let document = IdentityClient::new(&stub).put_order(&order).unwrap();
        assert_eq!(document["orderId"], "abc");
        assert_eq!(stub.last().method, HttpMethod::Put);
        assert_eq!(stub.last().path, "putOrder");
    }

    #[test]
    fn video_async_requires_callback_url() {
        let stub = Stub::status(200);
        let client = IdentityClient::new(&stub);
        assert!(matches!(
            client.get_video_file_binary_async("o", "not-a-url"),
            Err(ClientError::Validation(_))
        ));
        assert!(client.get_video_file_binary_async("o", "https://example.com/hook").unwrap());
        assert_eq!(stub.last().params["callbackUrl"], "https://example.com/hook");
    }

    #[test]
    fn phone_flow_uses_five_character_tan() {
        let stub = Stub::status(202);
        let client = IdentityClient::new(&stub);
        assert!(client.request_phone_verification("o").unwrap());
        assert!(client.prove_phone_control("o", "12345").unwrap());
        assert!(matches!(
            client.prove_phone_control("o", "123456"),
            Err(ClientError::Validation(_))
        ));
        assert!(client.request_resend_phone_tan("o").unwrap());
        assert_eq!(stub.calls(), 3);
    }

    #[test]
    fn password_reset_flow() {
        let stub = Stub::status(200);
        let client = IdentityClient::new(&stub);
        assert!(client.request_new_password("+491701234567").unwrap());
        assert!(matches!(
            client.request_new_password("01701234567"),
            Err(ClientError::Validation(_))
        ));

        let stub = Stub::with(200, &[], br#"{"password":"n3w"}"#);
        assert_eq!(IdentityClient::new(&stub).confirm_new_password("654321").unwrap()["password"], "n3w");
    }

    #[test]
    fn signme_check_rejects_bad_signature_type() {
        let stub = Stub::with(200, &[], br#"{"exists":true}"#);
        let client = IdentityClient::new(&stub);
        let mut check = SignmeUserCheck {
            email: "jane@example.com".to_string(),
            signature_type: Some("XYZ".to_string()),
        };
        assert!(matches!(client.check_signme_user(&check), Err(ClientError::Validation(_))));
        check.signature_type = Some("ADV".to_string());
        assert_eq!(client.check_signme_user(&check).unwrap()["exists"], true);
        assert_eq!(stub.last().params["Email"], "jane@example.com");
    }

    #[test]
    fn timeout_is_threaded_into_requests() {
        let stub = Stub::status(202);
        let client = IdentityClient::new(&stub).with_timeout(Duration::from_millis(1500));
        client.cancel_order("o").unwrap();
        assert_eq!(stub.last().timeout, Some(Duration::from_millis(1500)));
        assert_eq!(client.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn sign_lifecycle_calls() {
        let stub = Stub::status(202);
        let client = IdentityClient::new(&stub);
        assert!(client.request_sign("o").unwrap());
        assert!(client.request_resend_sign_tan("o").unwrap());
        assert_eq!(stub.last().path, "requestResendSignTan/o");
        let err = IdentityClient::new(&Stub::status(406)).cancel_order("o").unwrap_err();
        assert_eq!(request_error(err), (406, "Order not in a cancellable state".to_string()));
    }
}
