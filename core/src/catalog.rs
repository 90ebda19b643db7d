//! Every operation the identity service offers, with its documented outcome
//! table. Status messages are part of the public contract; keep them
//! verbatim.

use crate::http::HttpMethod;
use crate::operation::Operation;
use crate::validation::{Rule, Ruleset};

const BAD_DESC: &str = "Bad request, error description in body";
const BAD_INFO: &str = "Bad request, error information in body";
const AUTH: &str = "Authentication failed, please check username and password";
const AUTH_SHORT: &str = "Authentication failed";
const NOT_FOUND: &str = "Order not found";
const NOT_FOUND_OR_DELETED: &str = "Order not found or already deleted";
const INVALID_STATE: &str = "Invalid order state";
const ALREADY_PROCESSED: &str = "Order has already been processed";
const ACCEPTED: &str = "Accepted";
const JSON_OK: &str = "OK, JSON document in body";
const SIGN_NOT_STARTED: &str = "Signing process has not been started, call requestSign first";
const PHONE_NOT_STARTED: &str = "Process has not been started, call requestPhoneVerification first";
const TOO_MANY_TANS: &str = "Too many tries with a wrong TAN, order cancelled";

const CRYPT_VARIANTS: &[(&str, &str)] = &[("Default", ""), ("crypt", "crypt")];
const LIST_VARIANTS: &[(&str, &str)] = &[("Default", ""), ("ExtendedList", "ExtendedList")];

const SIX_DIGIT_TAN: Ruleset = &[("tan", &[Rule::Required, Rule::String, Rule::Min(6), Rule::Max(6)])];
const FIVE_DIGIT_TAN: Ruleset = &[("tan", &[Rule::Required, Rule::String, Rule::Min(5), Rule::Max(5)])];

/// Fields checked on a new order. Other order fields pass through to the
/// service unchecked.
pub const ORDER_RULES: Ruleset = &[
    ("product", &[Rule::Required, Rule::Product]),
    ("add", &[Rule::Add]),
    ("email", &[Rule::Email]),
    ("mobile", &[Rule::Phone, Rule::Max(64)]),
    ("callbackUrl", &[Rule::Url]),
    ("signatureType", &[Rule::Signature]),
];

/// Optional filters accepted when polling all status changes.
pub const ALL_STATUS_RULES: Ruleset = &[("product", &[Rule::Product]), ("add", &[Rule::Add])];

pub static PUT_ORDER: Operation = Operation {
    name: "putOrder",
    method: HttpMethod::Put,
    path: "putOrder",
    variants: &[],
    rules: ORDER_RULES,
    success: 202,
    outcomes: &[
        (202, "Order accepted, JSON document in body"),
        (400, BAD_DESC),
        (401, AUTH),
    ],
};

pub static GET_STATUS: Operation = Operation {
    name: "getStatus",
    method: HttpMethod::Get,
    path: "getStatus",
    variants: LIST_VARIANTS,
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static GET_IDENT_DATA: Operation = Operation {
    name: "getIdentData",
    method: HttpMethod::Get,
    path: "getIdentData",
    variants: &[
        ("Default", ""),
        ("IncludeInitialData", "IncludeInitialData"),
        ("IncludeIdentifyMethod", "IncludeIdentifyMethod"),
        ("Signed", "Signed"),
        ("crypt", "crypt"),
    ],
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static GET_IDENT_DATA_PDF: Operation = Operation {
    name: "getIdentDataPDF",
    method: HttpMethod::Get,
    path: "getIdentDataPDF",
    variants: CRYPT_VARIANTS,
    rules: &[],
    success: 200,
    outcomes: &[(200, "OK, PDF in body"), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static GET_ESIGN_PDF: Operation = Operation {
    name: "getESignPDF",
    method: HttpMethod::Get,
    path: "getESignPDF",
    variants: CRYPT_VARIANTS,
    rules: &[],
    success: 200,
    outcomes: &[
        (200, "OK, PDF stream in body if only one document, otherwise a JSON document"),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND),
    ],
};

pub static GET_ESIGN_HASH: Operation = Operation {
    name: "getESignHash",
    method: HttpMethod::Get,
    path: "getESignHash",
    variants: &[],
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static GET_ESIGN_AUDIT_LOG_PDF: Operation = Operation {
    name: "getESignAuditLogPDF",
    method: HttpMethod::Get,
    path: "getESignAuditLogPDF",
    variants: &[],
    rules: &[],
    success: 200,
    outcomes: &[
        (200, "OK, PDF document in body"),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND),
    ],
};

pub static GET_VIDEO_FILE_BINARY_ASYNC: Operation = Operation {
    name: "getVideoFileBinaryAsync",
    method: HttpMethod::Post,
    path: "getVideoFileBinaryAsync",
    variants: &[],
    rules: &[("callbackUrl", &[Rule::Required, Rule::Url])],
    success: 200,
    outcomes: &[(200, "OK"), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static GET_VIDEO_FILE_BINARY: Operation = Operation {
    name: "getVideoFileBinary",
    method: HttpMethod::Get,
    path: "getVideoFileBinary",
    variants: CRYPT_VARIANTS,
    rules: &[],
    success: 200,
    outcomes: &[
        (200, "OK, binary video file (video/mp4 or video/webm) in body"),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND),
    ],
};

pub static GET_VOICE_FILES: Operation = Operation {
    name: "getVoiceFiles",
    method: HttpMethod::Get,
    path: "getVoiceFiles",
    variants: CRYPT_VARIANTS,
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH), (404, NOT_FOUND)],
};

pub static DEL_IDENT_DATA: Operation = Operation {
    name: "delIdentData",
    method: HttpMethod::Delete,
    path: "delIdentData",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, "Accepted, data deleted"),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (406, INVALID_STATE),
    ],
};

pub static GET_ALL_STATUS: Operation = Operation {
    name: "getAllStatus",
    method: HttpMethod::Post,
    path: "getAllStatus",
    variants: LIST_VARIANTS,
    rules: ALL_STATUS_RULES,
    success: 200,
    outcomes: &[
        (200, "OK, JSON data in body"),
        (304, "No new status information available since last call"),
        (400, BAD_INFO),
        (401, AUTH_SHORT),
    ],
};

pub static CANCEL_ORDER: Operation = Operation {
    name: "cancelOrder",
    method: HttpMethod::Post,
    path: "cancelOrder",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_INFO),
        (401, AUTH_SHORT),
        (404, NOT_FOUND),
        (406, "Order not in a cancellable state"),
    ],
};

pub static REQUEST_SIGN: Operation = Operation {
    name: "requestSign",
    method: HttpMethod::Post,
    path: "requestSign",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_INFO),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (406, INVALID_STATE),
        (410, ALREADY_PROCESSED),
    ],
};

pub static CONFIRM_SIGN: Operation = Operation {
    name: "confirmSign",
    method: HttpMethod::Post,
    path: "confirmSign",
    variants: &[],
    rules: SIX_DIGIT_TAN,
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (409, "Wrong TAN given"),
        (410, ALREADY_PROCESSED),
        (412, SIGN_NOT_STARTED),
        (429, TOO_MANY_TANS),
    ],
};

pub static REQUEST_RESEND_SIGN_TAN: Operation = Operation {
    name: "requestResendSignTan",
    method: HttpMethod::Post,
    path: "requestResendSignTan",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (410, ALREADY_PROCESSED),
        (412, SIGN_NOT_STARTED),
    ],
};

pub static REQUEST_PHONE_VERIFICATION: Operation = Operation {
    name: "requestPhoneVerification",
    method: HttpMethod::Post,
    path: "requestPhoneVerification",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (406, INVALID_STATE),
        (410, ALREADY_PROCESSED),
    ],
};

pub static PROVE_PHONE_CONTROL: Operation = Operation {
    name: "provePhoneControl",
    method: HttpMethod::Post,
    path: "provePhoneControl",
    variants: &[],
    rules: FIVE_DIGIT_TAN,
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (410, ALREADY_PROCESSED),
        (412, PHONE_NOT_STARTED),
        (429, TOO_MANY_TANS),
    ],
};

pub static REQUEST_RESEND_PHONE_TAN: Operation = Operation {
    name: "requestResendPhoneTan",
    method: HttpMethod::Post,
    path: "requestResendPhoneTan",
    variants: &[],
    rules: &[],
    success: 202,
    outcomes: &[
        (202, ACCEPTED),
        (400, BAD_DESC),
        (401, AUTH),
        (404, NOT_FOUND_OR_DELETED),
        (410, ALREADY_PROCESSED),
        (412, PHONE_NOT_STARTED),
    ],
};

pub static SERVER_STATUS: Operation = Operation {
    name: "serverStatus",
    method: HttpMethod::Get,
    path: "serverStatus",
    variants: &[],
    rules: &[],
    success: 200,
    outcomes: &[(200, "Service available"), (500, "Service not available")],
};

pub static SYSTEM_STATUS: Operation = Operation {
    name: "systemStatus",
    method: HttpMethod::Get,
    path: "systemStatus",
    variants: &[],
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (401, AUTH), (500, "Service not available at all")],
};

pub static GET_BANK_LIST: Operation = Operation {
    name: "getBankList",
    method: HttpMethod::Get,
    path: "getBankList",
    variants: &[],
    rules: &[],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH)],
};

pub static CHECK_SIGNME_USER: Operation = Operation {
    name: "checkSignmeUser",
    method: HttpMethod::Post,
    path: "checkSignmeUser",
    variants: &[],
    rules: &[
        ("Email", &[Rule::Required, Rule::Email]),
        ("signatureType", &[Rule::Signature]),
    ],
    success: 200,
    outcomes: &[(200, JSON_OK), (400, BAD_DESC), (401, AUTH)],
};

pub static REQUEST_NEW_PASSWORD: Operation = Operation {
    name: "requestNewPassword",
    method: HttpMethod::Post,
    path: "requestNewPassword",
    variants: &[],
    rules: &[("mobile", &[Rule::Required, Rule::Phone, Rule::Max(64)])],
    success: 200,
    outcomes: &[
        (200, "OK, TAN is sent to the mobile number"),
        (400, BAD_DESC),
        (401, AUTH),
    ],
};

pub static CONFIRM_NEW_PASSWORD: Operation = Operation {
    name: "confirmNewPassword",
    method: HttpMethod::Post,
    path: "confirmNewPassword",
    variants: &[],
    rules: SIX_DIGIT_TAN,
    success: 200,
    outcomes: &[
        (200, "OK, password has been changed, new password in body"),
        (400, BAD_DESC),
        (401, "Authentication failed, please check username, password and TAN"),
    ],
};

pub static ALL: &[&Operation] = &[
    &PUT_ORDER,
    &GET_STATUS,
    &GET_IDENT_DATA,
    &GET_IDENT_DATA_PDF,
    &GET_ESIGN_PDF,
    &GET_ESIGN_HASH,
    &GET_ESIGN_AUDIT_LOG_PDF,
    &GET_VIDEO_FILE_BINARY_ASYNC,
    &GET_VIDEO_FILE_BINARY,
    &GET_VOICE_FILES,
    &DEL_IDENT_DATA,
    &GET_ALL_STATUS,
    &CANCEL_ORDER,
    &REQUEST_SIGN,
    &CONFIRM_SIGN,
    &REQUEST_RESEND_SIGN_TAN,
    &REQUEST_PHONE_VERIFICATION,
    &PROVE_PHONE_CONTROL,
    &REQUEST_RESEND_PHONE_TAN,
    &SERVER_STATUS,
    &SYSTEM_STATUS,
    &GET_BANK_LIST,
    &CHECK_SIGNME_USER,
    &REQUEST_NEW_PASSWORD,
    &CONFIRM_NEW_PASSWORD,
];

/// Look up an operation by its service name, e.g. `"confirmSign"`.
pub fn find(name: &str) -> Option<&'static Operation> {
    ALL.iter().copied().find(|op| op.name == name)
}
