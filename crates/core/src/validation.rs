//! Field-level checks shared by the wizard forms and the node panels.
//!
//! Each check returns `None` when the value is acceptable, or the
//! user-facing message to show under the field.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub const ERROR_BLANK_VALUE: &str = "Value cannot be blank.";
pub const ERROR_NAME_BLANK: &str = "Name cannot be blank.";
pub const ERROR_NAME_USED: &str = "Name is already used.";
pub const ERROR_INVALID_RTSP: &str = "Please provide a valid RTSP link.";
pub const ERROR_INVALID_VIDEO_URL: &str = "Please provide a valid link to download video.";
pub const ERROR_FILE_BLANK: &str = "Config File should not be empty.";
pub const ERROR_ACCELERATION_UNSUPPORTED: &str =
    "Acceleration is not supported on this architecture.";

pub const ERROR_RANGE_0_100: &str = "Value 0-100.";
pub const ERROR_RANGE_1_100: &str = "Value cannot be blank. Value 1-100.";
pub const ERROR_CONFIDENCE_ORDER: &str =
    "Confidence lower bound needs to be smaller than upper bound";
pub const ERROR_THRESHOLD_RANGE: &str = "Please enter a whole number from 0 to 100.";
pub const ERROR_PORT_RANGE: &str = "Please enter a whole number from 1 to 65535.";
pub const ERROR_INVALID_FORMAT: &str = "Please enter a valid format.";
pub const ERROR_AT_LEAST_ONE: &str = "Value must be equal to or greater than 1.";
pub const ERROR_GREATER_THAN_ZERO: &str = "Value must be greater than 0.";

/// Dropdown value meaning "nothing chosen yet".
pub const UNSET_OPTION: &str = "-";

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static RTSP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rtsp://.+").expect("valid regex"));

static DOWNLOAD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://).+").expect("valid regex"));

static ROUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[a-zA-Z0-9]+").expect("valid regex"));

pub fn is_rtsp_url(value: &str) -> bool {
    RTSP_RE.is_match(value)
}

pub fn is_download_url(value: &str) -> bool {
    DOWNLOAD_URL_RE.is_match(value)
}

pub fn is_route_path(value: &str) -> bool {
    ROUTE_RE.is_match(value)
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

pub fn check_required(value: &str) -> Option<&'static str> {
    value.is_empty().then_some(ERROR_BLANK_VALUE)
}

/// Entity names must be present and not collide with another entity of
/// the same kind. Comparison is exact.
pub fn check_name(name: &str, existing: &[String]) -> Option<&'static str> {
    if name.is_empty() {
        return Some(ERROR_NAME_BLANK);
    }
    if existing.iter().any(|n| n == name) {
        return Some(ERROR_NAME_USED);
    }
    None
}

/// Blank is reported as blank; anything else must look like `rtsp://...`.
pub fn check_rtsp(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some(ERROR_BLANK_VALUE);
    }
    (!is_rtsp_url(value)).then_some(ERROR_INVALID_RTSP)
}

pub fn check_download_url(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some(ERROR_BLANK_VALUE);
    }
    (!is_download_url(value)).then_some(ERROR_INVALID_VIDEO_URL)
}

pub fn check_option(value: &str) -> Option<&'static str> {
    (value.is_empty() || value == UNSET_OPTION).then_some(ERROR_BLANK_VALUE)
}
