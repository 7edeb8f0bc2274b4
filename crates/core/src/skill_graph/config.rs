//! Per-type node configurations, their defaults and panel validation.

use serde::{Deserialize, Serialize};

use crate::skill_graph::model::{ExportType, NodeType, SkillModel, TransformType};
use crate::types::EntityId;
use crate::validation::{
    is_route_path, ERROR_AT_LEAST_ONE, ERROR_BLANK_VALUE, ERROR_CONFIDENCE_ORDER,
    ERROR_GREATER_THAN_ZERO, ERROR_INVALID_FORMAT, ERROR_PORT_RANGE, ERROR_RANGE_0_100,
    ERROR_RANGE_1_100, ERROR_THRESHOLD_RANGE,
};

/// A failed configuration check on one node field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Default)]
struct Issues(Vec<ConfigIssue>);

impl Issues {
    fn check(&mut self, field: &'static str, failed: bool, message: &'static str) -> &mut Self {
        if failed {
            self.0.push(ConfigIssue { field, message });
        }
        self
    }

    fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(field, value.is_empty(), ERROR_BLANK_VALUE)
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Configuration of a node, one variant per node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "configurations", rename_all = "snake_case")]
pub enum NodeKind {
    Source(SourceConfig),
    Model(ModelConfig),
    Transform(TransformConfig),
    Export(ExportConfig),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Source(_) => NodeType::Source,
            Self::Model(_) => NodeType::Model,
            Self::Transform(_) => NodeType::Transform,
            Self::Export(_) => NodeType::Export,
        }
    }

    /// Default configuration for a node placed from `model`. `None` when
    /// the catalog entry is a source or an unknown transform/export.
    pub fn default_for(model: &SkillModel) -> Option<Self> {
        match model.node_type {
            NodeType::Source => None,
            NodeType::Model => Some(Self::Model(ModelConfig::default())),
            NodeType::Transform => TransformType::from_model_name(&model.name)
                .map(|t| Self::Transform(TransformConfig::new(t))),
            NodeType::Export => ExportType::from_model_name(&model.name)
                .map(|t| Self::Export(ExportConfig::new(t))),
        }
    }

    /// Panel checks. An empty result means the node is fully configured.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        match self {
            Self::Source(_) => Vec::new(),
            Self::Model(c) => c.issues(),
            Self::Transform(TransformConfig::Filter(c)) => c.issues(),
            Self::Transform(TransformConfig::Grpc(c)) => c.issues(),
            Self::Export(c) => c.issues(),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// The source node reads its settings from deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub ip: String,
    pub fps: String,
    pub device_name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            ip: "$param(rtsp)".into(),
            fps: "$param(fps)".into(),
            device_name: "$param(device_id)".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureData {
    #[default]
    #[serde(rename = "-")]
    Unset,
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: Option<ModelRef>,
    pub capture_data: CaptureData,
    pub confidence_lower: i64,
    pub confidence_upper: i64,
    pub max_images: i64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: None,
            capture_data: CaptureData::Unset,
            confidence_lower: 0,
            confidence_upper: 0,
            max_images: 0,
        }
    }
}

impl ModelConfig {
    /// Capture bounds are only checked when captured images are kept.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Issues::default();
        issues
            .check("model", self.model.is_none(), ERROR_BLANK_VALUE)
            .check(
                "capture_data",
                self.capture_data == CaptureData::Unset,
                ERROR_BLANK_VALUE,
            );
        if self.capture_data == CaptureData::Yes {
            let in_range = |v: i64| (0..=100).contains(&v);
            issues
                .check("confidence_lower", !in_range(self.confidence_lower), ERROR_RANGE_0_100)
                .check(
                    "confidence_lower",
                    self.confidence_lower > self.confidence_upper,
                    ERROR_CONFIDENCE_ORDER,
                )
                .check("confidence_upper", !in_range(self.confidence_upper), ERROR_RANGE_0_100)
                .check(
                    "max_images",
                    !(1..=100).contains(&self.max_images),
                    ERROR_RANGE_1_100,
                );
        }
        issues.0
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transform_type", rename_all = "snake_case")]
pub enum TransformConfig {
    Filter(FilterConfig),
    Grpc(GrpcConfig),
}

impl TransformConfig {
    pub fn new(transform_type: TransformType) -> Self {
        match transform_type {
            TransformType::Filter => Self::Filter(FilterConfig::default()),
            TransformType::Grpc => Self::Grpc(GrpcConfig::default()),
        }
    }

    pub fn transform_type(&self) -> TransformType {
        match self {
            Self::Filter(_) => TransformType::Filter,
            Self::Grpc(_) => TransformType::Grpc,
        }
    }
}

/// Keeps detections whose label is listed and whose confidence clears
/// the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub labels: Vec<String>,
    pub confidence_threshold: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            confidence_threshold: 30,
        }
    }
}

impl FilterConfig {
    /// Split free text such as `"person, car truck"` into labels.
    pub fn parse_labels(text: &str) -> Vec<String> {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Issues::default();
        issues
            .check("labels", self.labels.is_empty(), ERROR_BLANK_VALUE)
            .check(
                "confidence_threshold",
                !(0..=100).contains(&self.confidence_threshold),
                ERROR_THRESHOLD_RANGE,
            );
        issues.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrpcKind {
    Endpoint,
    Container,
}

pub const RESTART_POLICIES: &[&str] = &["always", "never", "on-failure", "on-unhealthy"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Custom gRPC processing step, reached at a URL or run as a container
/// next to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrpcConfig {
    pub kind: Option<GrpcKind>,
    pub endpoint_url: String,
    pub container_name: String,
    pub container_image: String,
    /// Docker create options as JSON text; may be empty.
    pub create_options: String,
    pub restart_policy: String,
    pub port: u32,
    pub route: String,
    /// Trailing row may be blank.
    pub env: Vec<EnvVar>,
    pub architecture: String,
    pub acceleration: String,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            kind: None,
            endpoint_url: String::new(),
            container_name: String::new(),
            container_image: String::new(),
            create_options: String::new(),
            restart_policy: "always".into(),
            port: 0,
            route: String::new(),
            env: vec![EnvVar::default()],
            architecture: String::new(),
            acceleration: String::new(),
        }
    }
}

impl GrpcConfig {
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Issues::default();
        match self.kind {
            None => {
                issues.check("type", true, ERROR_BLANK_VALUE);
            }
            Some(GrpcKind::Endpoint) => {
                issues.required("endpoint_url", &self.endpoint_url);
            }
            Some(GrpcKind::Container) => {
                let bad_options = !self.create_options.is_empty()
                    && serde_json::from_str::<serde_json::Value>(&self.create_options).is_err();
                let bad_route = !self.route.is_empty() && !is_route_path(&self.route);
                let last = self.env.len().saturating_sub(1);
                let bad_env = self.env.iter().enumerate().any(|(i, e)| {
                    let blank = e.key.is_empty() && e.value.is_empty();
                    !(blank && i == last) && (e.key.is_empty() || e.value.is_empty())
                });
                issues
                    .required("container_name", &self.container_name)
                    .required("container_image", &self.container_image)
                    .check("create_options", bad_options, ERROR_INVALID_FORMAT)
                    .check(
                        "restart_policy",
                        !RESTART_POLICIES.contains(&self.restart_policy.as_str()),
                        ERROR_BLANK_VALUE,
                    )
                    .check("port", !(1..=65535).contains(&self.port), ERROR_PORT_RANGE)
                    .check("route", bad_route, ERROR_INVALID_FORMAT)
                    .check("env", bad_env, ERROR_BLANK_VALUE)
                    .check(
                        "architecture",
                        !matches!(self.architecture.as_str(), "X64" | "ARM64"),
                        ERROR_BLANK_VALUE,
                    )
                    .required("acceleration", &self.acceleration);
            }
        }
        issues.0
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub export_type: ExportType,
    /// Seconds between exports, kept as entered.
    pub delay_buffer: String,
    pub filename_prefix: String,
    pub recording_duration: String,
    /// `"true"`, `"false"` or unset.
    pub insights_overlay: String,
    pub module_name: String,
    pub module_input: String,
    pub url: String,
    pub broker_address: String,
}

impl ExportConfig {
    pub fn new(export_type: ExportType) -> Self {
        Self {
            export_type,
            delay_buffer: export_type.default_delay_buffer().to_string(),
            filename_prefix: String::new(),
            recording_duration: String::new(),
            insights_overlay: String::new(),
            module_name: String::new(),
            module_input: String::new(),
            url: String::new(),
            broker_address: String::new(),
        }
    }

    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Issues::default();
        match self.export_type {
            ExportType::Http => {
                issues.required("url", &self.url);
                return issues.0;
            }
            ExportType::Snippet => {
                issues
                    .required("filename_prefix", &self.filename_prefix)
                    .required("recording_duration", &self.recording_duration)
                    .required("insights_overlay", &self.insights_overlay);
            }
            ExportType::IotEdge => {
                issues
                    .required("module_name", &self.module_name)
                    .required("module_input", &self.module_input);
            }
            ExportType::Mqtt => {
                issues.required("broker_address", &self.broker_address);
            }
            ExportType::IotHub => {}
        }

        if self.delay_buffer.is_empty() {
            issues.check("delay_buffer", true, ERROR_BLANK_VALUE);
            return issues.0;
        }
        match self.delay_buffer.trim().parse::<f64>() {
            Err(_) => {
                issues.check("delay_buffer", true, ERROR_INVALID_FORMAT);
            }
            Ok(delay) => {
                issues
                    .check(
                        "delay_buffer",
                        self.export_type == ExportType::Snippet && delay < 1.0,
                        ERROR_AT_LEAST_ONE,
                    )
                    .check(
                        "delay_buffer",
                        matches!(self.export_type, ExportType::IotHub | ExportType::IotEdge)
                            && delay <= 0.0,
                        ERROR_GREATER_THAN_ZERO,
                    );
            }
        }
        issues.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(issues: &[ConfigIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.field).collect()
    }

    // -- model --

    #[test]
    fn new_model_node_needs_model_and_capture_choice() {
        assert_eq!(fields(&ModelConfig::default().issues()), ["model", "capture_data"]);
    }

    #[test]
    fn capture_bounds_are_checked_when_capturing() {
        let config = ModelConfig {
            model: Some(ModelRef { id: 1, name: "yolo".into() }),
            capture_data: CaptureData::Yes,
            confidence_lower: 90,
            confidence_upper: 80,
            max_images: 0,
        };
        let issues = config.issues();
        assert_eq!(issues[0].message, ERROR_CONFIDENCE_ORDER);
        assert_eq!(issues[1].message, ERROR_RANGE_1_100);

        let off = ModelConfig {
            capture_data: CaptureData::No,
            ..config
        };
        assert!(off.issues().is_empty());
    }

    // -- transform --

    #[test]
    fn filter_labels_split_on_commas_and_spaces() {
        assert_eq!(FilterConfig::parse_labels("person, car  truck,"), ["person", "car", "truck"]);
    }

    #[test]
    fn grpc_container_rules() {
        let mut config = GrpcConfig {
            kind: Some(GrpcKind::Container),
            container_name: "ocr".into(),
            container_image: "acr.io/ocr:1".into(),
            create_options: "{bad".into(),
            port: 70000,
            route: "nope".into(),
            architecture: "X64".into(),
            acceleration: "CPU".into(),
            ..Default::default()
        };
        assert_eq!(fields(&config.issues()), ["create_options", "port", "route"]);

        config.create_options = r#"{"HostConfig":{}}"#.into();
        config.port = 8080;
        config.route = "/infer".into();
        config.env = vec![EnvVar { key: "A".into(), value: String::new() }, EnvVar::default()];
        assert_eq!(fields(&config.issues()), ["env"]);
    }

    // -- export --

    #[test]
    fn export_defaults_follow_type() {
        assert_eq!(ExportConfig::new(ExportType::Snippet).delay_buffer, "2");
        assert_eq!(ExportConfig::new(ExportType::IotHub).delay_buffer, "30");
        assert_eq!(ExportConfig::new(ExportType::Mqtt).delay_buffer, "30");
        assert_eq!(ExportConfig::new(ExportType::IotEdge).delay_buffer, "10");
        assert_eq!(ExportConfig::new(ExportType::Http).delay_buffer, "");
    }

    #[test]
    fn delay_buffer_bounds() {
        let mut snippet = ExportConfig::new(ExportType::Snippet);
        snippet.filename_prefix = "clip".into();
        snippet.recording_duration = "10".into();
        snippet.insights_overlay = "true".into();
        snippet.delay_buffer = "0.5".into();
        assert_eq!(snippet.issues()[0].message, ERROR_AT_LEAST_ONE);

        let mut hub = ExportConfig::new(ExportType::IotHub);
        hub.delay_buffer = "0".into();
        assert_eq!(hub.issues()[0].message, ERROR_GREATER_THAN_ZERO);

        let mut mqtt = ExportConfig::new(ExportType::Mqtt);
        mqtt.broker_address = "tcp://broker:1883".into();
        mqtt.delay_buffer = "0".into();
        assert!(mqtt.issues().is_empty());
    }
}
