//! The schema registry: every field path a condition may reference.
//!
//! The tree is built once on first use and shared read-only by every
//! validator; it is also exported for external tooling such as
//! autocompletion.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::enums::ValueType;

/// A node in the schema tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub field_type: ValueType,
    pub description: &'static str,
    pub children: BTreeMap<&'static str, FieldInfo>,
}

impl FieldInfo {
    fn leaf(name: &'static str, field_type: ValueType, description: &'static str) -> Self {
        FieldInfo {
            name,
            field_type,
            description,
            children: BTreeMap::new(),
        }
    }

    fn object(name: &'static str, description: &'static str, children: Vec<FieldInfo>) -> Self {
        FieldInfo {
            name,
            field_type: ValueType::Object,
            description,
            children: children.into_iter().map(|c| (c.name, c)).collect(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Immutable field tree rooted at an unnamed object node.
#[derive(Debug)]
pub struct SchemaRegistry {
    root: FieldInfo,
    paths: Vec<String>,
}

static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::build);

/// The process-wide registry.
pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

impl SchemaRegistry {
    fn build() -> Self {
        let root = FieldInfo::object(
            "",
            "Policy evaluation input",
            vec![request_fields(), response_fields(), processing_fields(), context_fields()],
        );
        let mut paths = Vec::new();
        collect_paths(&root, "", &mut paths);
        SchemaRegistry { root, paths }
    }

    pub fn root(&self) -> &FieldInfo {
        &self.root
    }

    /// Resolve a dotted path such as `request.model`.
    ///
    /// Fails as soon as a segment is absent or the current node is a leaf.
    pub fn lookup(&self, path: &str) -> Option<&FieldInfo> {
        let mut current = &self.root;
        for segment in path.split('.') {
            if !current.has_children() {
                return None;
            }
            current = current.children.get(segment)?;
        }
        Some(current)
    }

    /// Every non-root path, depth-first pre-order, children in name order.
    pub fn all_paths(&self) -> &[String] {
        &self.paths
    }
}

fn collect_paths(node: &FieldInfo, prefix: &str, out: &mut Vec<String>) {
    for child in node.children.values() {
        let path = if prefix.is_empty() {
            child.name.to_string()
        } else {
            format!("{}.{}", prefix, child.name)
        };
        out.push(path.clone());
        collect_paths(child, &path, out);
    }
}

// ─── Field tree ─────────────────────────────────────────────────────────────

fn request_fields() -> FieldInfo {
    use ValueType::*;
    FieldInfo::object(
        "request",
        "The outbound LLM request",
        vec![
            FieldInfo::leaf("model", String, "Requested model identifier"),
            FieldInfo::leaf("provider", String, "Upstream provider name"),
            FieldInfo::leaf("prompt", String, "Concatenated prompt text"),
            FieldInfo::leaf("system_prompt", String, "System prompt, if any"),
            FieldInfo::leaf("messages", Array, "Chat messages in order"),
            FieldInfo::leaf("max_tokens", Number, "Requested completion token limit"),
            FieldInfo::leaf("temperature", Number, "Sampling temperature"),
            FieldInfo::leaf("stream", Boolean, "Whether streaming was requested"),
            FieldInfo::leaf("tools", Array, "Tool definitions offered to the model"),
            FieldInfo::leaf("user", String, "End-user identifier supplied with the request"),
            FieldInfo::leaf("estimated_tokens", Number, "Prompt token estimate"),
            FieldInfo::leaf("headers", Object, "Request headers"),
            FieldInfo::leaf("metadata", Object, "Caller-supplied metadata"),
        ],
    )
}

fn response_fields() -> FieldInfo {
    use ValueType::*;
    FieldInfo::object(
        "response",
        "The LLM response, when available",
        vec![
            FieldInfo::leaf("content", String, "Generated text"),
            FieldInfo::leaf("model", String, "Model that produced the response"),
            FieldInfo::leaf("finish_reason", String, "Why generation stopped"),
            FieldInfo::leaf("tool_calls", Array, "Tool invocations requested by the model"),
            FieldInfo::leaf("latency_ms", Number, "Upstream latency in milliseconds"),
            FieldInfo::leaf("cost", Number, "Cost of the call in USD"),
            FieldInfo::object(
                "usage",
                "Token accounting",
                vec![
                    FieldInfo::leaf("prompt_tokens", Number, "Tokens in the prompt"),
                    FieldInfo::leaf("completion_tokens", Number, "Tokens in the completion"),
                    FieldInfo::leaf("total_tokens", Number, "Prompt plus completion tokens"),
                ],
            ),
        ],
    )
}

fn processing_fields() -> FieldInfo {
    use ValueType::*;
    FieldInfo::object(
        "processing",
        "Results of gateway-side analysis",
        vec![
            FieldInfo::object(
                "pii",
                "Personally identifiable information detection",
                vec![
                    FieldInfo::leaf("detected", Boolean, "Whether PII was found"),
                    FieldInfo::leaf("types", Array, "Kinds of PII found"),
                    FieldInfo::leaf("count", Number, "Number of PII matches"),
                ],
            ),
            FieldInfo::object(
                "injection",
                "Prompt injection detection",
                vec![
                    FieldInfo::leaf("detected", Boolean, "Whether an injection was found"),
                    FieldInfo::leaf("score", Number, "Detector confidence between 0 and 1"),
                ],
            ),
            FieldInfo::object(
                "sensitive",
                "Sensitive data detection",
                vec![
                    FieldInfo::leaf("detected", Boolean, "Whether sensitive data was found"),
                    FieldInfo::leaf("categories", Array, "Categories of sensitive data"),
                ],
            ),
            FieldInfo::leaf("tokens", Number, "Tokens counted by the gateway"),
            FieldInfo::leaf("duration_ms", Number, "Gateway processing time in milliseconds"),
            FieldInfo::leaf("cached", Boolean, "Whether the response came from cache"),
        ],
    )
}

fn context_fields() -> FieldInfo {
    use ValueType::*;
    FieldInfo::object(
        "context",
        "Caller and environment context",
        vec![
            FieldInfo::object(
                "user",
                "Authenticated caller",
                vec![
                    FieldInfo::leaf("id", String, "User identifier"),
                    FieldInfo::leaf("role", String, "User role"),
                    FieldInfo::leaf("email", String, "User email address"),
                    FieldInfo::leaf("groups", Array, "Groups the user belongs to"),
                ],
            ),
            FieldInfo::object(
                "organization",
                "Owning organization",
                vec![
                    FieldInfo::leaf("id", String, "Organization identifier"),
                    FieldInfo::leaf("tier", String, "Subscription tier"),
                ],
            ),
            FieldInfo::object(
                "time",
                "Wall-clock time of the request",
                vec![
                    FieldInfo::leaf("hour", Number, "Hour of day, 0-23"),
                    FieldInfo::leaf("day_of_week", String, "Lowercase weekday name"),
                    FieldInfo::leaf("timestamp", Number, "Unix timestamp in seconds"),
                ],
            ),
            FieldInfo::object(
                "budget",
                "Spend tracked for the caller",
                vec![
                    FieldInfo::leaf("spent", Number, "Amount spent in the current window"),
                    FieldInfo::leaf("remaining", Number, "Amount remaining in the current window"),
                ],
            ),
            FieldInfo::leaf("environment", String, "Deployment environment"),
            FieldInfo::leaf("ip_address", String, "Client IP address"),
            FieldInfo::leaf("session_id", String, "Session identifier"),
            FieldInfo::leaf("request_count", Number, "Requests made in the current window"),
        ],
    )
}
