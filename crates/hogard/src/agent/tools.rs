//! The light actions as function-calling tools.
//!
//! Tool names and argument shapes are what the model sees, so they are wire
//! stable. Parse failures are returned to the model as text, never as errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Deserializer;
use serde_json::json;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::ha::Backend;
use crate::lighting::ActionKind;
use crate::lighting::ActionRequest;
use crate::lighting::LightActions;

/// Something that can carry out a parsed action and describe the outcome
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn invoke(&self, request: &ActionRequest) -> String;
}

#[async_trait]
impl<B: Backend> ToolExecutor for LightActions<B> {
    async fn invoke(&self, request: &ActionRequest) -> String {
        self.execute(request).await
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: ActionKind, message: String },

    #[error("{tool} requires '{argument}'")]
    MissingArgument {
        tool: ActionKind,
        argument: &'static str,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ToolArguments {
    #[serde(default)]
    area: Option<String>,

    #[serde(default, deserialize_with = "lenient_integer")]
    brightness: Option<i64>,

    #[serde(default)]
    color: Option<String>,
}

/// Accept `60`, `60.4`, `"60"` and `"60%"`. Models are not consistent.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim().trim_end_matches('%').trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        Some(_) => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value.unwrap_or_default())))
}

/// Parse a tool call into an action request.
///
/// `arguments` is the JSON object the model produced. An omitted area falls
/// back to `default_area`.
pub fn parse_tool_call(
    name: &str,
    arguments: &str,
    default_area: &str,
) -> Result<ActionRequest, ToolError> {
    let tool: ActionKind = name
        .trim()
        .parse()
        .map_err(|_| ToolError::UnknownTool(name.to_string()))?;

    let args: ToolArguments = if arguments.trim().is_empty() {
        ToolArguments::default()
    } else {
        serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments {
            tool,
            message: e.to_string(),
        })?
    };

    let area = args
        .area
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| default_area.to_string());
    let color = args.color.filter(|c| !c.trim().is_empty());

    Ok(match tool {
        ActionKind::TurnOnLights => ActionRequest::TurnOn {
            area,
            brightness: args.brightness,
            color,
        },
        ActionKind::TurnOffLights => ActionRequest::TurnOff { area },
        ActionKind::SetBrightness => ActionRequest::SetBrightness {
            area,
            brightness: args.brightness.ok_or(ToolError::MissingArgument {
                tool,
                argument: "brightness",
            })?,
        },
        ActionKind::GetLightState => ActionRequest::GetState { area },
    })
}

/// Function definitions in the chat-completions `tools` format
pub fn tool_definitions() -> serde_json::Value {
    let area = json!({
        "type": "string",
        "description": "Área de la casa, por ejemplo living, dormitorio o cocina",
    });
    let brightness = json!({
        "type": "integer",
        "minimum": 0,
        "maximum": 100,
        "description": "Brillo en porcentaje (0-100)",
    });

    let tools: Vec<serde_json::Value> = ActionKind::iter()
        .map(|kind| {
            let (description, parameters) = match kind {
                ActionKind::TurnOnLights => (
                    "Enciende luces en un área, opcionalmente con brillo y color.",
                    json!({
                        "type": "object",
                        "properties": {
                            "area": area,
                            "brightness": brightness,
                            "color": {
                                "type": "string",
                                "description": "azul, rojo, verde, blanco/blanca, cálida o fría",
                            },
                        },
                        "required": ["area"],
                    }),
                ),
                ActionKind::TurnOffLights => (
                    "Apaga luces en un área.",
                    json!({
                        "type": "object",
                        "properties": { "area": area },
                        "required": ["area"],
                    }),
                ),
                ActionKind::SetBrightness => (
                    "Ajusta el brillo (0-100) de las luces del área.",
                    json!({
                        "type": "object",
                        "properties": { "area": area, "brightness": brightness },
                        "required": ["area", "brightness"],
                    }),
                ),
                ActionKind::GetLightState => (
                    "Devuelve el estado resumido de las luces de un área.",
                    json!({
                        "type": "object",
                        "properties": { "area": area },
                        "required": ["area"],
                    }),
                ),
            };
            json!({
                "type": "function",
                "function": {
                    "name": kind.as_ref(),
                    "description": description,
                    "parameters": parameters,
                },
            })
        })
        .collect();

    serde_json::Value::Array(tools)
}

/// Routes named tool calls to an executor
#[derive(Clone)]
pub struct Toolbox {
    executor: Arc<dyn ToolExecutor>,
    default_area: String,
}

impl Toolbox {
    pub fn new(executor: Arc<dyn ToolExecutor>, default_area: impl Into<String>) -> Self {
        Self {
            executor,
            default_area: default_area.into(),
        }
    }

    pub fn default_area(&self) -> &str {
        &self.default_area
    }

    /// Run one tool call and return the text to hand back to the model
    pub async fn dispatch(&self, name: &str, arguments: &str) -> String {
        match parse_tool_call(name, arguments, &self.default_area) {
            Ok(request) => {
                debug!("Dispatching {:?}", request);
                self.executor.invoke(&request).await
            }
            Err(e) => {
                debug!("Rejected tool call {}({}): {}", name, arguments, e);
                format!("Error: {}", e)
            }
        }
    }
}
