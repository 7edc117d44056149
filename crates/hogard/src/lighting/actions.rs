use std::sync::Arc;

use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumIter;
use strum::EnumString;
use tracing::info;
use tracing::warn;

use super::area::AreaRegistry;
use super::brightness::Brightness;
use super::color::resolve_color;
use super::color::ColorDirective;
use crate::ha::Backend;
use crate::ha::BackendError;

/// The four light actions, named as the agent sees them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    TurnOnLights,
    TurnOffLights,
    SetBrightness,
    GetLightState,
}

impl ActionKind {
    /// Leading words of the failure text, before the area
    fn failure_prefix(self) -> &'static str {
        match self {
            ActionKind::TurnOnLights => "Error encendiendo luces en",
            ActionKind::TurnOffLights => "Error apagando luces en",
            ActionKind::SetBrightness => "Error ajustando brillo en",
            ActionKind::GetLightState => "Error obteniendo estado de luces en",
        }
    }
}

/// One tool invocation, with the parameters still as the user phrased them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    TurnOn {
        area: String,
        brightness: Option<i64>,
        color: Option<String>,
    },
    TurnOff {
        area: String,
    },
    SetBrightness {
        area: String,
        brightness: i64,
    },
    GetState {
        area: String,
    },
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::TurnOn { .. } => ActionKind::TurnOnLights,
            ActionRequest::TurnOff { .. } => ActionKind::TurnOffLights,
            ActionRequest::SetBrightness { .. } => ActionKind::SetBrightness,
            ActionRequest::GetState { .. } => ActionKind::GetLightState,
        }
    }

    pub fn area(&self) -> &str {
        match self {
            ActionRequest::TurnOn { area, .. }
            | ActionRequest::TurnOff { area }
            | ActionRequest::SetBrightness { area, .. }
            | ActionRequest::GetState { area } => area,
        }
    }
}

/// Why an action did not happen. Rendered as the reply text.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("No hay luces mapeadas para el área '{0}'.")]
    UnmappedArea(String),

    #[error("{} {area}: {source}", .kind.failure_prefix())]
    Backend {
        kind: ActionKind,
        area: String,
        #[source]
        source: BackendError,
    },
}

/// Service data for `light.turn_on` / `light.turn_off`
#[derive(Debug, Serialize)]
struct LightServiceData<'a> {
    entity_id: &'a [String],

    #[serde(skip_serializing_if = "Option::is_none")]
    brightness_pct: Option<Brightness>,

    #[serde(flatten)]
    color: Option<ColorDirective>,
}

/// Area the request addresses, after alias resolution
struct Target<'a> {
    area: &'a str,
    devices: &'a [String],
}

/// Translates light actions into Home Assistant service calls.
///
/// Every public operation returns the text to send back to the user; backend
/// failures are folded into that text and never propagate.
pub struct LightActions<B> {
    registry: Arc<AreaRegistry>,
    backend: B,
}

impl<B: Backend> LightActions<B> {
    pub fn new(registry: Arc<AreaRegistry>, backend: B) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &AreaRegistry {
        &self.registry
    }

    /// Run any action request
    pub async fn execute(&self, request: &ActionRequest) -> String {
        match request {
            ActionRequest::TurnOn {
                area,
                brightness,
                color,
            } => {
                self.turn_on_lights(area, *brightness, color.as_deref())
                    .await
            }
            ActionRequest::TurnOff { area } => self.turn_off_lights(area).await,
            ActionRequest::SetBrightness { area, brightness } => {
                self.set_brightness(area, *brightness).await
            }
            ActionRequest::GetState { area } => self.get_light_state(area).await,
        }
    }

    pub async fn turn_on_lights(
        &self,
        area: &str,
        brightness: Option<i64>,
        color: Option<&str>,
    ) -> String {
        render(self.try_turn_on(area, brightness, color).await)
    }

    pub async fn turn_off_lights(&self, area: &str) -> String {
        render(self.try_turn_off(area).await)
    }

    pub async fn set_brightness(&self, area: &str, brightness: i64) -> String {
        render(self.try_set_brightness(area, brightness).await)
    }

    pub async fn get_light_state(&self, area: &str) -> String {
        render(self.try_get_state(area).await)
    }

    /// Resolve the area text and require a non-empty device group
    fn target<'a>(&'a self, area: &'a str) -> Result<Target<'a>, ActionError> {
        let area = self
            .registry
            .resolve_area(area)
            .unwrap_or_else(|| area.trim());
        let devices = self.registry.devices_for(area);
        if devices.is_empty() {
            return Err(ActionError::UnmappedArea(area.to_string()));
        }
        Ok(Target { area, devices })
    }

    async fn call_light_service(
        &self,
        kind: ActionKind,
        target: &Target<'_>,
        service: &str,
        data: LightServiceData<'_>,
    ) -> Result<(), ActionError> {
        let backend_error = |source| ActionError::Backend {
            kind,
            area: target.area.to_string(),
            source,
        };

        let payload = serde_json::to_value(&data)
            .map_err(|e| backend_error(BackendError::Payload(e)))?;
        self.backend
            .call_service("light", service, &payload)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn try_turn_on(
        &self,
        area: &str,
        brightness: Option<i64>,
        color: Option<&str>,
    ) -> Result<String, ActionError> {
        let target = self.target(area)?;
        let brightness = brightness.map(Brightness::clamped);
        // Unknown color words leave the color alone.
        let color = color
            .map(str::trim)
            .and_then(|word| resolve_color(word).map(|directive| (word, directive)));

        let data = LightServiceData {
            entity_id: target.devices,
            brightness_pct: brightness,
            color: color.map(|(_, directive)| directive),
        };
        self.call_light_service(ActionKind::TurnOnLights, &target, "turn_on", data)
            .await?;

        let mut reply = format!("Luces encendidas en {}", target.area);
        if let Some(brightness) = brightness {
            reply.push_str(&format!(" al {}", brightness));
        }
        if let Some((word, _)) = color {
            reply.push_str(&format!(" color {}", word));
        }
        info!("{}", reply);
        Ok(reply)
    }

    async fn try_turn_off(&self, area: &str) -> Result<String, ActionError> {
        let target = self.target(area)?;
        let data = LightServiceData {
            entity_id: target.devices,
            brightness_pct: None,
            color: None,
        };
        self.call_light_service(ActionKind::TurnOffLights, &target, "turn_off", data)
            .await?;

        let reply = format!("Luces apagadas en {}", target.area);
        info!("{}", reply);
        Ok(reply)
    }

    async fn try_set_brightness(&self, area: &str, brightness: i64) -> Result<String, ActionError> {
        let target = self.target(area)?;
        let brightness = Brightness::clamped(brightness);
        let data = LightServiceData {
            entity_id: target.devices,
            brightness_pct: Some(brightness),
            color: None,
        };
        self.call_light_service(ActionKind::SetBrightness, &target, "turn_on", data)
            .await?;

        let reply = format!("Brillo en {} ajustado a {}", target.area, brightness);
        info!("{}", reply);
        Ok(reply)
    }

    /// Fetch each device's state in group order. The first failure aborts the
    /// query and discards the states gathered so far.
    async fn try_get_state(&self, area: &str) -> Result<String, ActionError> {
        let target = self.target(area)?;

        let mut states = Vec::with_capacity(target.devices.len());
        for device in target.devices {
            let state = self
                .backend
                .get_state(device)
                .await
                .map_err(|source| ActionError::Backend {
                    kind: ActionKind::GetLightState,
                    area: target.area.to_string(),
                    source,
                })?;
            states.push(format!(
                "{} => {}",
                device,
                state.state.as_deref().unwrap_or("unknown")
            ));
        }

        Ok(states.join("; "))
    }
}

fn render(result: Result<String, ActionError>) -> String {
    result.unwrap_or_else(|e| {
        warn!("{}", e);
        e.to_string()
    })
}
