//! Language-model agent that turns a chat message into light actions.
//!
//! The model is an external collaborator. This module only defines the
//! tool surface it may use and drives the request/tool-call loop.

mod openai;
mod tools;

use async_trait::async_trait;
pub use openai::OpenAiAgent;
pub use tools::parse_tool_call;
pub use tools::tool_definitions;
pub use tools::ToolError;
pub use tools::ToolExecutor;
pub use tools::Toolbox;

use crate::lighting::color_words;
use crate::lighting::AreaRegistry;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent is not configured: {0}")]
    Config(&'static str),

    #[error("model request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("no final answer after {0} steps")]
    StepLimit(usize),
}

/// Answers one user message, possibly acting on the house along the way
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, text: &str) -> Result<String, AgentError>;
}

/// Instructions given to the model ahead of every conversation
pub fn system_prompt(registry: &AreaRegistry, default_area: &str) -> String {
    let areas = registry.names().collect::<Vec<_>>().join(", ");
    let colors = color_words().collect::<Vec<_>>().join(", ");

    format!(
        "Eres un agente domótico que controla luces a través de Home Assistant.\n\
         Dispones de estas herramientas: turn_on_lights(area, brightness?, color?), \
         turn_off_lights(area), set_brightness(area, brightness), get_light_state(area).\n\
         \n\
         Reglas:\n\
         - El usuario habla en español rioplatense. Interpreta frases como \"prendé\", \"apagá\", \"subí al 50%\", \"color azul\".\n\
         - Áreas disponibles: {areas}.\n\
         - Si el usuario no especifica área, usa por defecto el área '{default_area}'.\n\
         - brightness es 0-100. Si el usuario dice \"al 60%\" mapea a brightness=60.\n\
         - Colores aceptados: {colors}.\n\
         - Responde corto, confirma la acción realizada.\n\
         - Si no entiendes, pide una aclaración concreta, pero intentá resolver con supuestos razonables.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AreasConfig;

    #[test]
    fn test_system_prompt_lists_vocabulary() {
        let registry = AreaRegistry::new(&AreasConfig::default().areas);
        let prompt = system_prompt(&registry, "living");

        assert!(prompt.contains("Áreas disponibles: living, dormitorio, cocina."));
        assert!(prompt.contains("usa por defecto el área 'living'"));
        assert!(prompt.contains("azul, rojo, verde"));
    }
}
