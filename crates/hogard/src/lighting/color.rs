use serde::Deserialize;
use serde::Serialize;

/// Color part of a `light.turn_on` payload.
///
/// Serializes as a single map entry, `color_temp_kelvin` or `rgb_color`, so
/// it can be flattened into the service data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorDirective {
    /// Correlated color temperature in Kelvin
    ColorTempKelvin(u16),
    RgbColor([u8; 3]),
}

/// Words accepted as colors, as spoken in Rioplatense Spanish
const COLOR_TABLE: &[(&str, ColorDirective)] = &[
    ("blanco", ColorDirective::ColorTempKelvin(4000)),
    ("blanca", ColorDirective::ColorTempKelvin(4000)),
    ("cálida", ColorDirective::ColorTempKelvin(2700)),
    ("calida", ColorDirective::ColorTempKelvin(2700)),
    ("fría", ColorDirective::ColorTempKelvin(5000)),
    ("fria", ColorDirective::ColorTempKelvin(5000)),
    ("azul", ColorDirective::RgbColor([0, 0, 255])),
    ("rojo", ColorDirective::RgbColor([255, 0, 0])),
    ("verde", ColorDirective::RgbColor([0, 255, 0])),
];

/// Look up a color word. Unknown words return `None` and must leave the
/// light's color untouched.
pub fn resolve_color(word: &str) -> Option<ColorDirective> {
    let word = word.trim().to_lowercase();
    COLOR_TABLE
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, directive)| *directive)
}

/// Every accepted color word, in table order
pub fn color_words() -> impl Iterator<Item = &'static str> {
    COLOR_TABLE.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_spellings_share_temperature() {
        assert_eq!(resolve_color("blanco"), Some(ColorDirective::ColorTempKelvin(4000)));
        assert_eq!(resolve_color("blanca"), resolve_color("blanco"));
    }

    #[test]
    fn test_warm_and_cool_with_and_without_accent() {
        assert_eq!(resolve_color("Cálida"), Some(ColorDirective::ColorTempKelvin(2700)));
        assert_eq!(resolve_color("calida"), Some(ColorDirective::ColorTempKelvin(2700)));
        assert_eq!(resolve_color("FRÍA"), Some(ColorDirective::ColorTempKelvin(5000)));
        assert_eq!(resolve_color("fria "), Some(ColorDirective::ColorTempKelvin(5000)));
    }

    #[test]
    fn test_rgb_colors() {
        assert_eq!(resolve_color("azul"), Some(ColorDirective::RgbColor([0, 0, 255])));
        assert_eq!(resolve_color("Rojo"), Some(ColorDirective::RgbColor([255, 0, 0])));
        assert_eq!(resolve_color("verde"), Some(ColorDirective::RgbColor([0, 255, 0])));
    }

    #[test]
    fn test_unknown_words() {
        for word in ["amarillo", "", "azulado", "blue"] {
            assert_eq!(resolve_color(word), None, "{:?}", word);
        }
    }

    #[test]
    fn test_directive_serializes_as_service_field() {
        assert_eq!(
            serde_json::to_value(ColorDirective::RgbColor([0, 0, 255])).unwrap(),
            serde_json::json!({ "rgb_color": [0, 0, 255] })
        );
        assert_eq!(
            serde_json::to_value(ColorDirective::ColorTempKelvin(2700)).unwrap(),
            serde_json::json!({ "color_temp_kelvin": 2700 })
        );
    }
}
