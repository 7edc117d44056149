use tracing::warn;

use crate::config::AreaConfig;

/// A canonical area with its normalized aliases and device group
#[derive(Debug, Clone)]
struct Area {
    name: String,
    aliases: Vec<String>,
    devices: Vec<String>,
}

/// An alias claimed by more than one area.
///
/// `winner` is the area `resolve_area` returns for the alias: a canonical
/// name first, otherwise the first registered claimant. `shadowed` can never
/// be reached through this alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOverlap {
    pub alias: String,
    pub winner: String,
    pub shadowed: String,
}

/// Immutable lookup table from spoken area names to device groups.
///
/// Built once at startup and shared by reference between requests.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: Vec<Area>,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl AreaRegistry {
    pub fn new(areas: &[AreaConfig]) -> Self {
        let areas = areas
            .iter()
            .map(|a| Area {
                name: normalize(&a.name),
                aliases: a
                    .aliases
                    .iter()
                    .map(|alias| normalize(alias))
                    .filter(|alias| !alias.is_empty())
                    .collect(),
                devices: a
                    .devices
                    .iter()
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect(),
            })
            .collect();

        let registry = Self { areas };
        for overlap in registry.alias_overlaps() {
            warn!(
                "Alias '{}' is registered for both '{}' and '{}'; resolving to '{}'",
                overlap.alias, overlap.winner, overlap.shadowed, overlap.winner
            );
        }
        registry
    }

    /// Resolve free-form text to a canonical area.
    ///
    /// Matching is exact after trimming and lower-casing. A canonical name
    /// wins over any alias; aliases are scanned in registration order.
    pub fn resolve_area(&self, text: &str) -> Option<&str> {
        let needle = normalize(text);
        if needle.is_empty() {
            return None;
        }

        if let Some(area) = self.areas.iter().find(|a| a.name == needle) {
            return Some(area.name.as_str());
        }

        self.areas
            .iter()
            .find(|a| a.aliases.iter().any(|alias| *alias == needle))
            .map(|a| a.name.as_str())
    }

    /// Devices mapped to a canonical area, in configuration order.
    ///
    /// Unknown areas yield an empty slice.
    pub fn devices_for(&self, area: &str) -> &[String] {
        self.areas
            .iter()
            .find(|a| a.name == area)
            .map(|a| a.devices.as_slice())
            .unwrap_or_default()
    }

    /// Canonical area names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|a| a.name.as_str())
    }

    /// Aliases that resolve ambiguously across areas.
    ///
    /// The winner is whatever `resolve_area` picks; every other area claiming
    /// the alias, by name or by alias, is reported as shadowed.
    pub fn alias_overlaps(&self) -> Vec<AliasOverlap> {
        let mut claims: Vec<(&str, Vec<&str>)> = Vec::new();
        for area in &self.areas {
            for alias in std::iter::once(&area.name).chain(&area.aliases) {
                match claims.iter_mut().find(|(claimed, _)| *claimed == alias.as_str()) {
                    Some((_, owners)) => {
                        if !owners.contains(&area.name.as_str()) {
                            owners.push(area.name.as_str());
                        }
                    }
                    None => claims.push((alias.as_str(), vec![area.name.as_str()])),
                }
            }
        }

        let mut overlaps = Vec::new();
        for (alias, owners) in claims.into_iter().filter(|(_, owners)| owners.len() > 1) {
            let Some(winner) = self.resolve_area(alias) else {
                continue;
            };
            for shadowed in owners.into_iter().filter(|owner| *owner != winner) {
                overlaps.push(AliasOverlap {
                    alias: alias.to_string(),
                    winner: winner.to_string(),
                    shadowed: shadowed.to_string(),
                });
            }
        }
        overlaps
    }
}
