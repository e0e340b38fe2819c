//! Per-geometry-kind minimum hit times.
//!
//! Every intersection test asks this table how far along the ray a hit must
//! be before it counts. Lookups never fail: unregistered kinds get the
//! default.

use std::collections::HashMap;

/// Default minimum hit time when nothing more specific is registered.
pub const DEFAULT_EPSILON: f32 = 1.0e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonTable {
    default: f32,
    overrides: HashMap<String, f32>,
}

impl EpsilonTable {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Register an override for one geometry kind.
    pub fn with(mut self, kind: impl Into<String>, epsilon: f32) -> Self {
        self.set(kind, epsilon);
        self
    }

    pub fn set(&mut self, kind: impl Into<String>, epsilon: f32) {
        self.overrides.insert(kind.into(), epsilon);
    }

    /// Minimum valid hit time for `kind`.
    #[inline]
    pub fn get(&self, kind: &str) -> f32 {
        self.overrides.get(kind).copied().unwrap_or(self.default)
    }

    /// Like [`get`](Self::get), with `fallback` standing in for the
    /// table's own default.
    #[inline]
    pub fn get_or(&self, kind: &str, fallback: f32) -> f32 {
        self.overrides.get(kind).copied().unwrap_or(fallback)
    }

    pub fn default_epsilon(&self) -> f32 {
        self.default
    }

    pub fn set_default(&mut self, default: f32) {
        self.default = default;
    }
}

impl Default for EpsilonTable {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_kind_falls_back() {
        let table = EpsilonTable::new(0.01).with("sphere", 0.002);

        assert_eq!(table.get("sphere"), 0.002);
        assert_eq!(table.get("nurbs"), 0.01);
        assert_eq!(table.get(""), 0.01);
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = EpsilonTable::default();
        table.set("plane", 0.5);
        table.set("plane", 0.25);

        assert_eq!(table.get("plane"), 0.25);
        assert_eq!(table.default_epsilon(), DEFAULT_EPSILON);
    }

    #[test]
    fn test_fallback_yields_to_overrides() {
        let table = EpsilonTable::new(0.01).with("sphere", 0.002);

        assert_eq!(table.get_or("sphere", 0.5), 0.002);
        assert_eq!(table.get_or("plane", 0.5), 0.5);
    }
}
