//! Person name values: three name groups of five components each.

use std::fmt;

/// One of the three writing-system groups of a person name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameGroup {
    #[default]
    Alphabetic,
    Ideographic,
    Phonetic,
}

/// One of the five components within a name group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameComponent {
    FamilyName,
    GivenName,
    MiddleName,
    NamePrefix,
    NameSuffix,
}

const GROUPS: usize = 3;
const COMPONENTS: usize = 5;

/// A structured person name: a 3x5 grid of component strings.
///
/// The canonical encoding joins the components of each group with `^`
/// (trailing empty components elided) and the groups with `=` (trailing
/// empty groups elided): `Doe^John`, `Yamada^Taro=山田^太郎`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    components: [[String; COMPONENTS]; GROUPS],
}

impl PersonName {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one grid cell.
    pub fn set(&mut self, group: NameGroup, component: NameComponent, value: impl Into<String>) {
        self.components[group as usize][component as usize] = value.into();
    }

    /// Read one grid cell.
    #[must_use]
    pub fn get(&self, group: NameGroup, component: NameComponent) -> &str {
        &self.components[group as usize][component as usize]
    }

    /// Whether every cell is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components
            .iter()
            .all(|group| group.iter().all(|c| c.is_empty()))
    }

    fn group_string(&self, group: usize) -> String {
        let cells = &self.components[group];
        let used = cells
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |i| i + 1);
        cells[..used].join("^")
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<String> = (0..GROUPS).map(|g| self.group_string(g)).collect();
        let used = groups
            .iter()
            .rposition(|g| !g.is_empty())
            .map_or(0, |i| i + 1);
        f.write_str(&groups[..used].join("="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabetic_family_and_given() {
        let mut pn = PersonName::new();
        pn.set(NameGroup::Alphabetic, NameComponent::FamilyName, "Doe");
        pn.set(NameGroup::Alphabetic, NameComponent::GivenName, "John");
        assert_eq!(pn.to_string(), "Doe^John");
    }

    #[test]
    fn interior_empty_components_are_kept() {
        let mut pn = PersonName::new();
        pn.set(NameGroup::Alphabetic, NameComponent::FamilyName, "Adams");
        pn.set(NameGroup::Alphabetic, NameComponent::NamePrefix, "Rev.");
        assert_eq!(pn.to_string(), "Adams^^^Rev.");
    }

    #[test]
    fn trailing_groups_elided() {
        let mut pn = PersonName::new();
        pn.set(NameGroup::Alphabetic, NameComponent::FamilyName, "Yamada");
        pn.set(NameGroup::Ideographic, NameComponent::FamilyName, "山田");
        assert_eq!(pn.to_string(), "Yamada=山田");

        let mut pn = PersonName::new();
        pn.set(NameGroup::Phonetic, NameComponent::FamilyName, "yamada");
        assert_eq!(pn.to_string(), "==yamada");
    }

    #[test]
    fn empty_name_renders_empty() {
        assert_eq!(PersonName::new().to_string(), "");
        assert!(PersonName::new().is_empty());
    }
}
