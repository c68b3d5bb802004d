use std::fmt;

use serde::Serialize;

/// The named sections of the main view. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Dashboard,
    Analytics,
    Scheduler,
    Events,
    News,
}

impl Section {
    /// Navigation order; also the Alt+1..5 shortcut order.
    pub const ALL: [Section; 5] = [
        Section::Dashboard,
        Section::Analytics,
        Section::Scheduler,
        Section::Events,
        Section::News,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Analytics => "analytics",
            Self::Scheduler => "scheduler",
            Self::Events => "events",
            Self::News => "news",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Analytics => "Analytics",
            Self::Scheduler => "Smart Scheduler",
            Self::Events => "Events",
            Self::News => "News",
        }
    }

    /// Look up a section by id. Ids are matched exactly.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Section bound to the Alt+`digit` shortcut (1-based).
    pub fn from_shortcut(digit: u8) -> Option<Self> {
        let index = usize::from(digit).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_id() {
        for section in Section::ALL {
            assert_eq!(Section::parse(section.id()), Some(section));
        }
        assert_eq!(Section::parse("reports"), None);
        assert_eq!(Section::parse("Analytics"), None);
    }

    #[test]
    fn shortcuts_cover_one_through_five() {
        assert_eq!(Section::from_shortcut(1), Some(Section::Dashboard));
        assert_eq!(Section::from_shortcut(5), Some(Section::News));
        assert_eq!(Section::from_shortcut(0), None);
        assert_eq!(Section::from_shortcut(6), None);
    }

    #[test]
    fn default_is_dashboard() {
        assert_eq!(Section::default(), Section::Dashboard);
    }
}
