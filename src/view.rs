use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Scan,
    Library,
    Overdue,
}

/// Data a panel needs when it becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelLoad {
    ResetScan,
    Books,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewEffects {
    pub stop_scanner: bool,
    pub load: PanelLoad,
}

impl View {
    pub fn on_enter(self) -> ViewEffects {
        match self {
            View::Scan => ViewEffects {
                stop_scanner: false,
                load: PanelLoad::ResetScan,
            },
            View::Library => ViewEffects {
                stop_scanner: true,
                load: PanelLoad::Books,
            },
            View::Overdue => ViewEffects {
                stop_scanner: true,
                load: PanelLoad::Overdue,
            },
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(View::Scan),
            "library" => Ok(View::Library),
            "overdue" => Ok(View::Overdue),
            other => Err(format!("unknown view: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("library".parse::<View>(), Ok(View::Library));
        assert!("settings".parse::<View>().is_err());
    }

    #[test]
    fn test_leaving_scan_stops_scanner() {
        assert!(!View::Scan.on_enter().stop_scanner);
        assert!(View::Library.on_enter().stop_scanner);
        assert_eq!(View::Overdue.on_enter().load, PanelLoad::Overdue);
    }
}
