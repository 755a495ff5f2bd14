//! Two-level settings menu.
//!
//! Every inline button carries a [`SettingsSelector`]: the level and id of the
//! menu the button belongs to plus the chosen action. Selectors go through
//! [`SettingsSelector::encode`] / [`SettingsSelector::decode`] only, and are
//! resolved against the menu table, so a forged callback can never reach a chat
//! record.

use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use std::collections::HashMap;

use crate::bot::messenger::{InlineButton, Keyboard};
use crate::config::QuizSettings;
use crate::error::BotError;
use crate::utils::datetime::format_slot;
use crate::utils::validation::parse_time_slot;

pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
const SELECTOR_PREFIX: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuId {
    Main,
    QuizLength,
    QuizTime,
}

impl MenuId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuId::Main => "main",
            MenuId::QuizLength => "quiz-len",
            MenuId::QuizTime => "quiz-time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(MenuId::Main),
            "quiz-len" => Some(MenuId::QuizLength),
            "quiz-time" => Some(MenuId::QuizTime),
            _ => None,
        }
    }

    /// Depth of the menu: `main` is the root, the rest hang off it
    pub fn level(&self) -> u8 {
        match self {
            MenuId::Main => 0,
            MenuId::QuizLength | MenuId::QuizTime => 1,
        }
    }

    /// Text sent above the menu's keyboard
    pub fn prompt(&self) -> &'static str {
        match self {
            MenuId::Main => "Available settings:",
            MenuId::QuizLength => "Please select the number of questions per quiz",
            MenuId::QuizTime => "Please select the daily quiz time",
        }
    }
}

/// Callback payload of one settings button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSelector {
    pub level: u8,
    pub menu: MenuId,
    pub action: String,
}

impl SettingsSelector {
    pub fn new(menu: MenuId, action: impl Into<String>) -> Self {
        Self {
            level: menu.level(),
            menu,
            action: action.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            SELECTOR_PREFIX,
            self.level,
            self.menu.as_str(),
            self.action
        )
    }

    /// Parses callback data; the action may itself contain `:` (e.g. `09:00`)
    pub fn decode(data: &str) -> Result<Self, BotError> {
        let invalid = || BotError::InvalidSettingsSelector(data.to_string());

        let rest = data
            .strip_prefix(SELECTOR_PREFIX)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(invalid)?;

        let mut parts = rest.splitn(3, ':');
        let level = parts
            .next()
            .and_then(|l| l.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let menu = parts.next().and_then(MenuId::parse).ok_or_else(invalid)?;
        let action = parts.next().filter(|a| !a.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            level,
            menu,
            action: action.to_string(),
        })
    }

    pub fn is_settings_data(data: &str) -> bool {
        data.starts_with(SELECTOR_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub action: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub row_width: usize,
    pub choices: Vec<Choice>,
}

/// What a resolved selector asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    OpenMenu(MenuId),
    SetQuizLength(u32),
    Subscribe(NaiveTime),
    Unsubscribe,
}

pub struct SettingsMenu {
    menus: HashMap<MenuId, Menu>,
}

impl SettingsMenu {
    /// Builds the standard menus from the quiz options
    pub fn new(settings: &QuizSettings) -> Result<Self> {
        let mut menus = HashMap::new();

        menus.insert(
            MenuId::Main,
            Menu {
                row_width: 2,
                choices: vec![
                    Choice::new("Quiz length", MenuId::QuizLength.as_str()),
                    Choice::new("Daily quiz time", MenuId::QuizTime.as_str()),
                ],
            },
        );

        menus.insert(
            MenuId::QuizLength,
            Menu {
                row_width: 4,
                choices: settings
                    .length_options
                    .iter()
                    .map(|n| Choice::new(n.to_string(), n.to_string()))
                    .collect(),
            },
        );

        let mut time_choices: Vec<Choice> = settings
            .time_slots
            .iter()
            .map(|slot| Choice::new(format_slot(*slot), format_slot(*slot)))
            .collect();
        time_choices.push(Choice::new("Daily quiz OFF", UNSUBSCRIBE));
        menus.insert(
            MenuId::QuizTime,
            Menu {
                row_width: 4,
                choices: time_choices,
            },
        );

        Self::from_menus(menus)
    }

    /// Wraps a menu table after checking that every action resolves
    pub fn from_menus(menus: HashMap<MenuId, Menu>) -> Result<Self> {
        let table = Self { menus };

        if !table.menus.contains_key(&MenuId::Main) {
            return Err(anyhow!("Settings menu has no main menu"));
        }

        for (id, menu) in &table.menus {
            if menu.row_width == 0 {
                return Err(anyhow!("Menu '{}' has zero row width", id.as_str()));
            }
            if menu.choices.is_empty() {
                return Err(anyhow!("Menu '{}' has no choices", id.as_str()));
            }
            for choice in &menu.choices {
                let action = table.interpret(*id, &choice.action).ok_or_else(|| {
                    anyhow!(
                        "Menu '{}' has dangling action '{}'",
                        id.as_str(),
                        choice.action
                    )
                })?;
                if let SettingsAction::OpenMenu(target) = action {
                    if !table.menus.contains_key(&target) || target.level() != id.level() + 1 {
                        return Err(anyhow!(
                            "Menu '{}' points at missing submenu '{}'",
                            id.as_str(),
                            target.as_str()
                        ));
                    }
                }
            }
        }

        Ok(table)
    }

    /// Inline keyboard for `id`, `row_width` buttons per row
    pub fn keyboard(&self, id: MenuId) -> Option<Keyboard> {
        let menu = self.menus.get(&id)?;
        let rows = menu
            .choices
            .chunks(menu.row_width)
            .map(|row| {
                row.iter()
                    .map(|choice| InlineButton {
                        label: choice.label.clone(),
                        data: SettingsSelector::new(id, choice.action.clone()).encode(),
                    })
                    .collect()
            })
            .collect();
        Some(Keyboard::Inline(rows))
    }

    /// Checks a selector against the table and says what it asks for
    pub fn resolve(&self, selector: &SettingsSelector) -> Result<SettingsAction, BotError> {
        let invalid = || BotError::InvalidSettingsSelector(selector.encode());

        if selector.level != selector.menu.level() {
            return Err(invalid());
        }

        let menu = self.menus.get(&selector.menu).ok_or_else(invalid)?;
        if !menu.choices.iter().any(|c| c.action == selector.action) {
            return Err(invalid());
        }

        self.interpret(selector.menu, &selector.action)
            .ok_or_else(invalid)
    }

    fn interpret(&self, menu: MenuId, action: &str) -> Option<SettingsAction> {
        match menu {
            MenuId::Main => MenuId::parse(action)
                .filter(|target| *target != MenuId::Main)
                .map(SettingsAction::OpenMenu),
            MenuId::QuizLength => action
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(SettingsAction::SetQuizLength),
            MenuId::QuizTime if action == UNSUBSCRIBE => Some(SettingsAction::Unsubscribe),
            MenuId::QuizTime => parse_time_slot(action).ok().map(SettingsAction::Subscribe),
        }
    }
}
