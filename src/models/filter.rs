//! Filter option structures.
//!
//! Each classification dimension is a closed enumeration; persisted options
//! that name an unknown key fail to deserialize instead of being ignored.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Purpose, Scope, Traffic};

/// A classification dimension usable in a flag group.
pub trait Category: Copy + Ord + Debug + Serialize + DeserializeOwned + 'static {
    /// Keys the user may switch.
    const SELECTABLE: &'static [Self];

    /// Keys that are always enabled regardless of the user's choice.
    fn is_pinned(self) -> bool {
        false
    }
}

impl Category for Traffic {
    const SELECTABLE: &'static [Self] = &[Traffic::Vfr, Traffic::Ifr];

    // Checklist notices are governed by scope only
    fn is_pinned(self) -> bool {
        self == Traffic::Checklist
    }
}

impl Category for Purpose {
    const SELECTABLE: &'static [Self] = &[
        Purpose::ImmediateAttention,
        Purpose::Bulletin,
        Purpose::Operations,
        Purpose::Miscellaneous,
    ];

    fn is_pinned(self) -> bool {
        self == Purpose::Checklist
    }
}

impl Category for Scope {
    const SELECTABLE: &'static [Self] = &[
        Scope::Aerodrome,
        Scope::Enroute,
        Scope::NavWarning,
        Scope::Checklist,
    ];
}

/// Boolean flags for one classification dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<C, bool>",
    into = "BTreeMap<C, bool>",
    bound = "C: Category"
)]
pub struct Flags<C: Category> {
    enabled: BTreeMap<C, bool>,
}

impl<C: Category> Flags<C> {
    /// Every selectable key enabled.
    pub fn all() -> Self {
        Self::uniform(true)
    }

    /// Every selectable key disabled.
    pub fn none() -> Self {
        Self::uniform(false)
    }

    fn uniform(value: bool) -> Self {
        Self {
            enabled: C::SELECTABLE.iter().map(|&c| (c, value)).collect(),
        }
    }

    /// Switch a single key.
    pub fn set(&mut self, category: C, value: bool) -> Result<()> {
        if category.is_pinned() {
            if value {
                return Ok(());
            }
            return Err(AppError::filter(format!(
                "{category:?} is always enabled and cannot be switched off"
            )));
        }
        self.enabled.insert(category, value);
        Ok(())
    }

    /// Builder style variant of [`Flags::set`].
    pub fn with(mut self, category: C, value: bool) -> Result<Self> {
        self.set(category, value)?;
        Ok(self)
    }

    pub fn is_enabled(&self, category: C) -> bool {
        category.is_pinned() || self.enabled.get(&category).copied().unwrap_or(false)
    }

    /// True iff some enabled key is contained in `values`.
    ///
    /// An empty `values` list never matches.
    pub fn any_match(&self, values: &[C]) -> bool {
        values.iter().any(|&value| self.is_enabled(value))
    }
}

impl<C: Category> Default for Flags<C> {
    fn default() -> Self {
        Self::all()
    }
}

impl<C: Category> TryFrom<BTreeMap<C, bool>> for Flags<C> {
    type Error = AppError;

    fn try_from(map: BTreeMap<C, bool>) -> Result<Self> {
        let mut flags = Self::none();
        for (category, value) in map {
            flags.set(category, value)?;
        }
        Ok(flags)
    }
}

impl<C: Category> From<Flags<C>> for BTreeMap<C, bool> {
    fn from(flags: Flags<C>) -> Self {
        flags.enabled
    }
}

/// Date range options. Carried for UI state; the predicate does not read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DateOptions {
    /// Preset day count
    #[serde(default = "defaults::days")]
    pub days: u32,
    /// Custom range start
    #[serde(default)]
    pub from: String,
    /// Custom range end
    #[serde(default)]
    pub to: String,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            days: defaults::days(),
            from: String::new(),
            to: String::new(),
        }
    }
}

/// A subject-code category prefix (one or two uppercase letters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodePrefix(String);

impl CodePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let valid = (1..=2).contains(&prefix.len())
            && prefix.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(AppError::filter(format!(
                "subject code prefix '{prefix}' must be one or two uppercase letters"
            )));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CodePrefix {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CodePrefix> for String {
    fn from(prefix: CodePrefix) -> Self {
        prefix.0
    }
}

/// The complete set of user filter options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct FilterOptions {
    #[serde(default)]
    pub traffic: Flags<Traffic>,

    #[serde(default)]
    pub purpose: Flags<Purpose>,

    #[serde(default)]
    pub scope: Flags<Scope>,

    /// Enabled subject-code category prefixes
    #[serde(default)]
    pub qcodes: Vec<CodePrefix>,

    #[serde(default)]
    pub date: DateOptions,
}

impl FilterOptions {
    /// Everything enabled, with the given subject-code prefixes.
    pub fn with_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let qcodes = codes
            .into_iter()
            .map(CodePrefix::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            traffic: Flags::all(),
            purpose: Flags::all(),
            scope: Flags::all(),
            qcodes,
            date: DateOptions::default(),
        })
    }

    /// Enable or disable a group of prefixes at once, without duplicates.
    pub fn set_codes(&mut self, codes: &[CodePrefix], enabled: bool) {
        if enabled {
            for code in codes {
                if !self.qcodes.contains(code) {
                    self.qcodes.push(code.clone());
                }
            }
        } else {
            self.qcodes.retain(|c| !codes.contains(c));
        }
    }

    /// Whether `segment` starts with any enabled prefix.
    pub fn code_enabled(&self, segment: &str) -> bool {
        self.qcodes.iter().any(|p| segment.starts_with(p.as_str()))
    }
}

mod defaults {
    pub fn days() -> u32 {
        7
    }
}
