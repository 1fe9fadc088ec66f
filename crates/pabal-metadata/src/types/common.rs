//! Common types shared across stores.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::MetadataError;

/// Locale used when a single-locale entry carries no locale of its own.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Supported stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Store {
    /// Apple App Store (App Store Connect).
    AppStore,
    /// Google Play Store.
    GooglePlay,
}

impl Store {
    /// Both stores, App Store first.
    pub const ALL: [Store; 2] = [Store::AppStore, Store::GooglePlay];

    /// Directory name used for this store in the local cache.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Store::AppStore => "app-store",
            Store::GooglePlay => "google-play",
        }
    }

    /// Identifier used in tool arguments and JSON payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Store::AppStore => "appStore",
            Store::GooglePlay => "googlePlay",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::AppStore => write!(f, "App Store"),
            Store::GooglePlay => write!(f, "Google Play"),
        }
    }
}

/// Behaviour shared by the per-store locale records.
pub trait LocaleEntry {
    /// Locale tag carried inside the record, if any.
    fn locale(&self) -> Option<&str>;

    /// Overwrites the locale tag carried inside the record.
    fn set_locale(&mut self, locale: &str);

    /// Removes every screenshot and graphic reference.
    fn strip_screenshots(&mut self);

    /// Screenshot groups as `(type, sources)` pairs, in a stable order.
    fn asset_groups(&self) -> Vec<(String, Vec<String>)>;
}

/// Locale records keyed by locale, with an optional default.
///
/// Always holds at least one locale. Keys are kept sorted so the effective
/// default, when none is set, is the lexicographically smallest locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Multilingual<T> {
    locales: BTreeMap<String, T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_locale: Option<String>,
}

impl<T> Multilingual<T> {
    /// Creates a multilingual set.
    ///
    /// # Errors
    ///
    /// Returns an error if `locales` is empty or `default_locale` is not one
    /// of its keys.
    pub fn new(
        locales: BTreeMap<String, T>,
        default_locale: Option<String>,
    ) -> Result<Self, MetadataError> {
        if locales.is_empty() {
            return Err(MetadataError::InvalidFormat(
                "Multilingual data must contain at least one locale".to_string(),
            ));
        }
        if let Some(default) = &default_locale {
            if !locales.contains_key(default) {
                return Err(MetadataError::InvalidFormat(format!(
                    "Default locale '{}' is not one of the provided locales",
                    default
                )));
            }
        }
        Ok(Self {
            locales,
            default_locale,
        })
    }

    /// Creates a set holding one locale, which is also the default.
    pub fn single(locale: impl Into<String>, value: T) -> Self {
        let locale = locale.into();
        let mut locales = BTreeMap::new();
        locales.insert(locale.clone(), value);
        Self {
            locales,
            default_locale: Some(locale),
        }
    }

    /// Effective default locale.
    pub fn default_locale(&self) -> &str {
        self.default_locale
            .as_deref()
            .or_else(|| self.locales.keys().next().map(String::as_str))
            .unwrap_or(DEFAULT_LOCALE)
    }

    /// Explicitly configured default locale.
    pub fn configured_default(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn locales(&self) -> &BTreeMap<String, T> {
        &self.locales
    }

    pub fn get(&self, locale: &str) -> Option<&T> {
        self.locales.get(locale)
    }

    /// Inserts or replaces the record for `locale`.
    pub fn insert(&mut self, locale: impl Into<String>, value: T) {
        self.locales.insert(locale.into(), value);
    }

    /// Mutable access to every record.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.locales.values_mut()
    }

    /// Sorted locale codes.
    pub fn locale_codes(&self) -> Vec<String> {
        self.locales.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.locales.iter()
    }
}

impl<T: LocaleEntry> Multilingual<T> {
    /// Sets every record's locale to its key; the key wins over any
    /// locale written inside the record.
    pub fn stamp_locales(&mut self) {
        for (locale, value) in self.locales.iter_mut() {
            if value.locale() != Some(locale.as_str()) {
                value.set_locale(locale);
            }
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Multilingual<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr<T> {
            locales: BTreeMap<String, T>,
            #[serde(default)]
            default_locale: Option<String>,
        }

        let repr = Repr::<T>::deserialize(deserializer)?;
        Multilingual::new(repr.locales, repr.default_locale).map_err(de::Error::custom)
    }
}

/// Either a bare locale record or a multilingual set.
///
/// The variant is chosen once at decode time: objects with a `locales` key
/// are multilingual, anything else is a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalizedSet<T> {
    Single(T),
    Multilingual(Multilingual<T>),
}

impl<T: LocaleEntry> LocalizedSet<T> {
    /// Converts to multilingual form.
    ///
    /// A single record is keyed by its own locale, or `en-US` when it has
    /// none, and that locale becomes the default.
    pub fn into_multilingual(self) -> Multilingual<T> {
        match self {
            LocalizedSet::Multilingual(mut set) => {
                set.stamp_locales();
                set
            }
            LocalizedSet::Single(mut value) => {
                let locale = value.locale().unwrap_or(DEFAULT_LOCALE).to_string();
                value.set_locale(&locale);
                Multilingual::single(locale, value)
            }
        }
    }

    /// Locale codes present in the set.
    pub fn locale_codes(&self) -> Vec<String> {
        match self {
            LocalizedSet::Multilingual(set) => set.locale_codes(),
            LocalizedSet::Single(value) => {
                vec![value.locale().unwrap_or(DEFAULT_LOCALE).to_string()]
            }
        }
    }
}

impl<T> From<Multilingual<T>> for LocalizedSet<T> {
    fn from(set: Multilingual<T>) -> Self {
        LocalizedSet::Multilingual(set)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LocalizedSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let multilingual = value
            .as_object()
            .is_some_and(|object| object.contains_key("locales"));

        if multilingual {
            serde_json::from_value(value)
                .map(LocalizedSet::Multilingual)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(LocalizedSet::Single)
                .map_err(de::Error::custom)
        }
    }
}
