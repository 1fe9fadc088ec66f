//! Utility functions for ASO metadata.
//!
//! Locale handling shared by pull, push and release-notes flows, and small
//! helpers for screenshot sources.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Matches sources that carry a URL scheme (`https://`, `file://`, ...).
static URL_SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("Invalid regex"));

/// Width substituted into App Store screenshot templates.
pub const APP_STORE_IMAGE_WIDTH: u32 = 2048;
/// Height substituted into App Store screenshot templates.
pub const APP_STORE_IMAGE_HEIGHT: u32 = 2732;

/// App Store locale paired with the Google Play locale for the same market,
/// where the two stores use different tags.
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("ar", "ar"),
    ("ca", "ca"),
    ("cs", "cs-CZ"),
    ("da", "da-DK"),
    ("de-DE", "de-DE"),
    ("el", "el-GR"),
    ("es-MX", "es-419"),
    ("fi", "fi-FI"),
    ("he", "iw-IL"),
    ("hi", "hi-IN"),
    ("hu", "hu-HU"),
    ("id", "id"),
    ("ja", "ja-JP"),
    ("ko", "ko-KR"),
    ("ms", "ms"),
    ("nl-NL", "nl-NL"),
    ("no", "no-NO"),
    ("pl", "pl-PL"),
    ("ru", "ru-RU"),
    ("sv", "sv-SE"),
    ("th", "th"),
    ("tr", "tr-TR"),
    ("uk", "uk"),
    ("vi", "vi"),
    ("zh-Hans", "zh-CN"),
    ("zh-Hant", "zh-TW"),
];

/// Whether an asset source refers to a local file rather than a URL.
///
/// # Example
///
/// ```rust
/// use pabal_metadata::utils::is_local_asset_path;
///
/// assert!(is_local_asset_path("./assets/a.png"));
/// assert!(!is_local_asset_path("https://example.com/a.png"));
/// ```
pub fn is_local_asset_path(source: &str) -> bool {
    !URL_SCHEME_REGEX.is_match(source.trim())
}

/// Resolves an App Store image template URL to a concrete 2048x2732 png.
///
/// URLs without `{w}`, `{h}` or `{f}` placeholders are returned unchanged.
pub fn resolve_app_store_image_url(template: &str) -> String {
    template
        .replace("{w}", &APP_STORE_IMAGE_WIDTH.to_string())
        .replace("{h}", &APP_STORE_IMAGE_HEIGHT.to_string())
        .replace("{f}", "png")
}

/// Merges two locale lists into a sorted, deduplicated list.
pub fn merge_locales<S: AsRef<str>>(existing: &[S], incoming: &[S]) -> Vec<String> {
    existing
        .iter()
        .chain(incoming.iter())
        .map(|locale| locale.as_ref().trim())
        .filter(|locale| !locale.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Normalize a locale code to standard format.
///
/// Accepts `_` or `-` separators. The language is lowercased, four-letter
/// script subtags are title-cased and anything else is uppercased.
///
/// ```rust
/// use pabal_metadata::utils::normalize_locale;
///
/// assert_eq!(normalize_locale("en_us"), "en-US");
/// assert_eq!(normalize_locale("zh-hans"), "zh-Hans");
/// assert_eq!(normalize_locale("es-419"), "es-419");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    let normalized = locale.trim().replace('_', "-");
    let mut parts = normalized.split('-').filter(|part| !part.is_empty());

    let Some(language) = parts.next() else {
        return String::new();
    };

    let mut result = language.to_lowercase();
    for part in parts {
        result.push('-');
        if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                result.push(first.to_ascii_uppercase());
                result.push_str(&chars.as_str().to_ascii_lowercase());
            }
        } else {
            result.push_str(&part.to_uppercase());
        }
    }
    result
}

/// Language subtag of a locale (`ko-KR` -> `ko`).
pub fn locale_language(locale: &str) -> String {
    let language = locale.split(['-', '_']).next().unwrap_or(locale).to_lowercase();
    // Google Play still uses the legacy code for Hebrew.
    if language == "iw" {
        "he".to_string()
    } else {
        language
    }
}

/// Whether two locales belong to the same language.
pub fn same_language(a: &str, b: &str) -> bool {
    locale_language(a) == locale_language(b)
}

/// Google Play tag for an App Store locale.
pub fn to_google_play_locale(locale: &str) -> String {
    LOCALE_ALIASES
        .iter()
        .find(|(app_store, _)| app_store.eq_ignore_ascii_case(locale))
        .map(|(_, google_play)| google_play.to_string())
        .unwrap_or_else(|| locale.to_string())
}

/// App Store tag for a Google Play locale.
pub fn to_app_store_locale(locale: &str) -> String {
    LOCALE_ALIASES
        .iter()
        .find(|(_, google_play)| google_play.eq_ignore_ascii_case(locale))
        .map(|(app_store, _)| app_store.to_string())
        .unwrap_or_else(|| locale.to_string())
}

/// Looks up text for `locale` in a locale map.
///
/// Tries an exact match, then the other store's alias, then a bare language
/// tag standing in for a regional one (`ko` for `ko-KR` and the reverse).
/// Two different regions or scripts never match: `zh-Hans` is not text for
/// `zh-Hant` and `pt-BR` is not text for `pt-PT`.
pub fn resolve_locale_text<'a, I>(texts: I, locale: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a String, &'a String)> + Clone,
{
    let exact = texts
        .clone()
        .into_iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(locale));
    if let Some((_, text)) = exact {
        return Some(text.as_str());
    }

    let aliases = [to_google_play_locale(locale), to_app_store_locale(locale)];
    let aliased = texts.clone().into_iter().find(|(candidate, _)| {
        aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(candidate))
    });
    if let Some((_, text)) = aliased {
        return Some(text.as_str());
    }

    texts
        .into_iter()
        .find(|(candidate, _)| {
            same_language(candidate, locale)
                && (is_bare_language(candidate) || is_bare_language(locale))
        })
        .map(|(_, text)| text.as_str())
}

fn is_bare_language(locale: &str) -> bool {
    !locale.trim().contains(['-', '_'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_is_local_asset_path() {
        assert!(!is_local_asset_path("https://x/y.png"));
        assert!(!is_local_asset_path("http://x/y.png"));
        assert!(!is_local_asset_path("file:///tmp/y.png"));
        assert!(is_local_asset_path("./assets/a.png"));
        assert!(is_local_asset_path("/abs/path/a.png"));
        assert!(is_local_asset_path("C:\\shots\\a.png"));
    }

    #[test]
    fn test_resolve_app_store_image_url() {
        assert_eq!(
            resolve_app_store_image_url("https://is1.mzstatic.com/image/{w}x{h}bb.{f}"),
            "https://is1.mzstatic.com/image/2048x2732bb.png"
        );
        assert_eq!(
            resolve_app_store_image_url("https://example.com/a.jpg"),
            "https://example.com/a.jpg"
        );
    }

    #[test]
    fn test_merge_locales() {
        let merged = merge_locales(&["ko", "ja"], &["en-US", "ko"]);
        assert_eq!(merged, vec!["en-US", "ja", "ko"]);

        let empty: [&str; 0] = [];
        assert_eq!(merge_locales(&empty, &["", " fr "]), vec!["fr"]);
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("EN-us"), "en-US");
        assert_eq!(normalize_locale("de"), "de");
        assert_eq!(normalize_locale("zh_HANT"), "zh-Hant");
        assert_eq!(normalize_locale(""), "");
    }

    #[test]
    fn test_locale_aliases() {
        assert_eq!(to_google_play_locale("ko"), "ko-KR");
        assert_eq!(to_google_play_locale("zh-Hans"), "zh-CN");
        assert_eq!(to_google_play_locale("en-US"), "en-US");
        assert_eq!(to_app_store_locale("iw-IL"), "he");
        assert_eq!(to_app_store_locale("ja-JP"), "ja");
        assert!(same_language("he", "iw-IL"));
        assert!(!same_language("pt-BR", "es-ES"));
    }

    #[test]
    fn test_resolve_locale_text() {
        let mut texts = BTreeMap::new();
        texts.insert("en-US".to_string(), "Fixes".to_string());
        texts.insert("ko".to_string(), "수정".to_string());
        texts.insert("zh-Hans".to_string(), "修复".to_string());

        assert_eq!(resolve_locale_text(&texts, "en-US"), Some("Fixes"));
        assert_eq!(resolve_locale_text(&texts, "ko-KR"), Some("수정"));
        assert_eq!(resolve_locale_text(&texts, "zh-CN"), Some("修复"));
        assert_eq!(resolve_locale_text(&texts, "ko-KP"), Some("수정"));
        assert_eq!(resolve_locale_text(&texts, "en"), Some("Fixes"));
        assert_eq!(resolve_locale_text(&texts, "fr-FR"), None);
    }

    #[test]
    fn test_resolve_locale_text_keeps_regions_and_scripts_apart() {
        let texts = BTreeMap::from([
            ("zh-Hans".to_string(), "简体".to_string()),
            ("pt-BR".to_string(), "Correções".to_string()),
            ("es-MX".to_string(), "Correcciones".to_string()),
            ("en-US".to_string(), "Fixes".to_string()),
        ]);

        assert_eq!(resolve_locale_text(&texts, "zh-Hant"), None);
        assert_eq!(resolve_locale_text(&texts, "zh-TW"), None);
        assert_eq!(resolve_locale_text(&texts, "pt-PT"), None);
        assert_eq!(resolve_locale_text(&texts, "es-ES"), None);
        assert_eq!(resolve_locale_text(&texts, "en-GB"), None);
        assert_eq!(resolve_locale_text(&texts, "zh-CN"), Some("简体"));
        assert_eq!(resolve_locale_text(&texts, "pt"), Some("Correções"));
    }
}
