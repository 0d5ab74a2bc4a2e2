//! Keyword callbacks sent by in-page libraries
//!
//! A callback names a browser action and an element locator written as
//! `strategy=value`, for example `id=username` or `xpath=//button[1]`.

use std::fmt;

use super::KeywordCallback;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("locator {0:?} has no strategy prefix")]
    MissingStrategy(String),

    #[error("unsupported locator strategy {0:?}")]
    UnknownStrategy(String),

    #[error("{keyword} callback is missing {field}")]
    MissingField { keyword: String, field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorStrategy {
    XPath,
    Css,
    Id,
}

impl LocatorStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Css => "css",
            LocatorStrategy::Id => "id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

impl Locator {
    /// Splits at the first `=`; the value may contain further `=`.
    pub fn parse(locator: &str) -> Result<Self, CallbackError> {
        let (strategy, value) = locator
            .split_once('=')
            .ok_or_else(|| CallbackError::MissingStrategy(locator.to_string()))?;

        let strategy = match strategy.trim() {
            "xpath" => LocatorStrategy::XPath,
            "css" => LocatorStrategy::Css,
            "id" => LocatorStrategy::Id,
            other => return Err(CallbackError::UnknownStrategy(other.to_string())),
        };

        Ok(Self {
            strategy,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordAction {
    OpenBrowser { url: String },
    TypeText { locator: Locator, text: String },
    Click { locator: Locator },
    GetText { locator: Locator },
    Unknown(String),
}

impl KeywordAction {
    pub fn from_callback(callback: &KeywordCallback) -> Result<Self, CallbackError> {
        let missing = |field| CallbackError::MissingField {
            keyword: callback.keyword.clone(),
            field,
        };

        let action = match callback.keyword.as_str() {
            "open_browser" => KeywordAction::OpenBrowser {
                url: callback.url.clone().ok_or_else(|| missing("url"))?,
            },
            "type_text" => KeywordAction::TypeText {
                locator: Locator::parse(&callback.locator)?,
                text: callback.text.clone().ok_or_else(|| missing("text"))?,
            },
            "click" => KeywordAction::Click {
                locator: Locator::parse(&callback.locator)?,
            },
            "get_text" => KeywordAction::GetText {
                locator: Locator::parse(&callback.locator)?,
            },
            other => KeywordAction::Unknown(other.to_string()),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback(keyword: &str, locator: &str) -> KeywordCallback {
        KeywordCallback {
            keyword: keyword.to_string(),
            locator: locator.to_string(),
            text: None,
            url: None,
        }
    }

    #[test]
    fn test_locator_splits_at_first_equals() {
        let locator = Locator::parse("xpath=//input[@name='a=b']").unwrap();
        assert_eq!(locator.strategy, LocatorStrategy::XPath);
        assert_eq!(locator.value, "//input[@name='a=b']");
        assert_eq!(locator.to_string(), "xpath=//input[@name='a=b']");
    }

    #[test]
    fn test_locator_errors() {
        assert_eq!(
            Locator::parse("username"),
            Err(CallbackError::MissingStrategy("username".to_string()))
        );
        assert_eq!(
            Locator::parse("name=user"),
            Err(CallbackError::UnknownStrategy("name".to_string()))
        );
    }

    #[test]
    fn test_actions_from_callbacks() {
        let mut type_text = callback("type_text", "id=user");
        type_text.text = Some("demo".to_string());
        assert_eq!(
            KeywordAction::from_callback(&type_text).unwrap(),
            KeywordAction::TypeText {
                locator: Locator {
                    strategy: LocatorStrategy::Id,
                    value: "user".to_string()
                },
                text: "demo".to_string(),
            }
        );

        let mut open = callback("open_browser", "");
        open.url = Some("https://example.org".to_string());
        assert!(matches!(
            KeywordAction::from_callback(&open),
            Ok(KeywordAction::OpenBrowser { .. })
        ));

        assert_eq!(
            KeywordAction::from_callback(&callback("scroll", "css=body")).unwrap(),
            KeywordAction::Unknown("scroll".to_string())
        );
    }

    #[test]
    fn test_missing_text_is_reported() {
        let error = KeywordAction::from_callback(&callback("type_text", "css=#q")).unwrap_err();
        assert_eq!(
            error,
            CallbackError::MissingField {
                keyword: "type_text".to_string(),
                field: "text"
            }
        );
    }
}
