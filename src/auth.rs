/// How many leading characters of a key are shown in status output.
const PREVIEW_LEN: usize = 16;

/// An opaque PipelineIQ API key.
///
/// The `piq_live_` prefix convention is advisory; no format validation
/// happens here.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form for status display: the first 16 characters, then `...`.
    pub fn preview(&self) -> String {
        let visible: String = self.0.chars().take(PREVIEW_LEN).collect();
        format!("{visible}...")
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_from_str() {
        let key = ApiKey::from("piq_live_1234567890abcdef");

        assert_eq!(key.as_str(), "piq_live_1234567890abcdef");
    }

    #[test]
    fn test_api_key_debug_redacts_value() {
        let key = ApiKey::from("piq_live_very_secret_do_not_log");

        let debug_output = format!("{key:?}");

        assert_eq!(debug_output, "<redacted>");
        assert!(!debug_output.contains("piq_live_"));
        assert!(!debug_output.contains("secret"));
    }

    #[test]
    fn test_api_key_debug_does_not_expose_empty_key() {
        let key = ApiKey::from("");

        assert_eq!(format!("{key:?}"), "<redacted>");
    }

    #[test]
    fn test_api_key_preview_masks_tail() {
        let key = ApiKey::from("piq_live_abcdefghijklmnopqrstuvwxyz");

        assert_eq!(key.preview(), "piq_live_abcdefg...");
    }

    #[test]
    fn test_api_key_preview_short_key() {
        let key = ApiKey::from("piq");

        assert_eq!(key.preview(), "piq...");
    }

    #[test]
    fn test_api_key_debug_in_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Gateway {
            key: ApiKey,
            endpoint: String,
        }

        let gateway = Gateway {
            key: ApiKey::from("piq_live_super_secret"),
            endpoint: String::from("https://api.example.com"),
        };

        let debug_output = format!("{gateway:?}");

        assert!(debug_output.contains("<redacted>"));
        assert!(!debug_output.contains("super_secret"));
        assert!(debug_output.contains("https://api.example.com"));
    }
}
