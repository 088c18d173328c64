// Platform capability flags consulted by the editor.

use serde::{Deserialize, Serialize};

/// What the field needs to know about the platform it runs on.
///
/// `gecko` and `webkit` select small pixel corrections when positioning the
/// overlay; `mobile`, `android` and `ipad` route editing through a modal
/// prompt instead of the inline overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserAgent {
    pub mobile: bool,
    pub android: bool,
    pub ipad: bool,
    pub gecko: bool,
    pub webkit: bool,
}

impl UserAgent {
    /// Flags for the platform this binary was compiled for.
    pub fn detect() -> Self {
        UserAgent {
            mobile: cfg!(any(target_os = "android", target_os = "ios")),
            android: cfg!(target_os = "android"),
            ipad: false,
            gecko: false,
            webkit: false,
        }
    }

    /// Apply the overrides set in the configuration file.
    pub fn with_overrides(mut self, overrides: &PlatformOverrides) -> Self {
        if let Some(v) = overrides.mobile {
            self.mobile = v;
        }
        if let Some(v) = overrides.android {
            self.android = v;
        }
        if let Some(v) = overrides.ipad {
            self.ipad = v;
        }
        if let Some(v) = overrides.gecko {
            self.gecko = v;
        }
        if let Some(v) = overrides.webkit {
            self.webkit = v;
        }
        self
    }

    /// Touch platforms have trouble with inline text areas (focus and
    /// on-screen keyboards), so they edit through a prompt.
    pub fn needs_prompt_editor(&self) -> bool {
        self.mobile || self.android || self.ipad
    }
}

/// Optional per-flag overrides read from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOverrides {
    pub mobile: Option<bool>,
    pub android: Option<bool>,
    pub ipad: Option<bool>,
    pub gecko: Option<bool>,
    pub webkit: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let ua = UserAgent::default().with_overrides(&PlatformOverrides {
            ipad: Some(true),
            webkit: Some(true),
            ..Default::default()
        });
        assert!(ua.ipad);
        assert!(ua.webkit);
        assert!(!ua.gecko);
        assert!(ua.needs_prompt_editor());
    }

    #[test]
    fn test_desktop_uses_inline_editor() {
        assert!(!UserAgent::default().needs_prompt_editor());
    }
}
