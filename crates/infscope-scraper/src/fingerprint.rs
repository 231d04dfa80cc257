//! Randomized browser identities and the init script that backs them up.
//!
//! A [`SessionIdentity`] is generated per browser context and never mutated;
//! rotating to a new context always generates a new one.

use rand::seq::IndexedRandom;
use rand::Rng;

const VIEWPORTS: &[Viewport] = &[
    Viewport::new(1920, 1080),
    Viewport::new(1366, 768),
    Viewport::new(1536, 864),
    Viewport::new(1440, 900),
];

const TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "America/Phoenix",
];

const LOCALES: &[&str] = &["en-US", "en-GB", "en-CA", "en-AU"];

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0",
    "Windows NT 6.3",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 10_14_6",
];

const CHROME_VERSION: &str = "120.0.0.0";

/// New York City.
const DEFAULT_GEOLOCATION: Geolocation = Geolocation {
    latitude: 40.7128,
    longitude: -74.0060,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorScheme::Light => write!(f, "light"),
            ColorScheme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    pub viewport: Viewport,
    /// Outer window (screen) size, independent of the viewport pick.
    pub window: Viewport,
    pub locale: String,
    pub timezone: String,
    pub user_agent: String,
    /// OS token embedded in the user agent, e.g. `"Windows NT 10.0"`.
    pub platform: String,
    pub permissions: Vec<String>,
    pub geolocation: Geolocation,
    pub color_scheme: ColorScheme,
}

impl SessionIdentity {
    /// Value reported by `navigator.platform` for this identity.
    #[must_use]
    pub fn navigator_platform(&self) -> &'static str {
        if self.platform.starts_with("Macintosh") {
            "MacIntel"
        } else {
            "Win32"
        }
    }

    /// `navigator.languages`: the full locale followed by its primary subtag.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let mut langs = vec![self.locale.clone()];
        if let Some((primary, _)) = self.locale.split_once('-') {
            langs.push(primary.to_string());
        }
        langs
    }
}

/// Draws a fresh identity from the fixed pools.
#[must_use]
pub fn generate() -> SessionIdentity {
    let mut rng = rand::rng();
    let viewport = *VIEWPORTS.choose(&mut rng).unwrap_or(&VIEWPORTS[0]);
    let timezone = TIMEZONES.choose(&mut rng).unwrap_or(&TIMEZONES[0]);
    let locale = LOCALES.choose(&mut rng).unwrap_or(&LOCALES[0]);
    let platform = PLATFORMS.choose(&mut rng).unwrap_or(&PLATFORMS[0]);
    let window = Viewport::new(rng.random_range(1024..=1920), rng.random_range(768..=1080));

    SessionIdentity {
        viewport,
        window,
        locale: (*locale).to_string(),
        timezone: (*timezone).to_string(),
        user_agent: user_agent_for(platform),
        platform: (*platform).to_string(),
        permissions: vec!["geolocation".to_string()],
        geolocation: DEFAULT_GEOLOCATION,
        color_scheme: ColorScheme::Dark,
    }
}

fn user_agent_for(platform: &str) -> String {
    let os = if platform.starts_with("Windows") {
        format!("{platform}; Win64; x64")
    } else {
        platform.to_string()
    };
    format!(
        "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{CHROME_VERSION} Safari/537.36"
    )
}

/// Script installed on every new document before any page script runs.
#[must_use]
pub fn stealth_script(identity: &SessionIdentity) -> String {
    let languages = identity
        .languages()
        .iter()
        .map(|l| format!("'{l}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r"
        Object.defineProperty(navigator, 'webdriver', {{
            get: () => undefined,
            configurable: true
        }});
        Object.defineProperty(navigator, 'plugins', {{
            get: () => [1, 2, 3, 4, 5],
            configurable: true
        }});
        Object.defineProperty(navigator, 'languages', {{
            get: () => [{languages}],
            configurable: true
        }});
        Object.defineProperty(navigator, 'platform', {{
            get: () => '{platform}',
            configurable: true
        }});
        Object.defineProperty(navigator, 'hardwareConcurrency', {{
            get: () => 8,
            configurable: true
        }});
        navigator.getBattery = () => Promise.resolve({{
            charging: true,
            chargingTime: 0,
            dischargingTime: Infinity,
            level: 0.98
        }});
        ",
        platform = identity.navigator_platform(),
    )
}
