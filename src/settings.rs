use std::path::{Path, PathBuf};

use crate::document::MAX_CANVAS_DIM;

/// User settings that persist across runs
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Write a session log file
    pub session_log: bool,
    /// Canvas width for `buildstep new`
    pub new_width: u32,
    /// Canvas height for `buildstep new`
    pub new_height: u32,
    /// Write `<document>.png` next to the document after each navigation
    pub preview_after_step: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_log: true,
            new_width: 640,
            new_height: 480,
            preview_after_step: false,
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/buildstep/buildstep_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\buildstep\buildstep_settings.cfg
    /// On macOS:   ~/Library/Application Support/buildstep/buildstep_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("buildstep").join("buildstep_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("buildstep")
                    .join("buildstep_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("buildstep").join("buildstep_settings.cfg"))
        }
    }

    /// Load settings from the default location (defaults if missing or unreadable)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse `key=value` lines. Unknown keys and bad values keep the default.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let _ = s.apply_pair(key, val);
        }
        s
    }

    /// Set one setting from its file form. The setting is left as it was
    /// when the key is unknown or the value does not fit it.
    pub fn apply_pair(&mut self, key: &str, val: &str) -> Result<(), String> {
        let val = val.trim();
        match key.trim() {
            "session_log" => self.session_log = parse_bool(val)?,
            "new_width" => self.new_width = parse_dim(val)?,
            "new_height" => self.new_height = parse_dim(val)?,
            "preview_after_step" => self.preview_after_step = parse_bool(val)?,
            other => return Err(format!("unknown setting '{}'", other)),
        }
        Ok(())
    }

    /// File form: one `key=value` line per setting.
    pub fn to_cfg(&self) -> String {
        format!(
            "session_log={}\n\
             new_width={}\n\
             new_height={}\n\
             preview_after_step={}\n",
            self.session_log, self.new_width, self.new_height, self.preview_after_step,
        )
    }

    /// Save settings to the default location
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::settings_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no settings directory")
        })?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating the parent directory
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_cfg())
    }
}

fn parse_bool(val: &str) -> Result<bool, String> {
    match val {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("expected true or false, got '{}'", val)),
    }
}

fn parse_dim(val: &str) -> Result<u32, String> {
    match val.parse::<u32>() {
        Ok(n) if (1..=MAX_CANVAS_DIM).contains(&n) => Ok(n),
        _ => Err(format!("expected a size from 1 to {}, got '{}'", MAX_CANVAS_DIM, val)),
    }
}
