use std::path::{Path, PathBuf};

use crate::canvas::DEFAULT_GRID_SIZE;
use crate::components::animation::DEFAULT_FRAME_MS;
use crate::components::history::DEFAULT_MAX_HISTORY;
use crate::io::MAX_GRID_DIM;

/// Editor settings that persist across sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSettings {
    /// Edge length of new projects' square grid
    pub grid_size: u32,
    /// Maximum number of undo steps
    pub max_undo_steps: usize,
    /// Duration given to newly captured frames (ms)
    pub default_frame_ms: u32,
    /// Per-frame palette size for GIF export (4-256)
    pub gif_max_colors: u16,
    pub project_path: PathBuf,
    pub png_export_path: PathBuf,
    pub gif_export_path: PathBuf,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_undo_steps: DEFAULT_MAX_HISTORY,
            default_frame_ms: DEFAULT_FRAME_MS,
            gif_max_colors: 256,
            project_path: PathBuf::from("pixel_project.json"),
            png_export_path: PathBuf::from("pixel_art.png"),
            gif_export_path: PathBuf::from("pixel_animation.gif"),
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelsmith/pixelsmith_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Pixelsmith\pixelsmith_settings.cfg
    /// On macOS:   ~/Library/Application Support/Pixelsmith/pixelsmith_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelsmith");
            return Some(config_dir.join("pixelsmith_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("Pixelsmith")
                    .join("pixelsmith_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Pixelsmith")
                    .join("pixelsmith_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("pixelsmith_settings.cfg")))
        }
    }

    /// Load from the default location (defaults if missing or unreadable).
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

    /// Parse `key=value` lines. Unknown keys are ignored and bad values keep
    /// their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "grid_size" => {
                    if let Ok(v) = val.parse::<u32>()
                        && (1..=MAX_GRID_DIM).contains(&v)
                    {
                        s.grid_size = v;
                    }
                }
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().unwrap_or(DEFAULT_MAX_HISTORY).max(1);
                }
                "default_frame_ms" => {
                    s.default_frame_ms = val.parse().unwrap_or(DEFAULT_FRAME_MS).max(1);
                }
                "gif_max_colors" => {
                    s.gif_max_colors = val.parse::<u16>().unwrap_or(256).clamp(4, 256);
                }
                "project_path" if !val.is_empty() => s.project_path = PathBuf::from(val),
                "png_export_path" if !val.is_empty() => s.png_export_path = PathBuf::from(val),
                "gif_export_path" if !val.is_empty() => s.gif_export_path = PathBuf::from(val),
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "grid_size={}\n\
             max_undo_steps={}\n\
             default_frame_ms={}\n\
             gif_max_colors={}\n\
             project_path={}\n\
             png_export_path={}\n\
             gif_export_path={}\n",
            self.grid_size,
            self.max_undo_steps,
            self.default_frame_ms,
            self.gif_max_colors,
            self.project_path.display(),
            self.png_export_path.display(),
            self.gif_export_path.display(),
        )
    }

    /// Write the settings file, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }
}
