//! Category registry.
//!
//! Every cleanup category is one row of [`CATEGORIES`]: a key used on the
//! command line and in config files, a display label, and a resolver that
//! turns a [`PathSource`] into the concrete targets for the current platform.
//! Resolvers return an empty list whenever a path cannot be determined.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::paths::{PathSource, Platform};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Prefetch and OS logs are only removed once they are this old.
pub const LOG_MAX_AGE: Duration = Duration::from_secs(30 * DAY.as_secs());

/// Cache subdirectories inside every Chromium profile.
const CHROMIUM_CACHE_DIRS: &[&str] = &["Cache", "Code Cache", "GPUCache", "Service Worker", "ShaderCache"];

/// Explorer cache files are named `thumbcache_*.db` / `iconcache_*.db`.
const EXPLORER_CACHE_PREFIXES: &[&str] = &["thumbcache_", "iconcache_"];

/// One independently toggleable cleanup unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    // System
    WindowsTemp,
    UserTemp,
    WindowsUpdate,
    WindowsInstaller,
    Prefetch,
    CrashDumps,
    ErrorReports,
    ThumbnailCache,
    IconCache,
    FontCache,
    ShaderCache,
    DnsCache,
    WindowsLogs,
    EventLogs,
    DeliveryOptimization,
    RecycleBin,

    // Applications
    ChromeCache,
    FirefoxCache,
    EdgeCache,
    BraveCache,
    OperaCache,
    DiscordCache,
    SpotifyCache,
    SteamCache,
    TeamsCache,
    #[serde(rename = "vscode-cache")]
    VsCodeCache,
    JavaCache,
}

/// Something a category acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Sweep a directory tree; `max_age` of zero means every file.
    Dir { path: PathBuf, max_age: Duration },
    /// Remove one file.
    File(PathBuf),
    /// Run a system command. Never executed in dry-run.
    Command {
        program: &'static str,
        args: &'static [&'static str],
    },
}

impl Target {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Target::Dir {
            path: path.into(),
            max_age: Duration::ZERO,
        }
    }

    pub fn aged(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Target::Dir {
            path: path.into(),
            max_age,
        }
    }
}

/// Static description of a category.
pub struct CategoryDef {
    pub category: Category,
    pub key: &'static str,
    pub label: &'static str,
    pub resolve: fn(&dyn PathSource) -> Vec<Target>,
}

impl fmt::Debug for CategoryDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .finish()
    }
}

macro_rules! category {
    ($variant:ident, $key:literal, $label:literal, $resolve:ident) => {
        CategoryDef {
            category: Category::$variant,
            key: $key,
            label: $label,
            resolve: $resolve,
        }
    };
}

/// All categories, in declaration order of [`Category`].
pub static CATEGORIES: &[CategoryDef] = &[
    category!(WindowsTemp, "windows-temp", "Windows Temp", windows_temp),
    category!(UserTemp, "user-temp", "User Temp", user_temp),
    category!(WindowsUpdate, "windows-update", "Windows Update Cache", windows_update),
    category!(WindowsInstaller, "windows-installer", "Windows Installer Cache", windows_installer),
    category!(Prefetch, "prefetch", "Prefetch", prefetch),
    category!(CrashDumps, "crash-dumps", "Crash Dumps", crash_dumps),
    category!(ErrorReports, "error-reports", "Error Reports", error_reports),
    category!(ThumbnailCache, "thumbnail-cache", "Thumbnail Cache", thumbnail_cache),
    category!(IconCache, "icon-cache", "Icon Cache", icon_cache),
    category!(FontCache, "font-cache", "Font Cache", font_cache),
    category!(ShaderCache, "shader-cache", "Shader Cache", shader_cache),
    category!(DnsCache, "dns-cache", "DNS Cache", dns_cache),
    category!(WindowsLogs, "windows-logs", "Windows Log Files", windows_logs),
    category!(EventLogs, "event-logs", "Event Logs", event_logs),
    category!(DeliveryOptimization, "delivery-optimization", "Delivery Optimization", delivery_optimization),
    category!(RecycleBin, "recycle-bin", "Recycle Bin", recycle_bin),
    category!(ChromeCache, "chrome-cache", "Chrome Cache", chrome_cache),
    category!(FirefoxCache, "firefox-cache", "Firefox Cache", firefox_cache),
    category!(EdgeCache, "edge-cache", "Edge Cache", edge_cache),
    category!(BraveCache, "brave-cache", "Brave Cache", brave_cache),
    category!(OperaCache, "opera-cache", "Opera Cache", opera_cache),
    category!(DiscordCache, "discord-cache", "Discord Cache", discord_cache),
    category!(SpotifyCache, "spotify-cache", "Spotify Cache", spotify_cache),
    category!(SteamCache, "steam-cache", "Steam Cache", steam_cache),
    category!(TeamsCache, "teams-cache", "Teams Cache", teams_cache),
    category!(VsCodeCache, "vscode-cache", "VS Code Cache", vscode_cache),
    category!(JavaCache, "java-cache", "Java Cache", java_cache),
];

impl Category {
    /// Every category, in table order.
    pub fn all() -> impl Iterator<Item = Category> {
        CATEGORIES.iter().map(|def| def.category)
    }

    pub fn def(self) -> &'static CategoryDef {
        &CATEGORIES[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.def().key
    }

    pub fn label(self) -> &'static str {
        self.def().label
    }

    /// Concrete targets for this category on the given environment.
    pub fn targets(self, paths: &dyn PathSource) -> Vec<Target> {
        (self.def().resolve)(paths)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        CATEGORIES
            .iter()
            .find(|def| def.key == wanted)
            .map(|def| def.category)
            .ok_or_else(|| format!("unknown category '{s}' (see `reclaim list`)"))
    }
}

// ---------------------------------------------------------------------------
// Resolver helpers
// ---------------------------------------------------------------------------

/// Environment variable, but only when running the Windows table.
fn win_var(paths: &dyn PathSource, key: &str) -> Option<PathBuf> {
    if paths.platform() == Platform::Windows {
        paths.var(key)
    } else {
        None
    }
}

fn join(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |p, part| p.join(part))
}

fn dirs_under(base: Option<PathBuf>, children: &[&[&str]]) -> Vec<Target> {
    match base {
        Some(base) => children.iter().map(|c| Target::dir(join(&base, c))).collect(),
        None => Vec::new(),
    }
}

fn dedup(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for p in paths {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Immediate subdirectories of `dir` whose name passes `keep`.
fn subdirs(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = read_dir
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| keep(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    found.sort();
    found
}

/// Cache directories of every profile under a Chromium user-data directory.
pub fn chromium_profiles(user_data: &Path) -> Vec<Target> {
    subdirs(user_data, |name| name == "Default" || name.starts_with("Profile "))
        .into_iter()
        .flat_map(|profile| {
            CHROMIUM_CACHE_DIRS
                .iter()
                .map(move |sub| Target::dir(profile.join(sub)))
        })
        .collect()
}

/// `cache2` and `startupCache` of every Firefox profile under `profiles`.
fn firefox_profiles(profiles: &Path) -> Vec<Target> {
    subdirs(profiles, |_| true)
        .into_iter()
        .flat_map(|profile| {
            [Target::dir(profile.join("cache2")), Target::dir(profile.join("startupCache"))]
        })
        .collect()
}

/// Chromium user-data root for a browser, per platform.
fn chromium_root(paths: &dyn PathSource, windows: &[&str], linux: &[&str], macos: &[&str]) -> Vec<Target> {
    let root = match paths.platform() {
        Platform::Windows => paths.var("LOCALAPPDATA").map(|b| join(&b, windows)),
        Platform::Linux => paths.cache_dir().map(|b| join(&b, linux)),
        Platform::MacOs => paths.cache_dir().map(|b| join(&b, macos)),
        Platform::Other => None,
    };
    root.map(|r| chromium_profiles(&r)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// System categories
// ---------------------------------------------------------------------------

fn windows_temp(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(win_var(paths, "WINDIR"), &[&["Temp"]])
}

fn user_temp(paths: &dyn PathSource) -> Vec<Target> {
    let mut candidates: Vec<PathBuf> = ["TEMP", "TMP"].iter().filter_map(|k| paths.var(k)).collect();
    match paths.platform() {
        Platform::Windows => {
            if let Some(local) = paths.var("LOCALAPPDATA") {
                candidates.push(local.join("Temp"));
            }
        }
        p if p.is_unix() => candidates.extend(paths.var("TMPDIR")),
        _ => {}
    }
    dedup(candidates).into_iter().map(Target::dir).collect()
}

fn windows_update(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(win_var(paths, "WINDIR"), &[&["SoftwareDistribution", "Download"]])
}

fn windows_installer(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(win_var(paths, "WINDIR"), &[&["Installer", "$PatchCache$"]])
}

fn prefetch(paths: &dyn PathSource) -> Vec<Target> {
    win_var(paths, "WINDIR")
        .map(|w| vec![Target::aged(w.join("Prefetch"), LOG_MAX_AGE)])
        .unwrap_or_default()
}

fn crash_dumps(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => {
            let mut targets = dirs_under(paths.var("LOCALAPPDATA"), &[&["CrashDumps"]]);
            if let Some(win) = paths.var("WINDIR") {
                targets.push(Target::dir(win.join("Minidump")));
                targets.push(Target::File(win.join("MEMORY.DMP")));
            }
            targets
        }
        Platform::MacOs => dirs_under(paths.home_dir(), &[&["Library", "Logs", "DiagnosticReports"]]),
        _ => Vec::new(),
    }
}

fn error_reports(paths: &dyn PathSource) -> Vec<Target> {
    let wer: &[&str] = &["Microsoft", "Windows", "WER"];
    let mut targets = dirs_under(win_var(paths, "LOCALAPPDATA"), &[wer]);
    targets.extend(dirs_under(win_var(paths, "ProgramData"), &[wer]));
    targets
}

fn thumbnail_cache(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => {
            let Some(local) = paths.var("LOCALAPPDATA") else {
                return Vec::new();
            };
            let explorer = join(&local, &["Microsoft", "Windows", "Explorer"]);
            let Ok(read_dir) = fs::read_dir(&explorer) else {
                return Vec::new();
            };
            let mut files: Vec<PathBuf> = read_dir
                .flatten()
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter(|e| {
                    let name = e.file_name().to_string_lossy().to_lowercase();
                    EXPLORER_CACHE_PREFIXES.iter().any(|p| name.starts_with(p))
                })
                .map(|e| e.path())
                .collect();
            files.sort();
            files.into_iter().map(Target::File).collect()
        }
        Platform::Linux => dirs_under(paths.cache_dir(), &[&["thumbnails"]]),
        _ => Vec::new(),
    }
}

fn icon_cache(paths: &dyn PathSource) -> Vec<Target> {
    win_var(paths, "LOCALAPPDATA")
        .map(|l| vec![Target::File(l.join("IconCache.db"))])
        .unwrap_or_default()
}

fn font_cache(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => dirs_under(
            paths.var("WINDIR"),
            &[&["ServiceProfiles", "LocalService", "AppData", "Local", "FontCache"]],
        ),
        Platform::Linux => dirs_under(paths.cache_dir(), &[&["fontconfig"]]),
        _ => Vec::new(),
    }
}

fn shader_cache(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => dirs_under(
            paths.var("LOCALAPPDATA"),
            &[
                &["D3DSCache"],
                &["NVIDIA", "DXCache"],
                &["NVIDIA", "GLCache"],
                &["AMD", "DxCache"],
            ],
        ),
        Platform::Linux => dirs_under(
            paths.cache_dir(),
            &[&["mesa_shader_cache"], &["nvidia", "GLCache"]],
        ),
        _ => Vec::new(),
    }
}

fn dns_cache(paths: &dyn PathSource) -> Vec<Target> {
    if paths.platform() != Platform::Windows {
        return Vec::new();
    }
    vec![Target::Command {
        program: "ipconfig",
        args: &["/flushdns"],
    }]
}

fn windows_logs(paths: &dyn PathSource) -> Vec<Target> {
    let Some(win) = win_var(paths, "WINDIR") else {
        return Vec::new();
    };
    ["Logs", "Debug", "Panther"]
        .iter()
        .map(|d| Target::aged(win.join(d), LOG_MAX_AGE))
        .collect()
}

fn event_logs(paths: &dyn PathSource) -> Vec<Target> {
    if paths.platform() != Platform::Windows {
        return Vec::new();
    }
    // The Security channel is left alone: clearing it trips AV heuristics
    vec![
        Target::Command {
            program: "wevtutil",
            args: &["cl", "System"],
        },
        Target::Command {
            program: "wevtutil",
            args: &["cl", "Application"],
        },
    ]
}

fn delivery_optimization(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(
        win_var(paths, "WINDIR"),
        &[&["SoftwareDistribution", "DeliveryOptimization"]],
    )
}

fn recycle_bin(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => vec![Target::Command {
            program: "powershell",
            args: &[
                "-NoProfile",
                "-Command",
                "Clear-RecycleBin -Force -ErrorAction SilentlyContinue",
            ],
        }],
        Platform::Linux => dirs_under(
            paths.home_dir(),
            &[
                &[".local", "share", "Trash", "files"],
                &[".local", "share", "Trash", "info"],
            ],
        ),
        Platform::MacOs => dirs_under(paths.home_dir(), &[&[".Trash"]]),
        Platform::Other => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Application categories
// ---------------------------------------------------------------------------

fn chrome_cache(paths: &dyn PathSource) -> Vec<Target> {
    chromium_root(
        paths,
        &["Google", "Chrome", "User Data"],
        &["google-chrome"],
        &["Google", "Chrome"],
    )
}

fn firefox_cache(paths: &dyn PathSource) -> Vec<Target> {
    let profiles = match paths.platform() {
        Platform::Windows => paths.var("APPDATA").map(|a| join(&a, &["Mozilla", "Firefox", "Profiles"])),
        Platform::Linux => paths.cache_dir().map(|c| join(&c, &["mozilla", "firefox"])),
        Platform::MacOs => paths.cache_dir().map(|c| join(&c, &["Firefox", "Profiles"])),
        Platform::Other => None,
    };
    profiles.map(|p| firefox_profiles(&p)).unwrap_or_default()
}

fn edge_cache(paths: &dyn PathSource) -> Vec<Target> {
    chromium_root(
        paths,
        &["Microsoft", "Edge", "User Data"],
        &["microsoft-edge"],
        &["Microsoft Edge"],
    )
}

fn brave_cache(paths: &dyn PathSource) -> Vec<Target> {
    chromium_root(
        paths,
        &["BraveSoftware", "Brave-Browser", "User Data"],
        &["BraveSoftware", "Brave-Browser"],
        &["BraveSoftware", "Brave-Browser"],
    )
}

fn opera_cache(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => {
            let Some(app) = paths.var("APPDATA") else {
                return Vec::new();
            };
            ["Opera Stable", "Opera GX Stable"]
                .iter()
                .flat_map(|d| chromium_profiles(&join(&app, &["Opera Software", d])))
                .collect()
        }
        Platform::Linux => dirs_under(paths.cache_dir(), &[&["opera"]]),
        _ => Vec::new(),
    }
}

fn discord_cache(paths: &dyn PathSource) -> Vec<Target> {
    let base = match paths.platform() {
        Platform::Windows => paths.var("APPDATA"),
        p if p.is_unix() => paths.config_dir(),
        _ => None,
    };
    dirs_under(
        base,
        &[&["discord", "Cache"], &["discord", "Code Cache"], &["discord", "GPUCache"]],
    )
}

fn spotify_cache(paths: &dyn PathSource) -> Vec<Target> {
    match paths.platform() {
        Platform::Windows => dirs_under(paths.var("LOCALAPPDATA"), &[&["Spotify", "Storage"]]),
        Platform::Linux => dirs_under(paths.cache_dir(), &[&["spotify", "Data"]]),
        Platform::MacOs => dirs_under(paths.cache_dir(), &[&["com.spotify.client", "Data"]]),
        Platform::Other => Vec::new(),
    }
}

fn steam_cache(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(win_var(paths, "LOCALAPPDATA"), &[&["Steam", "htmlcache"]])
}

fn teams_cache(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(
        win_var(paths, "APPDATA"),
        &[
            &["Microsoft", "Teams", "Cache"],
            &["Microsoft", "Teams", "blob_storage"],
            &["Microsoft", "Teams", "GPUCache"],
        ],
    )
}

fn vscode_cache(paths: &dyn PathSource) -> Vec<Target> {
    let base = match paths.platform() {
        Platform::Windows => paths.var("APPDATA"),
        p if p.is_unix() => paths.config_dir(),
        _ => None,
    };
    dirs_under(
        base,
        &[&["Code", "Cache"], &["Code", "CachedData"], &["Code", "CachedExtensions"]],
    )
}

fn java_cache(paths: &dyn PathSource) -> Vec<Target> {
    dirs_under(
        win_var(paths, "USERPROFILE"),
        &[&["AppData", "LocalLow", "Sun", "Java", "Deployment", "cache"]],
    )
}
