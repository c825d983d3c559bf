//! Font resolution and sized font handles.
//!
//! A [`FontSet`] is resolved once at startup and shared read-only across all
//! images of every batch run. Each character is drawn with the face for its
//! script: the Chinese face for CJK ideographs, the English face for
//! everything else. A missing face falls back to the other one. When no font
//! file could be loaded at all, the embedded DejaVu Sans is used, and block
//! glyphs remain as the last resort.

use super::WatermarkError;
use ab_glyph::{FontArc, FontVec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Well-known Latin font files, in preference order.
const ENGLISH_CANDIDATES: &[&str] = &[
    "arial.ttf",
    "Arial.ttf",
    "LiberationSans-Regular.ttf",
    "DejaVuSans.ttf",
    "times.ttf",
    "Times New Roman.ttf",
];

/// Well-known CJK font files, in preference order.
const CHINESE_CANDIDATES: &[&str] = &[
    "simhei.ttf",
    "SimHei.ttf",
    "msyh.ttc",
    "msyh.ttf",
    "simsun.ttc",
    "SourceHanSansSC-Regular.otf",
    "NotoSansCJK-Regular.ttc",
    "NotoSansSC-Regular.otf",
    "wqy-zenhei.ttc",
    "wqy-microhei.ttc",
    "PingFang.ttc",
];

/// DejaVu Sans, used when no system font can be loaded (see `fonts/LICENSE`)
pub const EMBEDDED_FONT: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

/// Directories below this depth are not searched for fonts.
const MAX_SEARCH_DEPTH: usize = 5;

/// Writing system of a character, used to pick a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// CJK Unified Ideographs (U+4E00..=U+9FFF)
    Cjk,
    Other,
}

impl Script {
    pub fn of(ch: char) -> Script {
        if ('\u{4E00}'..='\u{9FFF}').contains(&ch) {
            Script::Cjk
        } else {
            Script::Other
        }
    }
}

/// Returns true if the text contains at least one CJK ideograph.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| Script::of(c) == Script::Cjk)
}

/// A loaded font face.
#[derive(Clone)]
pub enum FontFace {
    /// TrueType/OpenType outlines
    Outline(FontArc),
    /// Built-in face drawing every glyph as a hollow block.
    /// `advance_ratio` is the advance width relative to the pixel size.
    Blocks { advance_ratio: f32 },
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("FontFace::Outline"),
            Self::Blocks { advance_ratio } => f
                .debug_struct("FontFace::Blocks")
                .field("advance_ratio", advance_ratio)
                .finish(),
        }
    }
}

impl FontFace {
    /// Parse font data. Collections (`.ttc`) load their first face.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, WatermarkError> {
        FontVec::try_from_vec_and_index(data, 0)
            .map(|font| Self::Outline(FontArc::new(font)))
            .map_err(|e| WatermarkError::FontError(e.to_string()))
    }

    /// The embedded DejaVu Sans face.
    pub fn embedded() -> Result<Self, WatermarkError> {
        FontArc::try_from_slice(EMBEDDED_FONT)
            .map(Self::Outline)
            .map_err(|e| WatermarkError::FontError(format!("embedded font: {}", e)))
    }

    /// Load a font file from disk.
    pub fn from_file(path: &Path) -> Result<Self, WatermarkError> {
        let data = std::fs::read(path)
            .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
            .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))
    }

    /// Block-glyph face with proportions suited to the script:
    /// full-width for CJK, roughly Latin-width otherwise.
    pub fn blocks(script: Script) -> Self {
        match script {
            Script::Cjk => Self::Blocks { advance_ratio: 1.0 },
            Script::Other => Self::Blocks { advance_ratio: 0.5 },
        }
    }

    pub fn is_outline(&self) -> bool {
        matches!(self, Self::Outline(_))
    }
}

/// Font locations from the configuration file.
///
/// ```yaml
/// fonts:
///   chinese: /usr/share/fonts/wqy/wqy-zenhei.ttc
///   english: /usr/share/fonts/dejavu/DejaVuSans.ttf
///   search_dirs: [/opt/fonts]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    /// Explicit font file for CJK text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese: Option<PathBuf>,

    /// Explicit font file for Latin text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<PathBuf>,

    /// Extra directories searched before the system font directories
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,

    /// Skip searching system font directories
    #[serde(default)]
    pub no_system_fonts: bool,
}

/// The pair of faces shared by every image in a run.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    chinese: Option<FontFace>,
    english: Option<FontFace>,
}

impl FontSet {
    pub fn new(chinese: Option<FontFace>, english: Option<FontFace>) -> Self {
        Self { chinese, english }
    }

    /// Font set without any loaded font; every script uses block glyphs.
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Font set with the embedded face for every script.
    pub fn embedded() -> Self {
        Self {
            chinese: None,
            english: embedded_face(),
        }
    }

    /// Resolve fonts from the configuration: explicit paths first, then the
    /// well-known file names under the configured and system directories.
    ///
    /// Never fails; unresolved faces are logged and left to the fallbacks.
    pub fn resolve(config: &FontConfig) -> Self {
        let mut dirs = config.search_dirs.clone();
        if !config.no_system_fonts {
            dirs.extend(system_font_dirs());
        }

        let english = load_face("english", config.english.as_deref(), ENGLISH_CANDIDATES, &dirs);
        let chinese = load_face("chinese", config.chinese.as_deref(), CHINESE_CANDIDATES, &dirs);

        let english = match (english, &chinese) {
            (None, None) => {
                tracing::warn!("No usable font file found, using the embedded DejaVu Sans");
                embedded_face()
            }
            (english, _) => english,
        };

        Self { chinese, english }
    }

    pub fn has_chinese(&self) -> bool {
        self.chinese.is_some()
    }

    pub fn has_english(&self) -> bool {
        self.english.is_some()
    }

    /// Face used for characters of the given script.
    pub fn face_for(&self, script: Script) -> FontFace {
        let (preferred, other) = match script {
            Script::Cjk => (&self.chinese, &self.english),
            Script::Other => (&self.english, &self.chinese),
        };
        preferred
            .as_ref()
            .or(other.as_ref())
            .cloned()
            .unwrap_or_else(|| FontFace::blocks(script))
    }

    /// Face used to measure inter-word spaces: English, then Chinese.
    pub fn space_face(&self) -> FontFace {
        self.english
            .as_ref()
            .or(self.chinese.as_ref())
            .cloned()
            .unwrap_or_else(|| FontFace::blocks(Script::Other))
    }

    /// Bind every face to a pixel size.
    pub fn at_size(&self, px: f32) -> ScaledFonts {
        ScaledFonts {
            cjk: FontHandle::new(self.face_for(Script::Cjk), px),
            latin: FontHandle::new(self.face_for(Script::Other), px),
            space: FontHandle::new(self.space_face(), px),
        }
    }
}

/// A face bound to a pixel size.
#[derive(Debug, Clone)]
pub struct FontHandle {
    face: FontFace,
    px: f32,
}

impl FontHandle {
    pub fn new(face: FontFace, px: f32) -> Self {
        Self { face, px }
    }

    /// Same face at another size.
    pub fn resize(&self, px: f32) -> FontHandle {
        Self {
            face: self.face.clone(),
            px,
        }
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    pub fn px(&self) -> f32 {
        self.px
    }
}

/// Per-script handles at one size.
#[derive(Debug, Clone)]
pub struct ScaledFonts {
    cjk: FontHandle,
    latin: FontHandle,
    space: FontHandle,
}

impl ScaledFonts {
    pub fn for_script(&self, script: Script) -> &FontHandle {
        match script {
            Script::Cjk => &self.cjk,
            Script::Other => &self.latin,
        }
    }

    pub fn for_char(&self, ch: char) -> &FontHandle {
        self.for_script(Script::of(ch))
    }

    pub fn space(&self) -> &FontHandle {
        &self.space
    }

    pub fn px(&self) -> f32 {
        self.latin.px()
    }

    pub fn resize(&self, px: f32) -> ScaledFonts {
        Self {
            cjk: self.cjk.resize(px),
            latin: self.latin.resize(px),
            space: self.space.resize(px),
        }
    }
}

fn embedded_face() -> Option<FontFace> {
    match FontFace::embedded() {
        Ok(face) => Some(face),
        Err(e) => {
            tracing::warn!(error = %e, "Watermarks will be drawn with block glyphs");
            None
        }
    }
}

fn load_face(
    role: &str,
    explicit: Option<&Path>,
    candidates: &[&str],
    dirs: &[PathBuf],
) -> Option<FontFace> {
    if let Some(path) = explicit {
        match FontFace::from_file(path) {
            Ok(face) => {
                tracing::info!(role, path = %path.display(), "Loaded configured font");
                return Some(face);
            }
            Err(e) => {
                tracing::warn!(role, error = %e, "Configured font could not be loaded, searching");
            }
        }
    }

    for name in candidates {
        let Some(path) = find_font_file(name, dirs) else {
            tracing::debug!(role, font = name, "Font not found");
            continue;
        };
        match FontFace::from_file(&path) {
            Ok(face) => {
                tracing::info!(role, path = %path.display(), "Loaded font");
                return Some(face);
            }
            Err(e) => tracing::warn!(role, error = %e, "Font could not be loaded"),
        }
    }

    tracing::warn!(role, "No font found");
    None
}

/// Locate a font file by name (case-insensitive) under the given directories.
pub fn find_font_file(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().filter(|dir| dir.is_dir()).find_map(|dir| {
        WalkDir::new(dir)
            .max_depth(MAX_SEARCH_DEPTH)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|entry| {
                entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .map(|entry| entry.into_path())
    })
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    if let Some(windir) = std::env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    } else {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    }
    dirs
}
