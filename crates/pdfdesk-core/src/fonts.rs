//! Font discovery and loading
//!
//! Discovery is a plain existence check over well-known install locations.
//! Loading never fails outright: a font that cannot be read or parsed yields
//! [`ResolvedFont::Builtin`] with the reason attached.

use std::path::{Path, PathBuf};

use printpdf::ParsedFont;
use tracing::{debug, warn};

use crate::error::FontLoadFailure;

/// Korean-capable fonts on Debian-like hosts, checked in order.
pub const KOREAN_FONT_CANDIDATES: [&str; 5] = [
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansKR-Regular.otf",
    "/usr/share/fonts/truetype/noto/NotoSansKR-Regular.ttf",
    "/usr/share/fonts/truetype/unfonts-core/UnBatang.ttf",
];

/// First installed Korean-capable font, if any.
pub fn find_korean_font() -> Option<PathBuf> {
    find_first_existing(KOREAN_FONT_CANDIDATES.iter().map(Path::new))
}

/// First candidate that exists on disk. The file is not opened.
pub fn find_first_existing<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .find(|p| p.exists())
}

/// Outcome of resolving a font reference for the text renderer.
pub enum ResolvedFont {
    /// A parsed font that will be embedded in the output.
    Embedded { font: Box<ParsedFont>, path: PathBuf },
    /// The builtin Latin face. `failure` is set when a font was requested
    /// but could not be used.
    Builtin { failure: Option<FontLoadFailure> },
}

impl ResolvedFont {
    pub fn is_embedded(&self) -> bool {
        matches!(self, ResolvedFont::Embedded { .. })
    }

    pub fn failure(&self) -> Option<&FontLoadFailure> {
        match self {
            ResolvedFont::Builtin { failure } => failure.as_ref(),
            ResolvedFont::Embedded { .. } => None,
        }
    }
}

/// Resolve an optional font path into a usable font.
pub fn load_font(reference: Option<&Path>) -> ResolvedFont {
    let Some(path) = reference else {
        return ResolvedFont::Builtin { failure: None };
    };

    match parse_font_file(path) {
        Ok(font) => {
            debug!("Loaded font {}", path.display());
            ResolvedFont::Embedded {
                font: Box::new(font),
                path: path.to_path_buf(),
            }
        }
        Err(failure) => {
            warn!("{}, falling back to builtin font", failure);
            ResolvedFont::Builtin {
                failure: Some(failure),
            }
        }
    }
}

fn parse_font_file(path: &Path) -> Result<ParsedFont, FontLoadFailure> {
    let bytes = std::fs::read(path).map_err(|e| FontLoadFailure::new(path, e.to_string()))?;
    if bytes.is_empty() {
        return Err(FontLoadFailure::new(path, "file is empty"));
    }

    let mut warnings = Vec::new();
    ParsedFont::from_bytes(&bytes, 0, &mut warnings)
        .ok_or_else(|| FontLoadFailure::new(path, "not a usable TrueType/OpenType font"))
}
