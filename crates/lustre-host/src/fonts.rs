use std::path::{Path, PathBuf};

use lustre_engine::text::{FontFace, FontSystem};

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
];

fn file_name(face: FontFace) -> &'static str {
    match face {
        FontFace::Fixed => "DejaVuSansMono.ttf",
        FontFace::Var => "DejaVuSans.ttf",
        FontFace::VarBold => "DejaVuSans-Bold.ttf",
    }
}

/// Loads every script font face, searching `font_dir` before the system
/// font directories. Missing faces fall back to whichever font loaded.
pub fn load_fonts(font_dir: Option<&Path>) -> FontSystem {
    let dirs: Vec<PathBuf> = font_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONT_DIRS.iter().map(PathBuf::from))
        .collect();

    let mut fonts = FontSystem::new();
    for face in FontFace::ALL {
        let found = dirs
            .iter()
            .map(|dir| dir.join(file_name(face)))
            .find_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)));

        match found {
            Some((path, bytes)) => match fonts.load_face(face, &bytes) {
                Ok(()) => log::debug!("font {face:?}: {}", path.display()),
                Err(e) => log::warn!("font {face:?}: {}: {e}", path.display()),
            },
            None => log::warn!("font {face:?}: {} not found", file_name(face)),
        }
    }
    fonts
}
