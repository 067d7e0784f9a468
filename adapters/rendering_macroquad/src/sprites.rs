use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use macroquad::texture::Texture2D;
use tracing::{info, warn};
use wave_escape_rendering::SpriteKind;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Cache of textures loaded from the sprite manifest.
///
/// Sprites without a usable image are recorded as placeholders and drawn as
/// flat rectangles in [`SpriteKind::placeholder_color`].
#[derive(Debug, Default)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<SpriteKind, Texture2D>,
    placeholders: Vec<SpriteKind>,
}

impl SpriteAtlas {
    /// Atlas that draws every sprite as a placeholder.
    pub(crate) fn placeholders_only() -> Self {
        Self {
            textures: HashMap::new(),
            placeholders: SpriteKind::ALL.to_vec(),
        }
    }

    /// Loads sprites from the manifest located at the provided path.
    ///
    /// A missing manifest or image degrades to placeholders. A manifest that
    /// exists but cannot be parsed is an error.
    pub(crate) fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Retrieves the texture associated with the provided sprite.
    pub(crate) fn texture(&self, kind: SpriteKind) -> Option<Texture2D> {
        self.textures.get(&kind).copied()
    }

    /// Sprites drawn without an image.
    pub(crate) fn placeholders(&self) -> &[SpriteKind] {
        &self.placeholders
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(SpriteKind, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = match fs::read_to_string(manifest_path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!(
                    path = %manifest_path.display(),
                    "sprite_manifest_missing_using_placeholders"
                );
                return Ok(Self::placeholders_only());
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!(
                        "failed to read sprite manifest at {}",
                        manifest_path.display()
                    )
                })
            }
        };
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Ok(Self::from_entries(entries, &mut loader))
    }

    fn from_entries(
        entries: Vec<(SpriteKind, Option<PathBuf>)>,
        loader: &mut impl FnMut(SpriteKind, &Path) -> Result<Texture2D>,
    ) -> Self {
        let mut atlas = Self::default();
        for (kind, path) in entries {
            let Some(path) = path else {
                warn!(sprite = kind.name(), "sprite_not_in_manifest_using_placeholder");
                atlas.placeholders.push(kind);
                continue;
            };

            match loader(kind, &path) {
                Ok(texture) => {
                    let _ = atlas.textures.insert(kind, texture);
                }
                Err(error) => {
                    warn!(
                        sprite = kind.name(),
                        path = %path.display(),
                        error = %format!("{error:#}"),
                        "sprite_missing_using_placeholder"
                    );
                    atlas.placeholders.push(kind);
                }
            }
        }
        info!(
            textures = atlas.textures.len(),
            placeholders = atlas.placeholders.len(),
            "sprite_atlas_ready"
        );
        atlas
    }
}

fn default_loader(_kind: SpriteKind, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    let pixels = decode_sprite(&bytes)
        .with_context(|| format!("failed to decode sprite asset at {}", path.display()))?;
    let width = u16::try_from(pixels.width()).context("sprite is too wide")?;
    let height = u16::try_from(pixels.height()).context("sprite is too tall")?;
    Ok(Texture2D::from_rgba8(width, height, pixels.as_raw()))
}

/// Decodes image bytes into RGBA pixels. Corrupt data is an error rather than a panic.
fn decode_sprite(bytes: &[u8]) -> Result<image::RgbaImage> {
    let decoded = image::load_from_memory(bytes).context("unrecognised image data")?;
    Ok(decoded.to_rgba8())
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    sprites: HashMap<String, String>,
}

/// Resolves manifest entries in [`SpriteKind::ALL`] order. Kinds the manifest
/// does not mention resolve to `None`.
fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(SpriteKind, Option<PathBuf>)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let Some(kind) = SpriteKind::from_name(&name) else {
            bail!("unknown sprite key `{name}` in manifest");
        };
        let _ = resolved.insert(kind, base_path.join(relative_path));
    }

    Ok(SpriteKind::ALL
        .into_iter()
        .map(|kind| (kind, resolved.remove(&kind)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn manifest_rejects_unknown_keys() {
        let manifest = r#"
            version = 1

            [sprites]
            Wall = "tiles/wall.png"
            TowerBase = "towers/base.png"
        "#;

        let result = parse_manifest(manifest, Path::new("assets"));
        assert!(result.is_err(), "unknown keys must be rejected");
    }

    #[test]
    fn manifest_rejects_unsupported_version() {
        let manifest = r#"
            version = 2

            [sprites]
            Wall = "tiles/wall.png"
        "#;

        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_resolves_paths_relative_to_base_directory() {
        let manifest = r#"
            version = 1

            [sprites]
            Player = "player.png"
            Floor = "tiles/floor.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("root")).expect("manifest should parse");

        assert_eq!(parsed.len(), SpriteKind::ALL.len());
        assert_eq!(
            parsed[0],
            (SpriteKind::Floor, Some(PathBuf::from("root/tiles/floor.png")))
        );
        assert_eq!(
            parsed[3],
            (SpriteKind::Player, Some(PathBuf::from("root/player.png")))
        );
        assert_eq!(parsed[1], (SpriteKind::Wall, None));
    }

    #[test]
    fn unlisted_and_unreadable_sprites_become_placeholders() {
        let entries = vec![
            (SpriteKind::Floor, Some(PathBuf::from("floor.png"))),
            (SpriteKind::Wall, Some(PathBuf::from("missing.png"))),
            (SpriteKind::Exit, None),
        ];
        let load_order = RefCell::new(Vec::new());

        let atlas = SpriteAtlas::from_entries(entries, &mut |kind, path| {
            load_order.borrow_mut().push(kind);
            if path.ends_with("missing.png") {
                bail!("no such file");
            }
            Ok(Texture2D::empty())
        });

        assert_eq!(
            load_order.into_inner(),
            vec![SpriteKind::Floor, SpriteKind::Wall]
        );
        assert!(atlas.texture(SpriteKind::Floor).is_some());
        assert!(atlas.texture(SpriteKind::Wall).is_none());
        assert_eq!(atlas.placeholders(), &[SpriteKind::Wall, SpriteKind::Exit]);
    }

    #[test]
    fn corrupt_image_becomes_placeholder() {
        let entries = vec![(SpriteKind::Wave, Some(PathBuf::from("wave.png")))];

        let atlas = SpriteAtlas::from_entries(entries, &mut |_, _| {
            let _ = decode_sprite(b"\x89PNG\r\n\x1a\n truncated")?;
            Ok(Texture2D::empty())
        });

        assert!(atlas.texture(SpriteKind::Wave).is_none());
        assert_eq!(atlas.placeholders(), &[SpriteKind::Wave]);
    }

    #[test]
    fn valid_png_decodes_to_rgba() {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("png encodes");

        let decoded = decode_sprite(bytes.get_ref()).expect("png decodes");

        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn missing_manifest_falls_back_to_placeholders() {
        let atlas = SpriteAtlas::from_manifest_with_loader(
            "does/not/exist/manifest.toml",
            |_, _| -> Result<Texture2D> { bail!("loader must not run") },
        )
        .expect("missing manifest is recovered");

        assert_eq!(atlas.placeholders().len(), SpriteKind::ALL.len());
        assert!(atlas.texture(SpriteKind::Player).is_none());
    }
}
