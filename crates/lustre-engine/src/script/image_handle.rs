use std::path::{Path, PathBuf};

use mlua::{MultiValue, UserData, UserDataMethods, Value};

use crate::paint::{Texture, TextureHandle};

use super::args::{Args, usage_error};

#[derive(Debug, Clone, Default)]
enum ImageState {
    #[default]
    Empty,
    Loaded(TextureHandle),
    /// `Load` was called but the file could not be decoded. Draws fall back
    /// to the white texture.
    Broken,
}

/// Load options scripts may pass. Loading is always synchronous and every
/// texture uses the same sampler, so they are validated and then ignored.
const LOAD_FLAGS: [&str; 3] = ["ASYNC", "CLAMP", "MIPMAP"];

/// Script-visible image handle returned by `NewImageHandle()`.
#[derive(Debug)]
pub struct ImageHandle {
    base_dir: PathBuf,
    state: ImageState,
}

impl ImageHandle {
    /// Relative file names passed to `Load` resolve against `base_dir`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir, state: ImageState::Empty }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        match &self.state {
            ImageState::Loaded(t) => Some(t),
            _ => None,
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() || self.base_dir.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn load(&mut self, args: Args) -> mlua::Result<()> {
        args.require(1, "imgHandle:Load(fileName[, flag1[, flag2...]])")?;
        let name = args.string(1)?;

        for n in 2..=args.len() {
            // Non-string flags are ignored.
            let Value::String(flag) = args.get(n) else { continue };
            let flag = flag.to_string_lossy().to_string();
            if !LOAD_FLAGS.contains(&flag.as_str()) {
                return Err(usage_error(format!("imgHandle:Load(): unrecognised flag '{flag}'")));
            }
        }

        let path = self.resolve(&name);
        self.state = match Texture::load(&path) {
            Ok(texture) => ImageState::Loaded(texture),
            Err(e) => {
                log::warn!("{e}; drawing it as white");
                ImageState::Broken
            }
        };
        Ok(())
    }
}

impl UserData for ImageHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method_mut("Load", |_, this, args: MultiValue| {
            this.load(Args::new("imgHandle:Load", args))
        });

        methods.add_method_mut("Unload", |_, this, ()| {
            this.state = ImageState::Empty;
            Ok(())
        });

        methods.add_method("IsValid", |_, this, ()| Ok(this.texture().is_some()));

        methods.add_method("IsLoading", |_, _, ()| Ok(false));

        methods.add_method("SetLoadingPriority", |_, _, args: MultiValue| {
            let args = Args::new("imgHandle:SetLoadingPriority", args);
            args.require(1, "imgHandle:SetLoadingPriority(pri)")?;
            args.number(1)?;
            Ok(())
        });

        methods.add_method("ImageSize", |_, this, ()| {
            Ok(this.texture().map_or((0, 0), |t| (t.width(), t.height())))
        });
    }
}

/// Reads an `{imgHandle|nil}` argument.
///
/// A handle whose file failed to decode yields `None` (white); a handle
/// that was never loaded is a usage error.
pub(crate) fn texture_arg(args: &Args, n: usize) -> mlua::Result<Option<TextureHandle>> {
    match args.get(n) {
        Value::Nil => Ok(None),
        Value::UserData(ud) => {
            let handle = ud
                .borrow::<ImageHandle>()
                .map_err(|_| args.type_error(n, "image handle or nil"))?;
            match &handle.state {
                ImageState::Loaded(t) => Ok(Some(t.clone())),
                ImageState::Broken => Ok(None),
                ImageState::Empty => Err(usage_error(format!(
                    "{}(): image handle has no image loaded",
                    args.call()
                ))),
            }
        }
        _ => Err(args.type_error(n, "image handle or nil")),
    }
}
