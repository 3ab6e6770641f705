//! Texture loading.
//!
//! Decoding happens off the render thread. The GL upload happens later, on
//! the render thread, when the owner calls [`PendingTexture::poll`]. Frames
//! drawn before that sample an unset texture; nothing waits for the image.

use std::path::PathBuf;

use image::RgbImage;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::constants;
use crate::context::RenderContext;
use crate::{GlError, GlResult};

/// Where texture pixels come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (PNG or JPEG).
    Encoded(Vec<u8>),
    /// Already decoded pixels.
    Image(RgbImage),
}

impl TextureSource {
    /// Two-colour checkerboard, `size` pixels square with `cells` squares per side.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 3], b: [u8; 3]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let image = RgbImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                image::Rgb(a)
            } else {
                image::Rgb(b)
            }
        });
        TextureSource::Image(image)
    }
}

/// RGB8 pixels ready for `tex_image_2d`, rows stored bottom-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode and flip vertically so row 0 is the bottom of the image.
    pub fn decode(source: TextureSource) -> GlResult<Self> {
        let rgb = match source {
            TextureSource::Path(path) => image::open(&path)
                .map_err(|e| GlError::TextureDecode(format!("{}: {}", path.display(), e)))?
                .to_rgb8(),
            TextureSource::Encoded(bytes) => image::load_from_memory(&bytes)
                .map_err(|e| GlError::TextureDecode(e.to_string()))?
                .to_rgb8(),
            TextureSource::Image(image) => image,
        };
        let flipped = image::imageops::flip_vertical(&rgb);
        Ok(Self {
            width: flipped.width(),
            height: flipped.height(),
            pixels: flipped.into_raw(),
        })
    }
}

/// Upload progress of a [`PendingTexture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Ready,
    Failed(String),
}

/// A texture whose image is still being decoded.
#[derive(Debug)]
pub struct PendingTexture<C: RenderContext> {
    texture: C::Texture,
    sampler: Option<C::UniformLocation>,
    receiver: Option<oneshot::Receiver<GlResult<DecodedImage>>>,
    decoded: Option<GlResult<DecodedImage>>,
    state: TextureState,
}

impl<C: RenderContext> PendingTexture<C> {
    pub fn texture(&self) -> &C::Texture {
        &self.texture
    }

    pub fn state(&self) -> &TextureState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == TextureState::Ready
    }

    /// Wait for the decode to finish without uploading anything.
    pub async fn wait(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            self.decoded = Some(
                receiver
                    .await
                    .unwrap_or_else(|_| Err(GlError::TextureDecode("decoder dropped".into()))),
            );
        }
    }

    /// Upload the image if decoding has finished. Call from the render thread.
    pub fn poll(&mut self, ctx: &mut C) -> &TextureState {
        if self.state != TextureState::Pending {
            return &self.state;
        }

        if self.decoded.is_none() {
            if let Some(receiver) = self.receiver.as_mut() {
                match receiver.try_recv() {
                    Ok(result) => self.decoded = Some(result),
                    Err(TryRecvError::Empty) => return &self.state,
                    Err(TryRecvError::Closed) => {
                        self.decoded =
                            Some(Err(GlError::TextureDecode("decoder dropped".into())))
                    }
                }
                self.receiver = None;
            }
        }

        match self.decoded.take() {
            Some(Ok(image)) => {
                self.state = if self.upload(ctx, &image) {
                    TextureState::Ready
                } else {
                    TextureState::Failed("rendering context lost before upload".into())
                };
            }
            Some(Err(err)) => {
                error!(%err, "Texture load failed, rendering untextured");
                self.state = TextureState::Failed(err.to_string());
            }
            None => {}
        }
        &self.state
    }

    /// Returns false when nothing was uploaded.
    fn upload(&self, ctx: &mut C, image: &DecodedImage) -> bool {
        if ctx.is_context_lost() {
            warn!("Context lost before texture upload");
            return false;
        }
        ctx.active_texture(constants::TEXTURE0);
        ctx.bind_texture(constants::TEXTURE_2D, Some(&self.texture));
        ctx.tex_parameteri(
            constants::TEXTURE_2D,
            constants::TEXTURE_MIN_FILTER,
            constants::LINEAR as i32,
        );
        // decoded rows are tightly packed RGB
        ctx.pixel_storei(constants::UNPACK_ALIGNMENT, 1);
        ctx.tex_image_2d(
            constants::TEXTURE_2D,
            0,
            constants::RGB,
            image.width,
            image.height,
            constants::RGB,
            constants::UNSIGNED_BYTE,
            &image.pixels,
        );
        ctx.uniform1i(self.sampler.as_ref(), 0);
        info!(width = image.width, height = image.height, "Texture uploaded");
        true
    }
}

/// Create a texture for `sampler_name` and start decoding `source`.
///
/// Decoding runs on tokio's blocking pool when called inside a runtime and
/// on a plain thread otherwise.
pub fn load_texture<C: RenderContext>(
    ctx: &mut C,
    program: &C::Program,
    sampler_name: &str,
    source: TextureSource,
) -> GlResult<PendingTexture<C>> {
    if ctx.is_context_lost() {
        error!("Cannot load texture: rendering context is lost");
        return Err(GlError::ContextLost);
    }
    let Some(texture) = ctx.create_texture() else {
        error!("Failed to create texture");
        return Err(GlError::MissingDependency("texture object"));
    };
    let sampler = ctx.uniform_location(program, sampler_name);
    if sampler.is_none() {
        warn!(sampler = sampler_name, "Sampler uniform not found in program");
    }

    let (tx, rx) = oneshot::channel();
    let job = move || {
        let _ = tx.send(DecodedImage::decode(source));
    };
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            std::thread::spawn(job);
        }
    }
    debug!(sampler = sampler_name, "Texture decode started");

    Ok(PendingTexture {
        texture,
        sampler,
        receiver: Some(rx),
        decoded: None,
        state: TextureState::Pending,
    })
}
