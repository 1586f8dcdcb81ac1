use std::sync::Arc;

use crate::foundation::core::TileCoord;
use crate::foundation::error::PixelFrameResult;
use crate::grid::alloc::{CanvasStats, PixelCanvas};
use crate::render::compositor::PreviewRenderer;

/// An inbound frame interaction, as handed over by the protocol adapter.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameAction {
    /// Identity the tile would be claimed for.
    pub owner_id: String,
    /// Opaque signed payload checked by the [`SignatureVerifier`].
    #[serde(default)]
    pub trusted_payload: String,
}

impl FrameAction {
    /// Action for `owner_id` with an empty payload.
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            trusted_payload: String::new(),
        }
    }
}

/// Opaque predicate deciding whether an action is authentic.
pub trait SignatureVerifier: Send + Sync {
    /// Return `true` if `action` may claim a tile.
    fn verify(&self, action: &FrameAction) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&FrameAction) -> bool + Send + Sync,
{
    fn verify(&self, action: &FrameAction) -> bool {
        self(action)
    }
}

/// Verifier that accepts everything. For local tools and tests only.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrustAll;

impl SignatureVerifier for TrustAll {
    fn verify(&self, _action: &FrameAction) -> bool {
        true
    }
}

/// How a claim request ended. Persistence failures are errors, not outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A tile was claimed and persisted.
    Claimed(TileCoord),
    /// Every tile is already taken.
    CanvasFull,
    /// The verifier rejected the action; no claim was attempted.
    SignatureInvalid,
}

impl ClaimOutcome {
    /// User-facing status line.
    pub fn message(self) -> String {
        match self {
            Self::Claimed(coord) => format!("Your pixel is at {coord}!"),
            Self::CanvasFull => "No space available".to_string(),
            Self::SignatureInvalid => "Invalid signature".to_string(),
        }
    }

    /// Coordinate for successful claims.
    pub fn coord(self) -> Option<TileCoord> {
        match self {
            Self::Claimed(c) => Some(c),
            Self::CanvasFull | Self::SignatureInvalid => None,
        }
    }
}

/// Outcome plus the preview image shown with it.
#[derive(Clone, Debug)]
pub struct FrameResponse {
    /// What happened.
    pub outcome: ClaimOutcome,
    /// PNG bytes (`image/png`); the claimed tile is highlighted on success.
    ///
    /// `None` when rendering failed. The outcome still stands: a claimed tile stays claimed.
    pub png: Option<Vec<u8>>,
}

impl FrameResponse {
    /// MIME type of [`FrameResponse::png`].
    pub const CONTENT_TYPE: &'static str = "image/png";
}

/// Verify, claim, render: the call order behind one frame interaction.
pub struct FrameService {
    canvas: Arc<PixelCanvas>,
    renderer: Box<dyn PreviewRenderer>,
    verifier: Box<dyn SignatureVerifier>,
}

impl FrameService {
    /// Assemble a service from its collaborators.
    pub fn new(
        canvas: Arc<PixelCanvas>,
        renderer: impl PreviewRenderer + 'static,
        verifier: Box<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            canvas,
            renderer: Box::new(renderer),
            verifier,
        }
    }

    /// Shared canvas handle.
    pub fn canvas(&self) -> &Arc<PixelCanvas> {
        &self.canvas
    }

    /// Handle a claim request.
    ///
    /// The claim is persisted before the image is rendered, so an `Ok` response never
    /// reports an unsaved tile. A render failure only drops the image.
    #[tracing::instrument(skip(self, action), fields(owner = %action.owner_id))]
    pub fn handle_claim(&self, action: &FrameAction) -> PixelFrameResult<FrameResponse> {
        let outcome = if !self.verifier.verify(action) {
            tracing::warn!("signature rejected");
            ClaimOutcome::SignatureInvalid
        } else {
            match self.canvas.claim(&action.owner_id)? {
                Some(coord) => ClaimOutcome::Claimed(coord),
                None => ClaimOutcome::CanvasFull,
            }
        };

        let png = {
            let state = self.canvas.read();
            match self.renderer.render_png(&state, outcome.coord()) {
                Ok(png) => Some(png),
                Err(err) => {
                    tracing::error!(error = %err, "preview render failed");
                    None
                }
            }
        };
        Ok(FrameResponse { outcome, png })
    }

    /// Current preview without highlight.
    pub fn preview_png(&self) -> PixelFrameResult<Vec<u8>> {
        let state = self.canvas.read();
        self.renderer.render_png(&state, None)
    }

    /// Preview with an explicit highlight.
    pub fn render_png(&self, highlight: Option<TileCoord>) -> PixelFrameResult<Vec<u8>> {
        let state = self.canvas.read();
        self.renderer.render_png(&state, highlight)
    }

    /// Claims recorded for `owner`, oldest first.
    pub fn claims_for(&self, owner: &str) -> Vec<TileCoord> {
        self.canvas.claims_for(owner)
    }

    /// Current claim counters.
    pub fn stats(&self) -> CanvasStats {
        self.canvas.stats()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/frame.rs"]
mod tests;
