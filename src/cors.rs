//! Cross-origin policy plugin

use crate::app::AppBuilder;
use crate::error::StartupResult;
use crate::plugin::Plugin;
use async_trait::async_trait;
use axum::http::Method;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Applies a CORS layer around the whole router.
///
/// The default policy accepts any origin by echoing the request `Origin`
/// back, allows credentials, and mirrors the requested headers. A wildcard
/// origin cannot be combined with credentials, hence the mirroring.
pub struct CorsPlugin {
    layer: CorsLayer,
}

impl CorsPlugin {
    pub const NAME: &'static str = "cors";

    pub fn new(layer: CorsLayer) -> Self {
        Self { layer }
    }
}

impl Default for CorsPlugin {
    fn default() -> Self {
        Self::new(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_credentials(true)
                .allow_headers(AllowHeaders::mirror_request())
                .allow_methods([
                    Method::GET,
                    Method::HEAD,
                    Method::PUT,
                    Method::PATCH,
                    Method::POST,
                    Method::DELETE,
                ]),
        )
    }
}

#[async_trait]
impl Plugin for CorsPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn register(self: Box<Self>, app: &mut AppBuilder) -> StartupResult<()> {
        let layer = self.layer;
        app.wrap(CorsPlugin::NAME, move |router| router.layer(layer));
        Ok(())
    }
}
