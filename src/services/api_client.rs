// ============================================================================
// API CLIENT - Contrato CRUD remoto de stock (sin estado)
// ============================================================================
// Sin lógica de negocio, solo el contrato request/response. Los timeouts los
// aplican los llamadores con el clock inyectado.
// ============================================================================

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Item, ItemData, ItemPatch};

#[async_trait(?Send)]
pub trait ItemApi {
    async fn list_items(&self) -> Result<Vec<Item>, ApiError>;

    async fn create_item(&self, data: &ItemData) -> Result<Item, ApiError>;

    async fn update_item(&self, id: i64, patch: &ItemPatch) -> Result<Item, ApiError>;

    async fn delete_item(&self, id: i64) -> Result<(), ApiError>;
}

/// Chequeo barato de alcanzabilidad; el body de la respuesta se ignora
#[async_trait(?Send)]
pub trait ConnectivityProbe {
    async fn probe(&self) -> Result<(), ApiError>;
}

#[cfg(target_arch = "wasm32")]
pub use http::HttpItemApi;

#[cfg(target_arch = "wasm32")]
mod http {
    use async_trait::async_trait;
    use gloo_net::http::{Method, RequestBuilder, Response};
    use serde::de::DeserializeOwned;

    use super::{ConnectivityProbe, ItemApi};
    use crate::config::SyncConfig;
    use crate::error::ApiError;
    use crate::models::{ApiEnvelope, Item, ItemData, ItemPatch};

    /// Cliente basado en `fetch` para `{base}/items`
    #[derive(Clone)]
    pub struct HttpItemApi {
        base_url: String,
        probe_url: String,
    }

    impl HttpItemApi {
        pub fn new(config: &SyncConfig) -> Self {
            Self {
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                probe_url: config.probe_url.clone(),
            }
        }

        fn items_url(&self) -> String {
            format!("{}/items", self.base_url)
        }

        fn item_url(&self, id: i64) -> String {
            format!("{}/items/{}", self.base_url, id)
        }

        async fn envelope<T: DeserializeOwned>(response: Response) -> Result<ApiEnvelope<T>, ApiError> {
            if !response.ok() {
                let status = response.status();
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| response.status_text());
                return Err(ApiError::Http { status, message });
            }
            response
                .json::<ApiEnvelope<T>>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        }
    }

    fn network(e: gloo_net::Error) -> ApiError {
        ApiError::Network(e.to_string())
    }

    #[async_trait(?Send)]
    impl ItemApi for HttpItemApi {
        async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
            let response = RequestBuilder::new(&self.items_url())
                .method(Method::GET)
                .send()
                .await
                .map_err(network)?;
            let items = Self::envelope::<Vec<Item>>(response).await?.into_data()?;
            log::info!("📥 {} items recibidos", items.len());
            Ok(items)
        }

        async fn create_item(&self, data: &ItemData) -> Result<Item, ApiError> {
            let response = RequestBuilder::new(&self.items_url())
                .method(Method::POST)
                .json(data)
                .map_err(network)?
                .send()
                .await
                .map_err(network)?;
            Self::envelope::<Item>(response).await?.into_data()
        }

        async fn update_item(&self, id: i64, patch: &ItemPatch) -> Result<Item, ApiError> {
            let response = RequestBuilder::new(&self.item_url(id))
                .method(Method::PUT)
                .json(patch)
                .map_err(network)?
                .send()
                .await
                .map_err(network)?;
            Self::envelope::<Item>(response).await?.into_data()
        }

        async fn delete_item(&self, id: i64) -> Result<(), ApiError> {
            let response = RequestBuilder::new(&self.item_url(id))
                .method(Method::DELETE)
                .send()
                .await
                .map_err(network)?;
            Self::envelope::<serde_json::Value>(response).await?.into_ack()
        }
    }

    #[async_trait(?Send)]
    impl ConnectivityProbe for HttpItemApi {
        async fn probe(&self) -> Result<(), ApiError> {
            // Cualquier respuesta HTTP prueba que hay conexión
            RequestBuilder::new(&self.probe_url)
                .method(Method::HEAD)
                .send()
                .await
                .map(|_| ())
                .map_err(network)
        }
    }
}
