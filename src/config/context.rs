use std::sync::Arc;

use tracing::info;

use crate::catalog::memory::MemoryStore;
use crate::catalog::CatalogResult;
use crate::context::CatalogContext;

use super::schema::{self, MetacatConfig};

pub async fn build_context(cfg: &MetacatConfig) -> CatalogResult<CatalogContext> {
    let context = match &cfg.catalog {
        schema::Catalog::InMemory(_) => {
            info!("Using the in-memory catalog; nothing will be persisted");
            CatalogContext::new_from_store(
                Arc::new(MemoryStore::new()),
                cfg.misc.default_limit,
                cfg.misc.max_limit,
            )
        }
    };

    context.seed_tags(&cfg.tags).await?;
    Ok(context)
}
