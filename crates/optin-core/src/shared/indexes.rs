//! MongoDB Index Initialization
//!
//! Creates the subscription indexes on application startup.

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use tracing::info;

/// Initialize all MongoDB indexes.
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>("subscriptions");

    // Email uniqueness is enforced at the storage layer, not only by the
    // exists pre-check, so two racing subscribes cannot both insert
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    // Active lookup path: email restricted to the error ceiling
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1, "numTokenErrors": 1 })
                .options(IndexOptions::builder().background(true).build())
                .build(),
        )
        .await?;

    // Distribution page scan
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "confirmedByOwner": 1, "_id": 1 })
                .options(IndexOptions::builder().background(true).build())
                .build(),
        )
        .await?;

    info!("Created indexes on subscriptions");
    Ok(())
}
