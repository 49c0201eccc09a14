use bson::{doc, Document};
use chrono::Utc;
use futures::TryStreamExt;
use log::info;
use mongodb::{options::FindOptions, Collection, Database};

use crate::errors::{QuotationError, Result};
use crate::models::catalog::CatalogEntity;

/// Agency-scoped CRUD over the catalog collections.
#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection<T: CatalogEntity>(&self) -> Collection<T> {
        self.db.collection(T::COLLECTION)
    }

    pub async fn list<T: CatalogEntity>(
        &self,
        agency_id: &str,
        search: Option<&str>,
        limit: Option<u16>,
    ) -> Result<Vec<T>> {
        let mut options = FindOptions::default();
        options.limit = limit.map(i64::from);
        options.sort = Some(doc! { "name": 1 });

        let cursor = self
            .collection::<T>()
            .find(list_filter(agency_id, search))
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn get<T: CatalogEntity>(&self, agency_id: &str, id: &str) -> Result<T> {
        self.collection::<T>()
            .find_one(doc! { "_id": id, "agency_id": agency_id })
            .await?
            .ok_or_else(|| QuotationError::not_found(T::LABEL, id))
    }

    pub async fn create<T: CatalogEntity>(&self, agency_id: &str, mut entity: T) -> Result<T> {
        entity.validate()?;
        let now = Utc::now();
        let meta = entity.meta_mut();
        meta.id = uuid::Uuid::new_v4().to_string();
        meta.agency_id = agency_id.to_string();
        meta.created_at = Some(now);
        meta.updated_at = Some(now);

        self.collection::<T>().insert_one(&entity).await?;
        info!("Created {} {} for agency {}", T::LABEL, entity.meta().id, agency_id);
        Ok(entity)
    }

    pub async fn update<T: CatalogEntity>(&self, agency_id: &str, id: &str, mut entity: T) -> Result<T> {
        entity.validate()?;
        let existing: T = self.get(agency_id, id).await?;
        let meta = entity.meta_mut();
        meta.id = id.to_string();
        meta.agency_id = agency_id.to_string();
        meta.created_at = existing.meta().created_at;
        meta.updated_at = Some(Utc::now());

        self.collection::<T>()
            .replace_one(doc! { "_id": id, "agency_id": agency_id }, &entity)
            .await?;
        Ok(entity)
    }

    pub async fn delete<T: CatalogEntity>(&self, agency_id: &str, id: &str) -> Result<()> {
        let result = self
            .collection::<T>()
            .delete_one(doc! { "_id": id, "agency_id": agency_id })
            .await?;
        if result.deleted_count == 0 {
            return Err(QuotationError::not_found(T::LABEL, id));
        }
        info!("Deleted {} {} for agency {}", T::LABEL, id, agency_id);
        Ok(())
    }
}

/// Case-insensitive name prefix search within one agency.
pub fn list_filter(agency_id: &str, search: Option<&str>) -> Document {
    match search {
        Some(text) if !text.trim().is_empty() => doc! {
            "agency_id": agency_id,
            "name": {
                "$regex": format!("^{}", regex::escape(text.trim())),
                "$options": "i"
            }
        },
        _ => doc! { "agency_id": agency_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_is_always_agency_scoped() {
        let filter = list_filter("agency-1", None);
        assert_eq!(filter.get_str("agency_id").unwrap(), "agency-1");
        assert!(filter.get("name").is_none());
    }

    #[test]
    fn test_search_text_is_escaped() {
        let filter = list_filter("agency-1", Some("Taj (Palace)"));
        let name = filter.get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), r"^Taj \(Palace\)");
    }
}
