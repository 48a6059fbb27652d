use diesel::GroupedBy;
use salvo::async_trait;

use acompaniar_db::db::query;
use acompaniar_db::db::query::help_center::HelpCenterRow;
use acompaniar_db::model::help_center::HelpCenter;

use super::PgStore;
use crate::error::ServiceResult;
use crate::help_center::HelpCenterView;
use crate::store::HelpCenterDirectory;

impl PgStore {
    async fn attach_details(&self, rows: Vec<HelpCenterRow>) -> ServiceResult<Vec<HelpCenterView>> {
        let mut conn = self.conn().await?;

        let centers: Vec<HelpCenter> = rows.iter().map(|(center, _, _)| center.clone()).collect();
        let phones = query::help_center::phones_for(&mut conn, &centers)
            .await?
            .grouped_by(&centers);
        let images = query::help_center::images_for(&mut conn, &centers)
            .await?
            .grouped_by(&centers);

        Ok(rows
            .into_iter()
            .zip(phones)
            .zip(images)
            .map(|(((center, location, category), phones), images)| {
                HelpCenterView::from_rows(
                    center,
                    location,
                    category,
                    phones.into_iter().map(|p| p.phone).collect(),
                    images.into_iter().map(|i| i.url).collect(),
                )
            })
            .collect())
    }
}

#[async_trait]
impl HelpCenterDirectory for PgStore {
    async fn list(&self, offset: i64, limit: i64) -> ServiceResult<(Vec<HelpCenterView>, i64)> {
        let (rows, total) = {
            let mut conn = self.conn().await?;
            let rows = query::help_center::page(&mut conn, offset, limit).await?;
            let total = query::help_center::count(&mut conn).await?;
            (rows, total)
        };

        Ok((self.attach_details(rows).await?, total))
    }

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<HelpCenterView>> {
        let row = {
            let mut conn = self.conn().await?;
            query::help_center::by_id(&mut conn, id).await?
        };

        match row {
            Some(row) => Ok(self.attach_details(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}
