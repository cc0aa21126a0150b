use sea_orm::{
    entity::prelude::*,
    sea_query::{Expr, Func, LikeExpr},
    ActiveValue::{NotSet, Unchanged},
    DatabaseConnection, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// LIKE escape character. Must not need quoting in any backend.
const LIKE_ESCAPE: char = '!';

/// All customers, ascending by id.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>, errors::ModelError> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Case-insensitive substring match on `name`, ascending by id.
pub async fn find_name_contains(
    db: &DatabaseConnection,
    fragment: &str,
) -> Result<Vec<Model>, errors::ModelError> {
    let pattern = LikeExpr::new(like_pattern(fragment)).escape(LIKE_ESCAPE);
    let rows = Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern))
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

/// Insert with a store-assigned id.
pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        email: Set(email.to_string()),
    };
    Ok(am.insert(db).await?)
}

/// Replace name and email of an existing row in one statement.
/// Returns `None` when no row has that id.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    name: &str,
    email: &str,
) -> Result<Option<Model>, errors::ModelError> {
    let am = ActiveModel {
        id: Unchanged(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
    };
    match am.update(db).await {
        Ok(m) => Ok(Some(m)),
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Returns true if a row was deleted.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// `%fragment%` in lower case, with LIKE wildcards escaped by [`LIKE_ESCAPE`].
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
