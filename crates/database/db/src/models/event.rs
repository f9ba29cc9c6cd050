use crate::DatabaseError;

use rollup_node_primitives::Event;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    id: i32,
    received_at: i64,
    source: String,
    component: String,
    level: String,
    event_id: String,
    description: String,
    pub(crate) batch_number: Option<i64>,
    data: Option<Vec<u8>>,
}

/// The relation for the event model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the event model.
impl ActiveModelBehavior for ActiveModel {}

impl From<Event> for ActiveModel {
    fn from(event: Event) -> Self {
        Self {
            id: ActiveValue::NotSet,
            received_at: ActiveValue::Set(event.received_at as i64),
            source: ActiveValue::Set(event.source),
            component: ActiveValue::Set(event.component.to_string()),
            level: ActiveValue::Set(event.level.to_string()),
            event_id: ActiveValue::Set(event.event_id.to_string()),
            description: ActiveValue::Set(event.description),
            batch_number: ActiveValue::Set(event.batch_number.map(|n| n as i64)),
            data: ActiveValue::Set(event.data.map(|d| d.to_vec())),
        }
    }
}

impl TryFrom<Model> for Event {
    type Error = DatabaseError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        let invalid = |column| DatabaseError::InvalidColumn { table: "event", column };
        Ok(Self {
            received_at: value.received_at as u64,
            source: value.source,
            component: value.component.parse().map_err(|_| invalid("component"))?,
            level: value.level.parse().map_err(|_| invalid("level"))?,
            event_id: value.event_id.parse().map_err(|_| invalid("event_id"))?,
            description: value.description,
            batch_number: value.batch_number.map(|n| n as u64),
            data: value.data.map(Into::into),
        })
    }
}
