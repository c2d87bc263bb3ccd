use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = assignments)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub template_id: i32,
    pub bucket_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = assignments)]
pub struct NewAssignmentRecord {
    pub title: String,
    pub description: String,
    pub template_id: i32,
    pub bucket_url: String,
}
