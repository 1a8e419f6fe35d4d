use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metal {
    pub id: i32,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}
