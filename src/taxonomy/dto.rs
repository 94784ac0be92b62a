use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateTermRequest {
    pub id: String,
    pub name: String,
}
