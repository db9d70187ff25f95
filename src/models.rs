use serde::Deserialize;
use serde_json::Value;

// Request bodies for the AI endpoints. Fields are optional so missing input
// gets our 400 message instead of a deserialization rejection.

#[derive(Deserialize)]
pub struct ExcuseRequest {
    pub situation: Option<String>,
    pub believability: Option<i64>,
}

#[derive(Deserialize)]
pub struct JudgeRequest {
    #[serde(rename = "sideA")]
    pub side_a: Option<String>,
    #[serde(rename = "sideB")]
    pub side_b: Option<String>,
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub decision: Option<String>,
}

#[derive(Deserialize)]
pub struct RoastRequest {
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct MemeRequest {
    pub template: Option<String>,
    pub context: Option<String>,
}

#[derive(Deserialize)]
pub struct ClapbackRequest {
    pub roast: Option<String>,
}

#[derive(Deserialize)]
pub struct ShareRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<Value>,
}

#[derive(Deserialize)]
pub struct ShareQuery {
    pub id: Option<String>,
}
